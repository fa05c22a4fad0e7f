//! Bot and payload schemas (model parameters) and their identified
//! instances.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotType {
    Operator,
    Refueler,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotSchema {
    pub model: String,
    pub bot_type: BotType,
    /// Continuous airborne seconds a bot can sustain from full charge.
    pub flight_time: i64,
    /// Cruise speed, distance units per second.
    pub speed: f64,
    pub cruising_altitude: f64,
}

impl BotSchema {
    pub fn new(
        model: impl Into<String>,
        bot_type: BotType,
        flight_time: i64,
        speed: f64,
        cruising_altitude: f64,
    ) -> Self {
        Self {
            model: model.into(),
            bot_type,
            flight_time,
            speed,
            cruising_altitude,
        }
    }

    pub fn is_refueler(&self) -> bool {
        self.bot_type == BotType::Refueler
    }

    pub fn is_operator(&self) -> bool {
        self.bot_type == BotType::Operator
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    pub id: String,
    pub model: String,
}

impl Bot {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadSchema {
    pub model: String,
    pub compatible_bots: HashSet<String>,
}

impl PayloadSchema {
    pub fn new(model: impl Into<String>, compatible_bots: impl IntoIterator<Item = String>) -> Self {
        Self {
            model: model.into(),
            compatible_bots: compatible_bots.into_iter().collect(),
        }
    }

    pub fn is_compatible_with(&self, bot_model: &str) -> bool {
        self.compatible_bots.contains(bot_model)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub id: String,
    pub model: String,
}

impl Payload {
    pub fn new(id: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
        }
    }
}
