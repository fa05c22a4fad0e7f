//! Per-resource interval reservation with overlap detection
//! ([`resource::ResourceAllocator`]) and the fixed-slot discretization
//! built atop it ([`interval::IntervalAllocator`]).

pub mod interval;
pub mod resource;

pub use interval::IntervalAllocator;
pub use resource::{Allocation, AllocationId, Blob, ResourceAllocator, ResourceId};
