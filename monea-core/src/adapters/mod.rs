//! Concrete port implementations

pub mod memory;

pub use memory::{FixedSmsSource, MemoryStore};
