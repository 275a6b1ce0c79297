//! Application layer: protocol orchestration over the boundary ports.

pub mod to0;

pub use to0::*;
