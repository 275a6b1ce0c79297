//! Concrete implementations of the boundary ports (no protocol knowledge).

pub mod crypto;
