pub mod client;
pub mod errors;
pub mod phase;

pub use client::*;
pub use errors::*;
pub use phase::*;
