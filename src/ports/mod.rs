pub mod crypto;
pub mod storage;

pub use crypto::*;
pub use storage::*;
