//! Infrastructure modules with no protocol knowledge.

pub mod cbor;
