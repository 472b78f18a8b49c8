//! Signature verification and typed-data hashing.
pub mod ecdsa;
pub mod eip712;
