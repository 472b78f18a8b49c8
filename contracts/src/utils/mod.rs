//! Common Smart Contracts utilities.
pub mod cryptography;
pub mod nonces;
pub mod storage_slot;

pub use nonces::Nonces;
pub use storage_slot::StorageSlot;
