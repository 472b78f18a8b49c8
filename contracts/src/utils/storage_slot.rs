//! Helper for reading and writing primitive types to specific storage slots.
use alloy_primitives::U256;

use crate::vm::storage::StorageType;

/// Helper for reading and writing primitive types to specific storage slots.
///
/// Storage slots are often used to avoid storage conflict when dealing with
/// upgradeable contracts. This helper returns a typed view of an arbitrary
/// slot without the need for low-level `sload`/`sstore` calls.
///
/// Example usage to set the ERC-1967 implementation slot:
///
/// ```rust
/// use alloy_primitives::{uint, Address, U256};
/// use playground_contracts::{
///     utils::storage_slot::StorageSlot,
///     vm::{storage::StorageAddress, Context},
/// };
///
/// const IMPLEMENTATION_SLOT: U256 = uint!(
///     0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc_U256
/// );
///
/// fn set_implementation(ctx: &mut Context<'_>, implementation: Address) {
///     StorageSlot::get_slot::<StorageAddress>(IMPLEMENTATION_SLOT)
///         .set(ctx, implementation);
/// }
/// ```
pub struct StorageSlot;

impl StorageSlot {
    /// Returns a [`StorageType`] located at `slot`.
    ///
    /// # Arguments
    ///
    /// * `slot` - The slot to get the value from.
    #[must_use]
    pub fn get_slot<ST: StorageType>(slot: impl Into<U256>) -> ST {
        ST::new(slot.into())
    }
}
