//! Nonce tracking for addresses. Nonces only increment.
use alloy_primitives::{Address, U256};
use alloy_sol_types::Panic;

use crate::{
    arithmetic::ARITHMETIC_OVERFLOW,
    vm::{
        storage::{StorageMap, StorageU256},
        Context,
    },
};

/// Nonces of a contract, as a mapping from address to its next nonce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nonces {
    nonces: StorageMap,
}

impl Nonces {
    /// Creates a view of the nonces mapping declared at `slot`.
    #[must_use]
    pub const fn at(slot: U256) -> Self {
        Self { nonces: StorageMap::at(slot) }
    }

    /// Returns the unused nonce of `owner`.
    #[must_use]
    pub fn nonces(&self, ctx: &Context<'_>, owner: Address) -> U256 {
        self.nonces.getter::<StorageU256>(&owner).get(ctx)
    }

    /// Consumes a nonce of `owner`, returning the one that was unused.
    ///
    /// # Errors
    ///
    /// * [`Panic`] with [`ARITHMETIC_OVERFLOW`] if the nonce would exceed
    ///   [`U256::MAX`].
    pub fn use_nonce(&self, ctx: &mut Context<'_>, owner: Address) -> Result<U256, Panic> {
        let slot = self.nonces.getter::<StorageU256>(&owner);
        let nonce = slot.get(ctx);
        let next = nonce
            .checked_add(U256::from(1))
            .ok_or(Panic { code: U256::from(ARITHMETIC_OVERFLOW) })?;
        slot.set(ctx, next);
        Ok(nonce)
    }
}
