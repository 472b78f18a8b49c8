//! Proxy Storage Slots and the events as defined in
//! the [ERC-1967].
//!
//! Besides the in-contract helpers of [`utils::Erc1967Utils`], this module
//! exposes readers that inspect the slots of a deployed proxy from the
//! outside, the way `eth_getStorageAt` does. They never dispatch a call to
//! the proxy, so they work whoever the caller is.
//!
//! [ERC-1967]: <https://eips.ethereum.org/EIPS/eip-1967>
use alloy_primitives::Address;

pub mod utils;

pub use sol::*;
pub use utils::{Erc1967Utils, ADMIN_SLOT, IMPLEMENTATION_SLOT};

use crate::vm::{storage::word_to_address, Ledger};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Emitted when the implementation is upgraded.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event Upgraded(address indexed implementation);

        /// Emitted when the admin account has changed.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event AdminChanged(address previous_admin, address new_admin);
    }
}

/// Reads the implementation slot of `proxy`.
///
/// Returns [`Address::ZERO`] when `proxy` is not an ERC-1967 proxy.
#[must_use]
pub fn get_implementation_address(ledger: &Ledger, proxy: Address) -> Address {
    word_to_address(ledger.storage_at(proxy, IMPLEMENTATION_SLOT))
}

/// Reads the admin slot of `proxy`.
///
/// Returns [`Address::ZERO`] when `proxy` is not an ERC-1967 proxy.
#[must_use]
pub fn get_admin_address(ledger: &Ledger, proxy: Address) -> Address {
    word_to_address(ledger.storage_at(proxy, ADMIN_SLOT))
}
