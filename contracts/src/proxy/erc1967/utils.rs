//! This library provides getters and event emitting update functions for
//! [ERC-1967] slots.
//!
//! [ERC-1967]: https://eips.ethereum.org/EIPS/eip-1967
use alloy_primitives::{uint, Address, U256};
use alloy_sol_types::SolError;
pub use sol::*;

use crate::{
    proxy::erc1967,
    utils::storage_slot::StorageSlot,
    vm::{storage::StorageAddress, Context},
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Indicates an error related to the fact that the `implementation`
        /// of the proxy is invalid.
        ///
        /// * `implementation` - Address of the invalid implementation.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC1967InvalidImplementation(address implementation);

        /// Indicates an error related to the fact that the `admin` of the
        /// proxy is invalid.
        ///
        /// * `admin` - Address of the invalid admin.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ERC1967InvalidAdmin(address admin);
    }
}

/// An [`Erc1967Utils`] error.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// Indicates an error related to the fact that the `implementation`
    /// of the proxy is invalid.
    InvalidImplementation(ERC1967InvalidImplementation),
    /// Indicates an error related to the fact that the `admin` of the
    /// proxy is invalid.
    InvalidAdmin(ERC1967InvalidAdmin),
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::InvalidImplementation(e) => e.abi_encode(),
            Error::InvalidAdmin(e) => e.abi_encode(),
        }
    }
}

/// Storage slot with the address of the current implementation.
/// This is the keccak-256 hash of "eip1967.proxy.implementation" subtracted by
/// 1.
pub const IMPLEMENTATION_SLOT: U256 = uint!(
    0x360894a13ba1a3210667c828492db98dca3e2076cc3735a920a3ca505d382bbc_U256
);

/// Storage slot with the admin of the contract.
/// This is the keccak-256 hash of "eip1967.proxy.admin" subtracted by 1.
pub const ADMIN_SLOT: U256 = uint!(
    0xb53127684a568b3173ae13b9f8a6016e243e63b6e8ee1178d6a717850b5d6103_U256
);

/// This library provides getters and event emitting update functions for
/// [ERC-1967] slots.
///
/// [ERC-1967]: https://eips.ethereum.org/EIPS/eip-1967
pub struct Erc1967Utils;

/// Implementation of the [`Erc1967Utils`] library.
impl Erc1967Utils {
    /// Returns the current implementation address.
    #[must_use]
    pub fn get_implementation(ctx: &Context<'_>) -> Address {
        StorageSlot::get_slot::<StorageAddress>(IMPLEMENTATION_SLOT).get(ctx)
    }

    /// Performs implementation upgrade with additional setup call if
    /// data is nonempty.
    ///
    /// The setup call is a delegated call to `new_implementation`, made in
    /// the same transaction: if it reverts, so does the upgrade.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Execution context of the proxy.
    /// * `new_implementation` - The new implementation address.
    /// * `data` - The data to pass to the setup call.
    ///
    /// # Errors
    ///
    /// * [`ERC1967InvalidImplementation`] - If `new_implementation` has no
    ///   code.
    /// * The revert data of the setup call, unchanged.
    ///
    /// # Events
    ///
    /// * [`erc1967::Upgraded`].
    pub fn upgrade_to_and_call(
        ctx: &mut Context<'_>,
        new_implementation: Address,
        data: &[u8],
    ) -> Result<(), Vec<u8>> {
        Erc1967Utils::_set_implementation(ctx, new_implementation)?;

        ctx.emit(&erc1967::Upgraded { implementation: new_implementation });

        if !data.is_empty() {
            ctx.delegate_call(new_implementation, data)?;
        }

        Ok(())
    }

    /// Returns the current admin.
    #[must_use]
    pub fn get_admin(ctx: &Context<'_>) -> Address {
        StorageSlot::get_slot::<StorageAddress>(ADMIN_SLOT).get(ctx)
    }

    /// Changes the admin of the proxy.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Execution context of the proxy.
    /// * `new_admin` - The new admin address.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidAdmin`] - If `new_admin` is [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`erc1967::AdminChanged`].
    pub fn change_admin(
        ctx: &mut Context<'_>,
        new_admin: Address,
    ) -> Result<(), Error> {
        let previous_admin = Erc1967Utils::get_admin(ctx);
        Erc1967Utils::_set_admin(ctx, new_admin)?;
        ctx.emit(&erc1967::AdminChanged { previous_admin, new_admin });
        Ok(())
    }
}

impl Erc1967Utils {
    /// Stores a new address in the ERC-1967 implementation slot.
    fn _set_implementation(
        ctx: &mut Context<'_>,
        new_implementation: Address,
    ) -> Result<(), Error> {
        if !ctx.has_code(new_implementation) {
            return Err(Error::InvalidImplementation(
                ERC1967InvalidImplementation {
                    implementation: new_implementation,
                },
            ));
        }
        StorageSlot::get_slot::<StorageAddress>(IMPLEMENTATION_SLOT)
            .set(ctx, new_implementation);
        Ok(())
    }

    /// Stores a new address in the ERC-1967 admin slot.
    fn _set_admin(ctx: &mut Context<'_>, new_admin: Address) -> Result<(), Error> {
        if new_admin.is_zero() {
            return Err(Error::InvalidAdmin(ERC1967InvalidAdmin {
                admin: new_admin,
            }));
        }
        StorageSlot::get_slot::<StorageAddress>(ADMIN_SLOT).set(ctx, new_admin);
        Ok(())
    }
}
