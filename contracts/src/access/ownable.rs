//! Contract module which provides a basic access control mechanism, where
//! there is an account (an owner) that can be granted exclusive access to
//! specific functions.
//!
//! The initial owner is set to the address provided by the deployer. This can
//! later be changed with [`Ownable::transfer_ownership`].
//!
//! This module is used through composition. It will make available the
//! [`Ownable::only_owner`] function, which can be called to restrict operations
//! to the owner.
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolError, SolValue};
pub use sol::*;

use crate::vm::{decode_call, storage::StorageAddress, CallResult, Context};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Emitted when ownership gets transferred between accounts.
        ///
        /// * `previous_owner` - Address of the previous owner.
        /// * `new_owner` - Address of the new owner.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event OwnershipTransferred(address indexed previous_owner, address indexed new_owner);
    }

    sol! {
        /// The caller account is not authorized to perform an operation.
        ///
        /// * `account` - Account that was found to not be authorized.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error OwnableUnauthorizedAccount(address account);
        /// The owner is not a valid owner account. (eg. [`Address::ZERO`])
        ///
        /// * `owner` - Account that's not allowed to become the owner.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error OwnableInvalidOwner(address owner);
    }

    sol! {
        /// External interface of an [`super::Ownable`] contract.
        #[allow(missing_docs)]
        interface IOwnable {
            function owner() external view returns (address);
            function transferOwnership(address new_owner) external;
            function renounceOwnership() external;
        }
    }
}

/// An error that occurred in the implementation of an [`Ownable`] contract.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The caller account is not authorized to perform an operation.
    UnauthorizedAccount(OwnableUnauthorizedAccount),
    /// The owner is not a valid owner account. (eg. [`Address::ZERO`])
    InvalidOwner(OwnableInvalidOwner),
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        match value {
            Error::UnauthorizedAccount(e) => e.abi_encode(),
            Error::InvalidOwner(e) => e.abi_encode(),
        }
    }
}

/// State of an [`Ownable`] contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ownable {
    /// The current owner of this contract.
    owner: StorageAddress,
}

impl Ownable {
    /// Lays out an [`Ownable`] with its owner at `slot`.
    #[must_use]
    pub const fn at(slot: U256) -> Self {
        Self { owner: StorageAddress::at(slot) }
    }

    /// Constructor.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Execution context of the contract being deployed.
    /// * `initial_owner` - The initial owner of this contract.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidOwner`] - If initial owner is [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    pub fn constructor(
        &self,
        ctx: &mut Context<'_>,
        initial_owner: Address,
    ) -> Result<(), Error> {
        if initial_owner.is_zero() {
            return Err(Error::InvalidOwner(OwnableInvalidOwner {
                owner: Address::ZERO,
            }));
        }
        self._transfer_ownership(ctx, initial_owner);
        Ok(())
    }

    /// Returns the address of the current owner.
    #[must_use]
    pub fn owner(&self, ctx: &Context<'_>) -> Address {
        self.owner.get(ctx)
    }

    /// Transfers ownership of the contract to a new account (`new_owner`).
    /// Can only be called by the current owner.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Execution context of the call.
    /// * `new_owner` - The next owner of this contract.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If not called by the owner.
    /// * [`Error::InvalidOwner`] - If `new_owner` is the [`Address::ZERO`].
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    pub fn transfer_ownership(
        &self,
        ctx: &mut Context<'_>,
        new_owner: Address,
    ) -> Result<(), Error> {
        self.only_owner(ctx)?;

        if new_owner.is_zero() {
            return Err(Error::InvalidOwner(OwnableInvalidOwner {
                owner: Address::ZERO,
            }));
        }

        self._transfer_ownership(ctx, new_owner);

        Ok(())
    }

    /// Leaves the contract without owner. It will not be possible to call
    /// functions that require `only_owner`. Can only be called by the current
    /// owner.
    ///
    /// NOTE: Renouncing ownership will leave the contract without an owner,
    /// thereby disabling any functionality that is only available to the owner.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If not called by the owner.
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    pub fn renounce_ownership(&self, ctx: &mut Context<'_>) -> Result<(), Error> {
        self.only_owner(ctx)?;
        self._transfer_ownership(ctx, Address::ZERO);
        Ok(())
    }

    /// Checks if the `msg.sender` is set as the owner.
    ///
    /// # Errors
    ///
    /// * [`Error::UnauthorizedAccount`] - If called by any account other than
    ///   the owner.
    pub fn only_owner(&self, ctx: &Context<'_>) -> Result<(), Error> {
        let account = ctx.msg_sender();
        if self.owner(ctx) != account {
            return Err(Error::UnauthorizedAccount(
                OwnableUnauthorizedAccount { account },
            ));
        }

        Ok(())
    }

    /// Transfers ownership of the contract to a new account (`new_owner`).
    /// Internal function without access restriction.
    ///
    /// # Events
    ///
    /// * [`OwnershipTransferred`].
    pub fn _transfer_ownership(&self, ctx: &mut Context<'_>, new_owner: Address) {
        let previous_owner = self.owner.get(ctx);
        self.owner.set(ctx, new_owner);
        ctx.emit(&OwnershipTransferred { previous_owner, new_owner });
    }

    /// Handles a call to one of the [`IOwnable`] functions.
    ///
    /// Returns `None` when `calldata` targets some other function.
    pub fn route(
        &self,
        ctx: &mut Context<'_>,
        calldata: &[u8],
    ) -> Option<CallResult> {
        use IOwnable::IOwnableCalls as Calls;

        decode_call::<Calls>(calldata).map(|call| match call? {
            Calls::owner(_) => Ok(self.owner(ctx).abi_encode()),
            Calls::transferOwnership(c) => {
                self.transfer_ownership(ctx, c.new_owner)?;
                Ok(Vec::new())
            }
            Calls::renounceOwnership(_) => {
                self.renounce_ownership(ctx)?;
                Ok(Vec::new())
            }
        })
    }
}
