//! One-time initialization for contracts running behind a proxy.
//!
//! A proxied contract cannot rely on a constructor: the constructor runs in
//! the context of the implementation, not in the context of the proxy. Such
//! a contract exposes an initializer instead, and guards it with
//! [`Initializable::initializer`] so that it can only ever run once against a
//! given storage.
//!
//! The state lives in the [ERC-7201] namespace
//! `openzeppelin.storage.Initializable`, which keeps it away from the
//! sequential slots of the contract itself:
//!
//! | bits    | field                         |
//! |---------|-------------------------------|
//! | 0..64   | `initialized` version (u64)   |
//! | 64..72  | `initializing` flag (bool)    |
//!
//! [ERC-7201]: https://eips.ethereum.org/EIPS/eip-7201
use alloy_primitives::{uint, U256};
pub use sol::*;

use crate::vm::{CallResult, Context};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Triggered when the contract has been initialized or reinitialized.
        ///
        /// * `version` - Version the contract got initialized to.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event Initialized(uint64 version);
    }

    sol! {
        /// The contract is already initialized.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error InvalidInitialization();

        /// The contract is not initializing.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error NotInitializing();
    }
}

/// `keccak256(abi.encode(uint256(keccak256("openzeppelin.storage.Initializable")) - 1)) & ~bytes32(uint256(0xff))`
pub const INITIALIZABLE_STORAGE: U256 = uint!(
    0xf0c57e16840df040f15088dc2f81fe391c3923bec73e23a9662efc9c229c6a00_U256
);

const INITIALIZING_SHIFT: usize = 64;

/// An error that occurred in an [`Initializable`] guard.
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    /// The contract is already initialized.
    InvalidInitialization(InvalidInitialization),
    /// The contract is not initializing.
    NotInitializing(NotInitializing),
}

impl From<Error> for Vec<u8> {
    fn from(value: Error) -> Self {
        use alloy_sol_types::SolError;

        match value {
            Error::InvalidInitialization(e) => e.abi_encode(),
            Error::NotInitializing(e) => e.abi_encode(),
        }
    }
}

/// Initializer guard of a proxied contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Initializable;

impl Initializable {
    /// Highest version the contract has been initialized to.
    #[must_use]
    pub fn get_initialized_version(&self, ctx: &Context<'_>) -> u64 {
        Self::load(ctx).0
    }

    /// Whether an initializer is currently running.
    #[must_use]
    pub fn is_initializing(&self, ctx: &Context<'_>) -> bool {
        Self::load(ctx).1
    }

    /// Runs `init` as the version `1` initializer. Initializers cannot be
    /// nested, use [`Initializable::only_initializing`] for the functions an
    /// initializer calls into.
    ///
    /// # Errors
    ///
    /// * [`InvalidInitialization`] - If the contract was already initialized.
    /// * The revert data of `init`.
    ///
    /// # Events
    ///
    /// * [`Initialized`] - With version `1`.
    pub fn initializer<F>(&self, ctx: &mut Context<'_>, init: F) -> CallResult
    where
        F: FnOnce(&mut Context<'_>) -> CallResult,
    {
        let (initialized, initializing) = Self::load(ctx);
        if initialized != 0 || initializing {
            return Err(Error::InvalidInitialization(InvalidInitialization {})
                .into());
        }

        Self::store(ctx, 1, true);
        let output = init(ctx)?;
        Self::store(ctx, 1, false);
        ctx.emit(&Initialized { version: 1 });
        Ok(output)
    }

    /// Runs `init` as the initializer of `version`, which must be higher
    /// than the current version. Reinitializers cannot be nested.
    ///
    /// # Errors
    ///
    /// * [`InvalidInitialization`] - If an initializer is running or the
    ///   contract is already at `version` or above.
    /// * The revert data of `init`.
    ///
    /// # Events
    ///
    /// * [`Initialized`] - With `version`.
    pub fn reinitializer<F>(
        &self,
        ctx: &mut Context<'_>,
        version: u64,
        init: F,
    ) -> CallResult
    where
        F: FnOnce(&mut Context<'_>) -> CallResult,
    {
        let (initialized, initializing) = Self::load(ctx);
        if initializing || initialized >= version {
            return Err(Error::InvalidInitialization(InvalidInitialization {})
                .into());
        }

        Self::store(ctx, version, true);
        let output = init(ctx)?;
        Self::store(ctx, version, false);
        ctx.emit(&Initialized { version });
        Ok(output)
    }

    /// Guard for functions that may only be called by an initializer.
    ///
    /// # Errors
    ///
    /// * [`Error::NotInitializing`] - Outside of an initializer.
    pub fn only_initializing(&self, ctx: &Context<'_>) -> Result<(), Error> {
        if self.is_initializing(ctx) {
            Ok(())
        } else {
            Err(Error::NotInitializing(NotInitializing {}))
        }
    }

    /// Locks the contract, preventing any future (re)initialization.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidInitialization`] - If an initializer is running.
    ///
    /// # Events
    ///
    /// * [`Initialized`] - With [`u64::MAX`], the first time only.
    pub fn disable_initializers(&self, ctx: &mut Context<'_>) -> Result<(), Error> {
        let (initialized, initializing) = Self::load(ctx);
        if initializing {
            return Err(Error::InvalidInitialization(InvalidInitialization {}));
        }
        if initialized != u64::MAX {
            Self::store(ctx, u64::MAX, false);
            ctx.emit(&Initialized { version: u64::MAX });
        }
        Ok(())
    }

    fn load(ctx: &Context<'_>) -> (u64, bool) {
        let word = ctx.sload(INITIALIZABLE_STORAGE);
        let initialized = word.wrapping_to::<u64>();
        let initializing = word.bit(INITIALIZING_SHIFT);
        (initialized, initializing)
    }

    fn store(ctx: &mut Context<'_>, initialized: u64, initializing: bool) {
        let word = U256::from(initialized)
            | (U256::from(u8::from(initializing)) << INITIALIZING_SHIFT);
        ctx.sstore(INITIALIZABLE_STORAGE, word);
    }
}
