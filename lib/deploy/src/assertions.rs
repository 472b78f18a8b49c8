//! Assertions on reverted transactions.
use alloy_primitives::U256;
use alloy_sol_types::SolError;
use playground_contracts::vm::Reverted;

use crate::{config::Network, error::DeployError};

/// Comparison against typed errors.
pub trait ErrorExt<E> {
    /// Checks that `Self` corresponds to the typed abi-encoded error
    /// `expected`.
    fn is_err(&self, expected: E) -> bool;
}

/// Checks on untyped reverts.
pub trait RevertExt {
    /// Checks that `Self` is a `Panic(uint256)` with `code`.
    /// E.g. `0x11` for arithmetic overflow.
    fn panics(&self, code: u64) -> bool;

    /// Checks that `Self` reverted without data.
    fn is_silent(&self) -> bool;
}

impl<E: SolError> ErrorExt<E> for Reverted {
    fn is_err(&self, expected: E) -> bool {
        self.data.as_ref() == expected.abi_encode().as_slice()
    }
}

impl RevertExt for Reverted {
    fn panics(&self, code: u64) -> bool {
        self.panic_code() == Some(U256::from(code))
    }

    fn is_silent(&self) -> bool {
        self.is_empty()
    }
}

impl<E: SolError> ErrorExt<E> for DeployError {
    fn is_err(&self, expected: E) -> bool {
        let Self::Reverted { source, .. } = self else {
            return false;
        };
        source.is_err(expected)
    }
}

impl RevertExt for DeployError {
    fn panics(&self, code: u64) -> bool {
        let Self::Reverted { source, .. } = self else {
            return false;
        };
        source.panics(code)
    }

    fn is_silent(&self) -> bool {
        matches!(self, Self::Reverted { source, .. } if source.is_silent())
    }
}

/// Revert expectations that hold on a given network.
///
/// Some chains drop revert data. On those an empty revert satisfies any
/// expectation, since the reason cannot be observed.
#[derive(Clone, Copy, Debug)]
pub struct Expect<'a> {
    network: &'a Network,
}

impl<'a> Expect<'a> {
    /// Expectations for `network`.
    pub fn on(network: &'a Network) -> Self {
        Self { network }
    }

    /// Checks that `err` is `expected`, or silent where the network allows.
    pub fn reverted_with<T, E>(&self, err: &T, expected: E) -> bool
    where
        T: ErrorExt<E> + RevertExt,
    {
        err.is_err(expected) || self.tolerates(err)
    }

    /// Checks that `err` is a panic with `code`, or silent where the network
    /// allows.
    pub fn panicked<T: RevertExt>(&self, err: &T, code: u64) -> bool {
        err.panics(code) || self.tolerates(err)
    }

    fn tolerates<T: RevertExt>(&self, err: &T) -> bool {
        !self.network.revert_data() && err.is_silent()
    }
}
