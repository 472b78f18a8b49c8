//! This is a low-level set of contracts implementing the transparent proxy
//! pattern, with upgradeability.
use alloy_primitives::Address;

use crate::vm::{CallResult, Context};

pub mod erc1967;
pub mod transparent;
pub mod utils;

/// This trait provides a fallback function that delegates all calls to another
/// contract using the EVM instruction `delegatecall`. We refer to the second
/// contract as the _implementation_ behind the proxy, and it has to be
/// specified by overriding the virtual [`IProxy::implementation`] function.
///
/// Additionally, delegation to the implementation can be triggered manually
/// through the [`IProxy::do_fallback`] function, or to a different contract
/// through the [`IProxy::delegate`] function.
///
/// The success and return data of the delegated call will be returned back
/// to the caller of the proxy.
pub trait IProxy {
    /// Delegates the current call to `implementation`.
    ///
    /// # Arguments
    ///
    /// * `&self` - The proxy code.
    /// * `ctx` - Execution context of the proxy.
    /// * `implementation` - The address of the implementation contract.
    /// * `calldata` - The calldata to delegate to the implementation contract.
    ///
    /// # Errors
    ///
    /// * The revert data of the implementation, unchanged.
    fn delegate(
        &self,
        ctx: &mut Context<'_>,
        implementation: Address,
        calldata: &[u8],
    ) -> CallResult {
        ctx.delegate_call(implementation, calldata)
    }

    /// This is a virtual function that should be overridden so it
    /// returns the address to which the fallback function and
    /// [`IProxy::do_fallback`] should delegate.
    ///
    /// # Errors
    ///
    /// * Revert data when there is nothing to delegate to.
    fn implementation(&self, ctx: &Context<'_>) -> Result<Address, Vec<u8>>;

    /// Fallback function that delegates calls to the address returned
    /// by [`IProxy::implementation`]. Will run if no other function in the
    /// contract matches the call data.
    ///
    /// # Errors
    ///
    /// * The error of [`IProxy::implementation`], or the revert data of the
    ///   implementation.
    fn do_fallback(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        let implementation = self.implementation(ctx)?;
        self.delegate(ctx, implementation, calldata)
    }
}
