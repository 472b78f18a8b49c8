//! The admin of a [`super::TransparentUpgradeableProxy`].
//!
//! Every proxy creates its own [`ProxyAdmin`], owned by the `initialOwner`
//! the proxy was deployed with. The owner upgrades the proxy by calling
//! [`ProxyAdmin::upgrade_and_call`], and can hand the proxy over to another
//! account with `transferOwnership`.
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
pub use sol::*;

use super::ITransparentUpgradeableProxy;
use crate::{
    access::ownable::Ownable,
    vm::{decode_call, CallResult, Context, Contract},
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Upgrade entry point of a [`super::ProxyAdmin`].
        #[allow(missing_docs)]
        interface IProxyAdmin {
            function UPGRADE_INTERFACE_VERSION() external view returns (string);
            function upgradeAndCall(address proxy, address implementation, bytes calldata data) external payable;
        }
    }
}

/// The version of the upgrade interface of the contract.
///
/// `"5.0.0"` means `upgradeAndCall(address,address,bytes)` is the only upgrade
/// entry point, and an empty `data` skips the setup call.
pub const UPGRADE_INTERFACE_VERSION: &str = "5.0.0";

const OWNABLE: Ownable = Ownable::at(U256::ZERO);

/// Auxiliary contract meant to be assigned as the admin of a
/// [`super::TransparentUpgradeableProxy`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProxyAdmin;

impl ProxyAdmin {
    /// Upgrades `proxy` to `implementation` and calls a function on the new
    /// implementation.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Execution context of the admin.
    /// * `proxy` - The proxy to upgrade.
    /// * `implementation` - The new implementation.
    /// * `data` - Setup call run against the proxy, skipped when empty.
    ///
    /// # Errors
    ///
    /// * [`crate::access::ownable::Error::UnauthorizedAccount`] - If not
    ///   called by the owner.
    /// * The revert data of the proxy, unchanged.
    pub fn upgrade_and_call(
        &self,
        ctx: &mut Context<'_>,
        proxy: Address,
        implementation: Address,
        data: &[u8],
    ) -> CallResult {
        OWNABLE.only_owner(ctx)?;

        let call = ITransparentUpgradeableProxy::upgradeToAndCallCall {
            new_implementation: implementation,
            data: data.to_vec().into(),
        };
        ctx.call(proxy, &call.abi_encode())?;
        Ok(Vec::new())
    }
}

impl Contract for ProxyAdmin {
    fn name(&self) -> &'static str {
        "ProxyAdmin"
    }

    fn constructor(&self, ctx: &mut Context<'_>, args: &[u8]) -> Result<(), Vec<u8>> {
        let initial_owner = Address::abi_decode(args).map_err(|_| Vec::new())?;
        Ok(OWNABLE.constructor(ctx, initial_owner)?)
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use IProxyAdmin::IProxyAdminCalls as Calls;

        if let Some(call) = decode_call::<Calls>(calldata) {
            return match call? {
                Calls::UPGRADE_INTERFACE_VERSION(_) => {
                    Ok(UPGRADE_INTERFACE_VERSION.to_owned().abi_encode())
                }
                Calls::upgradeAndCall(c) => {
                    self.upgrade_and_call(ctx, c.proxy, c.implementation, &c.data)
                }
            };
        }

        OWNABLE.route(ctx, calldata).unwrap_or_else(|| Err(Vec::new()))
    }
}
