//! A transparent upgradeable proxy, administered by a [`ProxyAdmin`].
//!
//! The proxy is upgradeable by its admin, and the admin only. To avoid
//! [proxy selector clashing], which can potentially be used in an attack,
//! the proxy never lets the two kinds of callers reach the same code:
//!
//! 1. If any account other than the admin calls the proxy, the call is
//!    forwarded to the implementation, even if it matches
//!    `upgradeToAndCall`.
//! 2. If the admin calls the proxy, it can call `upgradeToAndCall` and
//!    nothing else: any other call reverts with [`ProxyDeniedAdminAccess`].
//!
//! The admin is a [`ProxyAdmin`] instance created by the proxy constructor,
//! so that an owner account can interact with the implementation through the
//! proxy while upgrades go through the admin contract.
//!
//! [proxy selector clashing]: https://medium.com/nomic-foundation-blog/malicious-backdoors-in-ethereum-proxies-62629adf3357
use std::sync::Arc;

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolError, SolValue};
pub use sol::*;

use crate::{
    proxy::{
        erc1967::{utils::ERC1967InvalidImplementation, Erc1967Utils},
        IProxy,
    },
    vm::{decode_call, CallResult, Context, Contract},
};

pub mod admin;

pub use admin::{IProxyAdmin, ProxyAdmin};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// The proxy caller is the current admin, and can't fallback to the
        /// proxy target.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        error ProxyDeniedAdminAccess();
    }

    sol! {
        /// Interface the [`super::ProxyAdmin`] uses to upgrade a
        /// [`super::TransparentUpgradeableProxy`].
        #[allow(missing_docs)]
        interface ITransparentUpgradeableProxy {
            function upgradeToAndCall(address new_implementation, bytes calldata data) external payable;
        }
    }
}

/// ABI-encodes the constructor parameters of a
/// [`TransparentUpgradeableProxy`]: `(address logic, address initialOwner,
/// bytes data)`.
#[must_use]
pub fn constructor_args(logic: Address, initial_owner: Address, data: &[u8]) -> Vec<u8> {
    (logic, initial_owner, Bytes::copy_from_slice(data)).abi_encode_params()
}

/// Transparent upgradeable proxy.
///
/// Constructor parameters are `(address logic, address initialOwner, bytes
/// data)`: the proxy is initialized with `logic` as implementation, runs
/// `data` against it when not empty, and creates its [`ProxyAdmin`] owned by
/// `initialOwner`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransparentUpgradeableProxy;

impl TransparentUpgradeableProxy {
    /// Admin of this proxy, from the ERC-1967 admin slot.
    fn proxy_admin(ctx: &Context<'_>) -> Address {
        Erc1967Utils::get_admin(ctx)
    }

    /// Upgrades the implementation of the proxy, on behalf of the admin.
    fn dispatch_upgrade_to_and_call(
        ctx: &mut Context<'_>,
        calldata: &[u8],
    ) -> CallResult {
        use ITransparentUpgradeableProxy::ITransparentUpgradeableProxyCalls as Calls;

        let Some(call) = decode_call::<Calls>(calldata) else {
            return Err(ProxyDeniedAdminAccess {}.abi_encode());
        };
        let Calls::upgradeToAndCall(call) = call?;
        Erc1967Utils::upgrade_to_and_call(ctx, call.new_implementation, &call.data)?;
        Ok(Vec::new())
    }
}

impl IProxy for TransparentUpgradeableProxy {
    fn implementation(&self, ctx: &Context<'_>) -> Result<Address, Vec<u8>> {
        let implementation = Erc1967Utils::get_implementation(ctx);
        if !ctx.has_code(implementation) {
            return Err(ERC1967InvalidImplementation { implementation }.abi_encode());
        }
        Ok(implementation)
    }
}

impl Contract for TransparentUpgradeableProxy {
    fn name(&self) -> &'static str {
        "TransparentUpgradeableProxy"
    }

    fn constructor(&self, ctx: &mut Context<'_>, args: &[u8]) -> Result<(), Vec<u8>> {
        let (logic, initial_owner, data) =
            <(Address, Address, Bytes)>::abi_decode_params(args)
                .map_err(|_| Vec::new())?;

        Erc1967Utils::upgrade_to_and_call(ctx, logic, &data)?;

        let admin = ctx.create(Arc::new(ProxyAdmin), &initial_owner.abi_encode())?;
        Erc1967Utils::change_admin(ctx, admin)?;
        Ok(())
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        if ctx.msg_sender() == Self::proxy_admin(ctx) {
            Self::dispatch_upgrade_to_and_call(ctx, calldata)
        } else {
            self.do_fallback(ctx, calldata)
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, uint, Address, U256};
    use alloy_sol_types::{SolCall, SolEvent, SolValue};

    use super::*;
    use crate::{
        access::ownable::{IOwnable, OwnableUnauthorizedAccount},
        logic::{ILogic, Logic},
        proxy::erc1967::{
            self, get_admin_address, get_implementation_address, IMPLEMENTATION_SLOT,
        },
        vm::{Ledger, Reverted},
    };

    const OWNER: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");

    struct System {
        ledger: Ledger,
        proxy: Address,
        admin: Address,
        positive: Address,
        negative: Address,
    }

    fn setup() -> System {
        let mut ledger = Ledger::default();
        let positive = ledger
            .deploy(OWNER, Logic::positive(), &[])
            .unwrap()
            .contract_address
            .unwrap();
        let negative = ledger
            .deploy(OWNER, Logic::negative(), &[])
            .unwrap()
            .contract_address
            .unwrap();
        let init = ILogic::initalValueCall { value: uint!(42_U256) }.abi_encode();
        let proxy = ledger
            .deploy(
                OWNER,
                TransparentUpgradeableProxy,
                &constructor_args(positive, OWNER, &init),
            )
            .expect("should deploy proxy")
            .contract_address
            .unwrap();
        let admin = get_admin_address(&ledger, proxy);
        System { ledger, proxy, admin, positive, negative }
    }

    fn number(ledger: &Ledger, contract: Address) -> U256 {
        let out = ledger.call(BOB, contract, &ILogic::numberCall {}.abi_encode()).unwrap();
        U256::abi_decode(&out).unwrap()
    }

    fn upgrade(
        system: &mut System,
        from: Address,
        implementation: Address,
        data: &[u8],
    ) -> Result<(), Reverted> {
        let calldata = IProxyAdmin::upgradeAndCallCall {
            proxy: system.proxy,
            implementation,
            data: Bytes::copy_from_slice(data),
        }
        .abi_encode();
        system.ledger.transact(from, system.admin, &calldata).map(|_| ())
    }

    #[test]
    fn constructor_initializes_proxy() {
        let system = setup();

        assert_eq!(get_implementation_address(&system.ledger, system.proxy), system.positive);
        assert!(system.ledger.has_code(system.admin));
        assert_eq!(system.admin, system.proxy.create(1));
        assert_eq!(number(&system.ledger, system.proxy), uint!(42_U256));
        assert_eq!(number(&system.ledger, system.positive), U256::ZERO);

        let out = system
            .ledger
            .call(BOB, system.admin, &IOwnable::ownerCall {}.abi_encode())
            .unwrap();
        assert_eq!(Address::abi_decode(&out).unwrap(), OWNER);
    }

    #[test]
    fn constructor_emits_upgrade_and_admin_change() {
        let system = setup();
        let logs = system.ledger.logs();

        let upgraded = logs
            .iter()
            .filter(|log| log.address == system.proxy)
            .find_map(|log| erc1967::Upgraded::decode_log_data(&log.data).ok());
        assert_eq!(upgraded, Some(erc1967::Upgraded { implementation: system.positive }));

        let changed = logs
            .iter()
            .find_map(|log| erc1967::AdminChanged::decode_log_data(&log.data).ok());
        assert_eq!(
            changed,
            Some(erc1967::AdminChanged { previous_admin: Address::ZERO, new_admin: system.admin })
        );
    }

    #[test]
    fn admin_cannot_fallback_to_implementation() {
        let mut system = setup();
        let err = system
            .ledger
            .call(system.admin, system.proxy, &ILogic::numberCall {}.abi_encode())
            .unwrap_err();
        assert_eq!(err.decode::<ProxyDeniedAdminAccess>(), Some(ProxyDeniedAdminAccess {}));

        let err = system
            .ledger
            .transact(system.admin, system.proxy, &ILogic::modifyCall {}.abi_encode())
            .unwrap_err();
        assert!(err.decode::<ProxyDeniedAdminAccess>().is_some());
    }

    #[test]
    fn non_admin_upgrade_is_forwarded_and_fails() {
        let mut system = setup();
        let calldata = ITransparentUpgradeableProxy::upgradeToAndCallCall {
            new_implementation: system.negative,
            data: Bytes::new(),
        }
        .abi_encode();

        let err = system.ledger.transact(OWNER, system.proxy, &calldata).unwrap_err();

        assert!(err.is_empty());
        assert_eq!(get_implementation_address(&system.ledger, system.proxy), system.positive);
    }

    #[test]
    fn owner_upgrades_through_admin() {
        let mut system = setup();
        let negative = system.negative;

        upgrade(&mut system, OWNER, negative, &[]).expect("owner should upgrade");

        assert_eq!(get_implementation_address(&system.ledger, system.proxy), negative);
        assert_eq!(number(&system.ledger, system.proxy), uint!(42_U256));
    }

    #[test]
    fn non_owner_cannot_upgrade_through_admin() {
        let mut system = setup();
        let negative = system.negative;

        let err = upgrade(&mut system, BOB, negative, &[]).unwrap_err();

        assert_eq!(
            err.decode::<OwnableUnauthorizedAccount>(),
            Some(OwnableUnauthorizedAccount { account: BOB })
        );
        assert_eq!(get_implementation_address(&system.ledger, system.proxy), system.positive);
    }

    #[test]
    fn replayed_initializer_reverts_whole_upgrade() {
        let mut system = setup();
        let negative = system.negative;
        let init = ILogic::initalValueCall { value: uint!(7_U256) }.abi_encode();

        upgrade(&mut system, OWNER, negative, &init).unwrap_err();

        assert_eq!(get_implementation_address(&system.ledger, system.proxy), system.positive);
        assert_eq!(number(&system.ledger, system.proxy), uint!(42_U256));
    }

    #[test]
    fn zero_implementation_fails_dispatch() {
        let mut system = setup();
        system.ledger.set_storage_at(system.proxy, IMPLEMENTATION_SLOT, U256::ZERO);

        let err = system
            .ledger
            .transact(BOB, system.proxy, &ILogic::modifyCall {}.abi_encode())
            .unwrap_err();
        assert_eq!(
            err.decode::<ERC1967InvalidImplementation>(),
            Some(ERC1967InvalidImplementation { implementation: Address::ZERO })
        );
    }

    #[test]
    fn constructor_rejects_implementation_without_code() {
        let mut ledger = Ledger::default();
        let err = ledger
            .deploy(
                OWNER,
                TransparentUpgradeableProxy,
                &constructor_args(Address::ZERO, OWNER, &[]),
            )
            .unwrap_err();
        assert_eq!(
            err.decode::<ERC1967InvalidImplementation>(),
            Some(ERC1967InvalidImplementation { implementation: Address::ZERO })
        );
    }
}
