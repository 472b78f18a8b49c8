//! `TestCreateFunctions`, a factory of [`BasicStorage`] contracts exercising
//! the CREATE and CREATE2 opcodes.
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolValue;
pub use sol::*;

use super::BasicStorage;
use crate::vm::{
    decode_call, init_code_hash, storage::StorageAddress, CallResult, Context, Contract,
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Emitted when a [`super::BasicStorage`] child is created.
        #[derive(Debug, PartialEq, Eq)]
        #[allow(missing_docs)]
        event ContractCreated(address indexed child, bool deterministic);
    }

    sol! {
        /// External interface of [`super::TestCreateFunctions`].
        #[allow(missing_docs)]
        interface ITestCreateFunctions {
            function createWithCreate() external returns (address);
            function createWithCreate2(bytes32 salt) external returns (address);
            function computeCreate2Address(bytes32 salt) external view returns (address);
            function lastCreated() external view returns (address);
        }
    }
}

const LAST_CREATED: StorageAddress = StorageAddress::at(U256::ZERO);

/// `TestCreateFunctions`. Children can be called by any account, not only by
/// their creator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestCreateFunctions;

impl TestCreateFunctions {
    fn created(ctx: &mut Context<'_>, child: Address, deterministic: bool) -> CallResult {
        LAST_CREATED.set(ctx, child);
        ctx.emit(&ContractCreated { child, deterministic });
        Ok(child.abi_encode())
    }
}

impl Contract for TestCreateFunctions {
    fn name(&self) -> &'static str {
        "TestCreateFunctions"
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use ITestCreateFunctions::ITestCreateFunctionsCalls as Calls;

        let Some(call) = decode_call::<Calls>(calldata) else {
            return Err(Vec::new());
        };
        match call? {
            Calls::createWithCreate(_) => {
                let child = ctx.create(Arc::new(BasicStorage), &[])?;
                Self::created(ctx, child, false)
            }
            Calls::createWithCreate2(c) => {
                let child = ctx.create2(Arc::new(BasicStorage), c.salt, &[])?;
                Self::created(ctx, child, true)
            }
            Calls::computeCreate2Address(c) => {
                let hash = init_code_hash(&BasicStorage, &[]);
                Ok(ctx.address().create2(c.salt, hash).abi_encode())
            }
            Calls::lastCreated(_) => Ok(LAST_CREATED.get(ctx).abi_encode()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, uint, Address, B256, U256};
    use alloy_sol_types::{SolCall, SolValue};

    use super::*;
    use crate::{basics::IBasicStorage, vm::Ledger};

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
    const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");

    fn setup() -> (Ledger, Address) {
        let mut ledger = Ledger::default();
        let factory = ledger
            .deploy(ALICE, TestCreateFunctions, &[])
            .expect("should deploy factory")
            .contract_address
            .expect("should create an account");
        (ledger, factory)
    }

    fn create2(ledger: &mut Ledger, factory: Address, salt: B256) -> Address {
        let receipt = ledger
            .transact(
                ALICE,
                factory,
                &ITestCreateFunctions::createWithCreate2Call { salt }.abi_encode(),
            )
            .expect("should create2");
        Address::abi_decode(&receipt.output).expect("should decode child")
    }

    #[test]
    fn create_follows_the_factory_nonce() {
        let (mut ledger, factory) = setup();
        let call = ITestCreateFunctions::createWithCreateCall {}.abi_encode();

        let first = ledger.transact(ALICE, factory, &call).unwrap();
        let second = ledger.transact(ALICE, factory, &call).unwrap();

        // The factory starts at nonce 1.
        assert_eq!(first.output.to_vec(), factory.create(1).abi_encode());
        assert_eq!(second.output.to_vec(), factory.create(2).abi_encode());
        assert!(first.emits(&ContractCreated { child: factory.create(1), deterministic: false }));
        assert_eq!(ledger.nonce(factory), 3);
    }

    #[test]
    fn create2_address_is_deterministic() {
        let salt = B256::repeat_byte(0x42);
        let (mut ledger, factory) = setup();

        let out = ledger
            .call(BOB, factory, &ITestCreateFunctions::computeCreate2AddressCall { salt }.abi_encode())
            .unwrap();
        let predicted = Address::abi_decode(&out).unwrap();

        let child = create2(&mut ledger, factory, salt);
        assert_eq!(child, predicted);
        assert_eq!(child, factory.create2(salt, init_code_hash(&BasicStorage, &[])));

        // A busier ledger deploys the same factory, and the same child, at the
        // same addresses.
        let mut other = Ledger::new(1);
        other.transact(BOB, Address::ZERO, &[]).unwrap();
        let other_factory = other.deploy(ALICE, TestCreateFunctions, &[]).unwrap();
        assert_eq!(other_factory.contract_address, Some(factory));
        assert_eq!(create2(&mut other, factory, salt), child);

        assert_ne!(create2(&mut ledger, factory, B256::repeat_byte(0x43)), child);
    }

    #[test]
    fn create2_reverts_on_collision() {
        let salt = B256::ZERO;
        let (mut ledger, factory) = setup();
        create2(&mut ledger, factory, salt);

        let err = ledger
            .transact(
                ALICE,
                factory,
                &ITestCreateFunctions::createWithCreate2Call { salt }.abi_encode(),
            )
            .unwrap_err();
        assert_eq!(err.reason().as_deref(), Some("create collision"));
    }

    #[test]
    fn children_are_callable_by_anyone() {
        let (mut ledger, factory) = setup();
        let child = create2(&mut ledger, factory, B256::ZERO);

        ledger
            .transact(BOB, child, &IBasicStorage::addCall { value: uint!(5_U256) }.abi_encode())
            .expect("anyone should call the child");

        let number = ledger.call(ALICE, child, &IBasicStorage::numberCall {}.abi_encode()).unwrap();
        assert_eq!(U256::abi_decode(&number).unwrap(), uint!(5_U256));
        let last = ledger
            .call(ALICE, factory, &ITestCreateFunctions::lastCreatedCall {}.abi_encode())
            .unwrap();
        assert_eq!(Address::abi_decode(&last).unwrap(), child);
    }
}
