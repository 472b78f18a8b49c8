//! A contract probing the EVM behaviours a compatible chain has to get
//! right: checked arithmetic, comparisons, raw storage slots, dynamic arrays
//! and mappings.
use alloy_primitives::{uint, B256, U256};
use alloy_sol_types::SolValue;
pub use sol::*;

use crate::{
    arithmetic::{panic, CheckedArith, ARRAY_OUT_OF_BOUNDS, EMPTY_ARRAY_POP},
    vm::{
        decode_call,
        storage::{StorageMap, StorageU256, StorageVec},
        CallResult, Context, Contract,
    },
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// External interface of [`super::EvmCompatibilityTest`].
        #[allow(missing_docs)]
        interface IEVMCompatibilityTest {
            function universalNumber() external view returns (uint256);

            function add(uint256 a, uint256 b) external pure returns (uint256);
            function subtract(uint256 a, uint256 b) external pure returns (uint256);
            function multiply(uint256 a, uint256 b) external pure returns (uint256);
            function divide(uint256 a, uint256 b) external pure returns (uint256);
            function modulo(uint256 a, uint256 b) external pure returns (uint256);
            function exponentiate(uint256 a, uint256 b) external pure returns (uint256);

            function equal(uint256 a, uint256 b) external pure returns (bool);
            function notEqual(uint256 a, uint256 b) external pure returns (bool);
            function greaterThan(uint256 a, uint256 b) external pure returns (bool);
            function lessThan(uint256 a, uint256 b) external pure returns (bool);
            function greaterThanOrEqual(uint256 a, uint256 b) external pure returns (bool);
            function lessThanOrEqual(uint256 a, uint256 b) external pure returns (bool);

            function store(bytes32 key, uint256 value) external;
            function read(bytes32 key) external view returns (uint256);
            function remove(bytes32 key) external;

            function pushArrayElement(uint256 value) external;
            function getArrayElement(uint256 index) external view returns (uint256);
            function deleteArrayElement(uint256 index) external;
            function popArrayElement() external;
            function getArrayLength() external view returns (uint256);

            function setMapElement(bytes32 key, uint256 value) external;
            function getMapElement(bytes32 key) external view returns (uint256);
            function deleteMapElement(bytes32 key) external;
        }
    }
}

const UNIVERSAL_NUMBER: StorageU256 = StorageU256::at(U256::ZERO);
const ARRAY: StorageVec = StorageVec::at(uint!(1_U256));
const MAP: StorageMap = StorageMap::at(uint!(2_U256));

/// `store`, `read` and `remove` use their key as the slot itself.
fn raw_slot(key: B256) -> U256 {
    U256::from_be_bytes(key.0)
}

/// `EVMCompatibilityTest`. Constructor parameter: `uint256 universalNumber`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvmCompatibilityTest;

impl Contract for EvmCompatibilityTest {
    fn name(&self) -> &'static str {
        "EVMCompatibilityTest"
    }

    fn constructor(&self, ctx: &mut Context<'_>, args: &[u8]) -> Result<(), Vec<u8>> {
        let universal_number = U256::abi_decode(args).map_err(|_| Vec::new())?;
        UNIVERSAL_NUMBER.set(ctx, universal_number);
        Ok(())
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use IEVMCompatibilityTest::IEVMCompatibilityTestCalls as Calls;

        let Some(call) = decode_call::<Calls>(calldata) else {
            return Err(Vec::new());
        };
        let output = match call? {
            Calls::universalNumber(_) => UNIVERSAL_NUMBER.get(ctx).abi_encode(),

            Calls::add(c) => c.a.add_or_panic(c.b)?.abi_encode(),
            Calls::subtract(c) => c.a.sub_or_panic(c.b)?.abi_encode(),
            Calls::multiply(c) => c.a.mul_or_panic(c.b)?.abi_encode(),
            Calls::divide(c) => c.a.div_or_panic(c.b)?.abi_encode(),
            Calls::modulo(c) => c.a.rem_or_panic(c.b)?.abi_encode(),
            Calls::exponentiate(c) => c.a.pow_or_panic(c.b)?.abi_encode(),

            Calls::equal(c) => (c.a == c.b).abi_encode(),
            Calls::notEqual(c) => (c.a != c.b).abi_encode(),
            Calls::greaterThan(c) => (c.a > c.b).abi_encode(),
            Calls::lessThan(c) => (c.a < c.b).abi_encode(),
            Calls::greaterThanOrEqual(c) => (c.a >= c.b).abi_encode(),
            Calls::lessThanOrEqual(c) => (c.a <= c.b).abi_encode(),

            Calls::store(c) => {
                ctx.sstore(raw_slot(c.key), c.value);
                Vec::new()
            }
            Calls::read(c) => ctx.sload(raw_slot(c.key)).abi_encode(),
            Calls::remove(c) => {
                ctx.sstore(raw_slot(c.key), U256::ZERO);
                Vec::new()
            }

            Calls::pushArrayElement(c) => {
                ARRAY.push(ctx, c.value);
                Vec::new()
            }
            Calls::getArrayElement(c) => ARRAY
                .get(ctx, c.index)
                .ok_or_else(|| panic(ARRAY_OUT_OF_BOUNDS))?
                .abi_encode(),
            Calls::deleteArrayElement(c) => {
                if !ARRAY.set(ctx, c.index, U256::ZERO) {
                    return Err(panic(ARRAY_OUT_OF_BOUNDS));
                }
                Vec::new()
            }
            Calls::popArrayElement(_) => {
                ARRAY.pop(ctx).ok_or_else(|| panic(EMPTY_ARRAY_POP))?;
                Vec::new()
            }
            Calls::getArrayLength(_) => ARRAY.len(ctx).abi_encode(),

            Calls::setMapElement(c) => {
                MAP.getter::<StorageU256>(&c.key).set(ctx, c.value);
                Vec::new()
            }
            Calls::getMapElement(c) => {
                MAP.getter::<StorageU256>(&c.key).get(ctx).abi_encode()
            }
            Calls::deleteMapElement(c) => {
                MAP.getter::<StorageU256>(&c.key).set(ctx, U256::ZERO);
                Vec::new()
            }
        };
        Ok(output)
    }
}
