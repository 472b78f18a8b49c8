//! A single public number, updated with checked arithmetic.
use alloy_primitives::U256;
use alloy_sol_types::SolValue;
pub use sol::*;

use crate::{
    arithmetic::CheckedArith,
    vm::{decode_call, storage::StorageU256, CallResult, Context, Contract},
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// External interface of [`super::BasicStorage`].
        #[allow(missing_docs)]
        interface IBasicStorage {
            function number() external view returns (uint256);
            function add(uint256 value) external;
            function subtract(uint256 value) external;
            function multiply(uint256 value) external;
            function divide(uint256 value) external;
        }
    }
}

const NUMBER: StorageU256 = StorageU256::at(U256::ZERO);

/// `BasicStorage`, the target of a [`super::Chatterbox`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BasicStorage;

impl Contract for BasicStorage {
    fn name(&self) -> &'static str {
        "BasicStorage"
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use IBasicStorage::IBasicStorageCalls as Calls;

        let Some(call) = decode_call::<Calls>(calldata) else {
            return Err(Vec::new());
        };
        let number = NUMBER.get(ctx);
        let next = match call? {
            Calls::number(_) => return Ok(number.abi_encode()),
            Calls::add(c) => number.add_or_panic(c.value)?,
            Calls::subtract(c) => number.sub_or_panic(c.value)?,
            Calls::multiply(c) => number.mul_or_panic(c.value)?,
            Calls::divide(c) => number.div_or_panic(c.value)?,
        };
        NUMBER.set(ctx, next);
        Ok(Vec::new())
    }
}
