//! A contract that talks to another one: every `*ToTarget` function forwards
//! to the [`super::BasicStorage`] set as target, with a message call.
use alloy_primitives::{uint, Address, U256};
use alloy_sol_types::{SolCall, SolValue};
pub use sol::*;

use super::basic_storage::IBasicStorage;
use crate::vm::{decode_call, storage::StorageAddress, CallResult, Context, Contract};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// External interface of [`super::Chatterbox`].
        #[allow(missing_docs)]
        interface IChatterbox {
            function basicStorage() external view returns (address);
            function target() external view returns (address);
            function setTarget(address target) external;
            function addToTarget(uint256 value) external;
            function substractToTarget(uint256 value) external;
            function multiplyToTarget(uint256 value) external;
            function divideToTarget(uint256 value) external;
        }
    }
}

const BASIC_STORAGE: StorageAddress = StorageAddress::at(U256::ZERO);
const TARGET: StorageAddress = StorageAddress::at(uint!(1_U256));

/// `Chatterbox`. Constructor parameter: `address basicStorage`, which is
/// also the initial target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Chatterbox;

impl Chatterbox {
    fn forward(ctx: &mut Context<'_>, call: &impl SolCall) -> CallResult {
        let target = TARGET.get(ctx);
        ctx.call(target, &call.abi_encode())?;
        Ok(Vec::new())
    }
}

impl Contract for Chatterbox {
    fn name(&self) -> &'static str {
        "Chatterbox"
    }

    fn constructor(&self, ctx: &mut Context<'_>, args: &[u8]) -> Result<(), Vec<u8>> {
        let basic_storage = Address::abi_decode(args).map_err(|_| Vec::new())?;
        BASIC_STORAGE.set(ctx, basic_storage);
        TARGET.set(ctx, basic_storage);
        Ok(())
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use IChatterbox::IChatterboxCalls as Calls;

        let Some(call) = decode_call::<Calls>(calldata) else {
            return Err(Vec::new());
        };
        match call? {
            Calls::basicStorage(_) => Ok(BASIC_STORAGE.get(ctx).abi_encode()),
            Calls::target(_) => Ok(TARGET.get(ctx).abi_encode()),
            Calls::setTarget(c) => {
                TARGET.set(ctx, c.target);
                Ok(Vec::new())
            }
            Calls::addToTarget(c) => {
                Self::forward(ctx, &IBasicStorage::addCall { value: c.value })
            }
            Calls::substractToTarget(c) => {
                Self::forward(ctx, &IBasicStorage::subtractCall { value: c.value })
            }
            Calls::multiplyToTarget(c) => {
                Self::forward(ctx, &IBasicStorage::multiplyCall { value: c.value })
            }
            Calls::divideToTarget(c) => {
                Self::forward(ctx, &IBasicStorage::divideCall { value: c.value })
            }
        }
    }
}
