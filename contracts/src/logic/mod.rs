//! The two interchangeable implementations run behind the transparent proxy.
//!
//! Both variants share one capability interface, [`ILogic`], and one storage
//! layout: `number` at slot `0` and the [`Initializable`] state in its own
//! namespace. Which one a proxy runs is decided by its implementation slot
//! alone, so upgrading from one to the other keeps `number` as is.
use std::{fmt, str::FromStr};

use alloy_primitives::U256;
use alloy_sol_types::SolValue;
pub use sol::*;

use crate::{
    arithmetic::CheckedArith,
    proxy::utils::Initializable,
    vm::{decode_call, storage::StorageU256, CallResult, Context, Contract},
};

mod sol {
    use alloy_sol_types::sol;

    sol! {
        /// Capability interface shared by every [`super::Logic`] version.
        #[allow(missing_docs)]
        interface ILogic {
            function number() external view returns (uint256);
            function getNumber() external view returns (uint256);
            function version() external view returns (string);
            function modify() external;
            function initalValue(uint256 value) external;
        }
    }
}

const NUMBER: StorageU256 = StorageU256::at(U256::ZERO);

/// Behaviour of [`ILogic::modifyCall`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Version {
    /// `number += 1`.
    Positive,
    /// `number -= 1`.
    Negative,
}

impl Version {
    /// Name returned by `version()`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Version::Positive => "positive",
            Version::Negative => "negative",
        }
    }

    /// The other version.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Version::Positive => Version::Negative,
            Version::Negative => Version::Positive,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string that names no [`Version`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownVersion(pub String);

impl fmt::Display for UnknownVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown logic version `{}`, expected `positive` or `negative`", self.0)
    }
}

impl std::error::Error for UnknownVersion {}

impl FromStr for Version {
    type Err = UnknownVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Version::Positive),
            "negative" => Ok(Version::Negative),
            other => Err(UnknownVersion(other.to_owned())),
        }
    }
}

/// Implementation contract holding a single counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Logic {
    version: Version,
}

impl Logic {
    /// The implementation of `version`.
    #[must_use]
    pub const fn new(version: Version) -> Self {
        Self { version }
    }

    /// The incrementing implementation.
    #[must_use]
    pub const fn positive() -> Self {
        Self::new(Version::Positive)
    }

    /// The decrementing implementation.
    #[must_use]
    pub const fn negative() -> Self {
        Self::new(Version::Negative)
    }

    /// Version of this implementation.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Applies the version's step to `number`.
    ///
    /// # Errors
    ///
    /// * `Panic(0x11)` - If `number` would overflow, or underflow below zero.
    pub fn modify(&self, ctx: &mut Context<'_>) -> Result<(), Vec<u8>> {
        let number = NUMBER.get(ctx);
        let next = match self.version {
            Version::Positive => number.add_or_panic(U256::from(1))?,
            Version::Negative => number.sub_or_panic(U256::from(1))?,
        };
        NUMBER.set(ctx, next);
        Ok(())
    }
}

impl Contract for Logic {
    fn name(&self) -> &'static str {
        match self.version {
            Version::Positive => "Logic_positive",
            Version::Negative => "Logic_negative",
        }
    }

    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult {
        use ILogic::ILogicCalls as Calls;

        let Some(call) = decode_call::<Calls>(calldata) else {
            return Err(Vec::new());
        };
        match call? {
            Calls::number(_) | Calls::getNumber(_) => Ok(NUMBER.get(ctx).abi_encode()),
            Calls::version(_) => Ok(self.version.as_str().to_owned().abi_encode()),
            Calls::modify(_) => {
                self.modify(ctx)?;
                Ok(Vec::new())
            }
            Calls::initalValue(c) => Initializable.initializer(ctx, |ctx| {
                NUMBER.set(ctx, c.value);
                Ok(Vec::new())
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, uint, Address};
    use alloy_sol_types::{SolCall, SolValue};

    use super::*;
    use crate::{
        arithmetic::ARITHMETIC_OVERFLOW,
        proxy::utils::initializable::InvalidInitialization,
        vm::Ledger,
    };

    const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");

    fn deploy(ledger: &mut Ledger, logic: Logic) -> Address {
        ledger.deploy(ALICE, logic, &[]).unwrap().contract_address.unwrap()
    }

    fn version(ledger: &Ledger, contract: Address) -> String {
        let out = ledger.call(ALICE, contract, &ILogic::versionCall {}.abi_encode()).unwrap();
        String::abi_decode(&out).unwrap()
    }

    fn number(ledger: &Ledger, contract: Address, calldata: &[u8]) -> U256 {
        U256::abi_decode(&ledger.call(ALICE, contract, calldata).unwrap()).unwrap()
    }

    #[test]
    fn versions_name_themselves() {
        let mut ledger = Ledger::default();
        let positive = deploy(&mut ledger, Logic::positive());
        let negative = deploy(&mut ledger, Logic::negative());

        assert_eq!(version(&ledger, positive), "positive");
        assert_eq!(version(&ledger, negative), "negative");
    }

    #[test]
    fn parses_versions() {
        assert_eq!("negative".parse::<Version>(), Ok(Version::Negative));
        assert_eq!(Version::Positive.flipped(), Version::Negative);
        assert_eq!(Version::Negative.to_string(), "negative");
        assert!("neutral".parse::<Version>().is_err());
    }

    #[test]
    fn initial_value_is_set_once() {
        let mut ledger = Ledger::default();
        let logic = deploy(&mut ledger, Logic::positive());

        ledger
            .transact(ALICE, logic, &ILogic::initalValueCall { value: uint!(42_U256) }.abi_encode())
            .unwrap();
        assert_eq!(
            number(&ledger, logic, &ILogic::getNumberCall {}.abi_encode()),
            uint!(42_U256)
        );

        let err = ledger
            .transact(ALICE, logic, &ILogic::initalValueCall { value: uint!(1_U256) }.abi_encode())
            .unwrap_err();
        assert!(err.decode::<InvalidInitialization>().is_some());
    }

    #[test]
    fn negative_underflow_panics() {
        let mut ledger = Ledger::default();
        let logic = deploy(&mut ledger, Logic::negative());

        let err = ledger.transact(ALICE, logic, &ILogic::modifyCall {}.abi_encode()).unwrap_err();
        assert_eq!(err.panic_code(), Some(U256::from(ARITHMETIC_OVERFLOW)));
    }

    #[test]
    fn modify_steps_by_one() {
        let mut ledger = Ledger::default();
        let logic = deploy(&mut ledger, Logic::positive());

        ledger.transact(ALICE, logic, &ILogic::modifyCall {}.abi_encode()).unwrap();
        ledger.transact(ALICE, logic, &ILogic::modifyCall {}.abi_encode()).unwrap();
        assert_eq!(number(&ledger, logic, &ILogic::numberCall {}.abi_encode()), uint!(2_U256));
    }
}
