/*!
# Upgrade playground contracts

Contracts for exercising an EVM-compatible network, together with the
in-memory ledger they run on.

The centerpiece is the transparent upgradeable proxy: a
[`proxy::transparent::TransparentUpgradeableProxy`] keeps its state and
address while an admin swaps the [`logic::Logic`] it delegates to, from the
`positive` version to the `negative` one and back.

> Contracts are native Rust objects executed by [`vm::Ledger`]. ABI encoding
> follows Solidity, storage follows the Solidity layout rules, but no EVM
> bytecode is ever run.

## Usage

```
use alloy_primitives::{address, U256};
use alloy_sol_types::{SolCall, SolValue};
use playground_contracts::{
    logic::{ILogic, Logic},
    proxy::transparent::{constructor_args, TransparentUpgradeableProxy},
    vm::Ledger,
};

let deployer = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
let mut ledger = Ledger::default();

let positive = ledger.deploy(deployer, Logic::positive(), &[]).unwrap();
let init = ILogic::initalValueCall { value: U256::from(42) }.abi_encode();
let args = constructor_args(positive.contract_address.unwrap(), deployer, &init);
let proxy = ledger.deploy(deployer, TransparentUpgradeableProxy, &args).unwrap();
let proxy = proxy.contract_address.unwrap();

ledger.transact(deployer, proxy, &ILogic::modifyCall {}.abi_encode()).unwrap();
let number = ledger.call(deployer, proxy, &ILogic::numberCall {}.abi_encode()).unwrap();
assert_eq!(U256::abi_decode(&number).unwrap(), U256::from(43));
```
*/

#![allow(clippy::pub_underscore_fields, clippy::module_name_repetitions)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod access;
pub mod arithmetic;
pub mod basics;
pub mod logic;
pub mod proxy;
pub mod token;
pub mod utils;
pub mod vm;
