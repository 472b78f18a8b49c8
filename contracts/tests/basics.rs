//! `Chatterbox` driving a `BasicStorage` through message calls.
use alloy_primitives::{address, uint, Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use playground_contracts::{
    arithmetic::{ARITHMETIC_OVERFLOW, DIVISION_BY_ZERO},
    basics::{BasicStorage, Chatterbox, IBasicStorage, IChatterbox},
    vm::Ledger,
};

const DEPLOYER: Address = address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

struct Setup {
    ledger: Ledger,
    chatterbox: Address,
    basic_storage: Address,
}

fn setup() -> Setup {
    let mut ledger = Ledger::default();
    let basic_storage = ledger
        .deploy(DEPLOYER, BasicStorage, &[])
        .expect("should deploy BasicStorage")
        .contract_address
        .expect("should create an account");
    let chatterbox = ledger
        .deploy(DEPLOYER, Chatterbox, &basic_storage.abi_encode())
        .expect("should deploy Chatterbox")
        .contract_address
        .expect("should create an account");
    Setup { ledger, chatterbox, basic_storage }
}

fn number(ledger: &Ledger, basic_storage: Address) -> U256 {
    let out = ledger
        .call(DEPLOYER, basic_storage, &IBasicStorage::numberCall {}.abi_encode())
        .expect("should read number");
    U256::abi_decode(&out).expect("should decode number")
}

fn address_of(ledger: &Ledger, chatterbox: Address, call: &impl SolCall) -> Address {
    let out = ledger.call(DEPLOYER, chatterbox, &call.abi_encode()).expect("should read");
    Address::abi_decode(&out).expect("should decode address")
}

#[test]
fn targets_basic_storage_after_deployment() {
    let Setup { ledger, chatterbox, basic_storage } = setup();

    assert_eq!(
        address_of(&ledger, chatterbox, &IChatterbox::basicStorageCall {}),
        basic_storage
    );
    assert_eq!(address_of(&ledger, chatterbox, &IChatterbox::targetCall {}), basic_storage);
}

#[test]
fn relays_arithmetic_to_target() {
    let Setup { mut ledger, chatterbox, basic_storage } = setup();

    let calls = [
        IChatterbox::addToTargetCall { value: uint!(10_U256) }.abi_encode(),
        IChatterbox::multiplyToTargetCall { value: uint!(5_U256) }.abi_encode(),
        IChatterbox::substractToTargetCall { value: uint!(8_U256) }.abi_encode(),
        IChatterbox::divideToTargetCall { value: uint!(2_U256) }.abi_encode(),
    ];
    for call in calls {
        ledger.transact(DEPLOYER, chatterbox, &call).expect("should relay");
    }

    assert_eq!(number(&ledger, basic_storage), uint!(21_U256));
}

#[test]
fn target_reverts_bubble_up() {
    let Setup { mut ledger, chatterbox, basic_storage } = setup();

    let err = ledger
        .transact(
            DEPLOYER,
            chatterbox,
            &IChatterbox::substractToTargetCall { value: uint!(1_U256) }.abi_encode(),
        )
        .unwrap_err();
    assert_eq!(err.panic_code(), Some(U256::from(ARITHMETIC_OVERFLOW)));

    let err = ledger
        .transact(
            DEPLOYER,
            chatterbox,
            &IChatterbox::divideToTargetCall { value: U256::ZERO }.abi_encode(),
        )
        .unwrap_err();
    assert_eq!(err.panic_code(), Some(U256::from(DIVISION_BY_ZERO)));

    assert_eq!(number(&ledger, basic_storage), U256::ZERO);
}

#[test]
fn retargets_to_another_storage() {
    let Setup { mut ledger, chatterbox, basic_storage } = setup();
    let other = ledger
        .deploy(DEPLOYER, BasicStorage, &[])
        .unwrap()
        .contract_address
        .unwrap();

    ledger
        .transact(
            DEPLOYER,
            chatterbox,
            &IChatterbox::setTargetCall { target: other }.abi_encode(),
        )
        .expect("should set target");
    ledger
        .transact(
            DEPLOYER,
            chatterbox,
            &IChatterbox::addToTargetCall { value: uint!(3_U256) }.abi_encode(),
        )
        .expect("should relay");

    assert_eq!(address_of(&ledger, chatterbox, &IChatterbox::targetCall {}), other);
    assert_eq!(
        address_of(&ledger, chatterbox, &IChatterbox::basicStorageCall {}),
        basic_storage
    );
    assert_eq!(number(&ledger, other), uint!(3_U256));
    assert_eq!(number(&ledger, basic_storage), U256::ZERO);
}

#[test]
fn silent_chain_drops_bubbled_reasons() {
    let mut ledger = Ledger::default().with_revert_data(false);
    let basic_storage =
        ledger.deploy(DEPLOYER, BasicStorage, &[]).unwrap().contract_address.unwrap();
    let chatterbox = ledger
        .deploy(DEPLOYER, Chatterbox, &basic_storage.abi_encode())
        .unwrap()
        .contract_address
        .unwrap();

    let err = ledger
        .transact(
            DEPLOYER,
            chatterbox,
            &IChatterbox::divideToTargetCall { value: U256::ZERO }.abi_encode(),
        )
        .unwrap_err();

    assert!(err.is_empty());
    assert_eq!(err.panic_code(), None);
}
