//! The deploy scripts of the playground.
use alloy_primitives::{uint, U256};
use alloy_sol_types::SolValue;
use playground_contracts::{
    basics::{BasicStorage, Chatterbox, EvmCompatibilityTest, TestCreateFunctions},
    logic::{ILogic, Logic, Version},
    token::{erc20::BasicTestToken, erc721::BasicNft},
};

use crate::deploy::{ConstructorArgs, DeploymentDescriptor, Initializer, ProxyConfig};

/// Constructor parameter of `EVMCompatibilityTest`, and initial value of the
/// `Logic` proxy.
pub const UNIVERSAL_NUMBER: U256 = uint!(42_U256);

/// Name of the `Logic` proxy deployment.
pub const LOGIC: &str = "Logic";

/// Every deploy script, in registry order.
#[must_use]
pub fn registry() -> Vec<DeploymentDescriptor> {
    vec![
        DeploymentDescriptor::new("EVMCompatibilityTest", EvmCompatibilityTest)
            .with_args(ConstructorArgs::Encoded(UNIVERSAL_NUMBER.abi_encode().into()))
            .tagged(&["all", "basics", "EVMCompatibilityTest"])
            .listed_as("evmCompatibilityTest"),
        DeploymentDescriptor::new("BasicStorage", BasicStorage)
            .tagged(&["all", "basics", "BasicStorage"])
            .listed_as("basicStorage"),
        DeploymentDescriptor::new("Chatterbox", Chatterbox)
            .with_args(ConstructorArgs::AddressOf("BasicStorage".to_owned()))
            .tagged(&["all", "basics", "Chatterbox"])
            .depends_on(&["BasicStorage"])
            .listed_as("chatterbox"),
        DeploymentDescriptor::new(LOGIC, Logic::positive())
            .with_proxy(ProxyConfig {
                initializer: Some(Initializer::new(&ILogic::initalValueCall {
                    value: UNIVERSAL_NUMBER,
                })),
                implementation: Some(logic_implementation(Version::Positive).name),
                ..ProxyConfig::default()
            })
            .tagged(&["all", "proxies", "transparent", "Logic"])
            .listed_as("logicProxy"),
        DeploymentDescriptor::new("BasicNFT", BasicNft)
            .with_args(ConstructorArgs::Deployer)
            .tagged(&["all", "ERC721", "BasicNFT"])
            .listed_as("basicNFT"),
        DeploymentDescriptor::new("BasicTestToken", BasicTestToken)
            .with_args(ConstructorArgs::Deployer)
            .tagged(&["all", "tokens", "ERC20", "BasicTestToken"])
            .listed_as("basicTestToken"),
        DeploymentDescriptor::new("TestCreateFunctions", TestCreateFunctions)
            .tagged(&["all", "create", "TestCreateFunctions"])
            .listed_as("testCreateFunctions"),
    ]
}

/// Standalone implementation of `version`, the target of `Logic` upgrades.
///
/// Recorded as `Logic_positive` or `Logic_negative`, so each version is
/// deployed once and reused by later upgrades. The proxy's initial
/// implementation is recorded as `Logic_positive` too.
#[must_use]
pub fn logic_implementation(version: Version) -> DeploymentDescriptor {
    DeploymentDescriptor::new(format!("Logic_{version}"), Logic::new(version))
        .listed_as(format!("logic_{version}"))
}
