//! Deploy scripts run end to end on simulated networks.
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolType, SolValue};
use eyre::Result;
use playground_contracts::{
    access::IOwnable,
    basics::IChatterbox,
    logic::{ILogic, Logic, Version},
    proxy::{erc1967::get_implementation_address, utils::initializable::InvalidInitialization},
};
use playground_deploy::{
    scripts::{self, logic_implementation, LOGIC, UNIVERSAL_NUMBER},
    Config, DeployError, Deployer, DeploymentDescriptor, ErrorExt, Expect, InMemoryVerifier,
    Initializer, NoopVerifier, ProxyConfig, RevertExt, Verifier,
};

const CONFIG: &str = r#"
    [accounts]
    deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
    assistant = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

    [networks.sepolia]
    chain_id = 11155111
    confirmations = 6

    [networks.etherlink]
    chain_id = 128123
    confirmations = 0
    revert_data = false
"#;

fn deployer<V: Verifier>(network: &str, verifier: V) -> Deployer<V> {
    let config = Config::from_toml_str(CONFIG).expect("should parse config");
    let network = config.network(network).expect("should know network");
    Deployer::new(network, config.accounts, verifier)
}

fn read<C, T>(deployer: &Deployer<impl Verifier>, to: Address, call: &C) -> T
where
    C: SolCall,
    T: SolValue + From<<T::SolType as SolType>::RustType>,
{
    let from = deployer.accounts().assistant().expect("should have an assistant");
    let out = deployer.ledger().call(from, to, &call.abi_encode()).expect("should call");
    T::abi_decode(&out).expect("should decode")
}

fn logic_state(deployer: &Deployer<impl Verifier>) -> (U256, String) {
    let proxy = deployer.deployments().get(LOGIC).expect("should be deployed").address;
    (
        read(deployer, proxy, &ILogic::numberCall {}),
        read(deployer, proxy, &ILogic::versionCall {}),
    )
}

#[tokio::test]
async fn deploys_every_script_on_hardhat() -> Result<()> {
    let mut deployer = deployer("hardhat", NoopVerifier);

    let deployed = deployer.run_tags(&scripts::registry(), &["all"]).await?;

    assert_eq!(
        deployed,
        [
            "EVMCompatibilityTest",
            "BasicStorage",
            "Chatterbox",
            "Logic",
            "BasicNFT",
            "BasicTestToken",
            "TestCreateFunctions"
        ]
    );

    let deployments = deployer.deployments();
    let basic_storage = deployments.require("BasicStorage")?.address;
    let chatterbox = deployments.require("Chatterbox")?.address;
    let target: Address = read(&deployer, chatterbox, &IChatterbox::targetCall {});
    assert_eq!(target, basic_storage);

    let logic = deployments.require(LOGIC)?;
    assert_eq!(logic.implementation, Some(deployments.require("Logic_positive")?.address));
    assert!(deployments.get("Logic_Implementation").is_none());
    assert_eq!(logic_state(&deployer), (UNIVERSAL_NUMBER, "positive".to_owned()));

    let deployer_address = deployer.accounts().deployer;
    for name in ["BasicNFT", "BasicTestToken"] {
        let address = deployer.deployments().require(name)?.address;
        let owner: Address = read(&deployer, address, &IOwnable::ownerCall {});
        assert_eq!(owner, deployer_address);
    }
    let admin = deployer.deployments().require(LOGIC)?.admin.expect("should have an admin");
    let owner: Address = read(&deployer, admin, &IOwnable::ownerCall {});
    assert_eq!(owner, deployer_address);

    Ok(())
}

#[tokio::test]
async fn rerunning_reuses_deployments() -> Result<()> {
    let mut deployer = deployer("hardhat", NoopVerifier);
    let scripts = scripts::registry();

    deployer.run_tags(&scripts, &["basics"]).await?;
    let before = deployer.deployments().clone();
    let block = deployer.ledger().block_number();

    deployer.run_tags(&scripts, &["Chatterbox"]).await?;

    assert_eq!(deployer.deployments(), &before);
    assert_eq!(deployer.ledger().block_number(), block);
    Ok(())
}

#[tokio::test]
async fn waits_for_network_confirmations() -> Result<()> {
    let scripts = scripts::registry();

    let mut sepolia = deployer("sepolia", NoopVerifier);
    let deployed = sepolia.deploy(&scripts[0]).await?;
    assert_eq!(sepolia.ledger().block_number(), deployed.block_number + 6);

    let mut hardhat = deployer("hardhat", NoopVerifier);
    let deployed = hardhat.deploy(&scripts[0]).await?;
    assert_eq!(hardhat.ledger().block_number(), deployed.block_number + 1);

    let mut etherlink = deployer("etherlink", NoopVerifier);
    let deployed = etherlink.deploy(&scripts[0]).await?;
    assert_eq!(etherlink.ledger().block_number(), deployed.block_number);
    Ok(())
}

#[tokio::test]
async fn verifies_only_on_live_networks() -> Result<()> {
    let mut hardhat = deployer("hardhat", InMemoryVerifier::new());
    hardhat.run_tags(&scripts::registry(), &["basics"]).await?;
    assert!(hardhat.verifier().verified().await.is_empty());

    let mut sepolia = deployer("sepolia", InMemoryVerifier::new());
    sepolia.run_tags(&scripts::registry(), &["basics"]).await?;
    let verified = sepolia.verifier().verified().await;

    let basic_storage = sepolia.deployments().require("BasicStorage")?.address;
    let chatterbox = sepolia.deployments().require("Chatterbox")?.address;
    assert_eq!(verified.len(), 3);
    assert_eq!(
        verified.get(&chatterbox).map(|args| args.to_vec()),
        Some(basic_storage.abi_encode())
    );
    Ok(())
}

#[tokio::test]
async fn upgrades_switch_logic_and_keep_number() -> Result<()> {
    let mut deployer = deployer("hardhat", NoopVerifier);
    deployer.run_tags(&scripts::registry(), &["Logic"]).await?;
    let proxy = deployer.deployments().require(LOGIC)?.address;
    let positive = deployer.deployments().require("Logic_positive")?.address;
    let assistant = deployer.accounts().assistant()?;

    deployer
        .ledger_mut()
        .transact(assistant, proxy, &ILogic::modifyCall {}.abi_encode())
        .expect("should modify");
    assert_eq!(logic_state(&deployer), (U256::from(43), "positive".to_owned()));

    let upgraded =
        deployer.upgrade_proxy(LOGIC, &logic_implementation(Version::Negative), None).await?;
    let negative = deployer.deployments().require("Logic_negative")?.address;
    assert_eq!(upgraded.implementation, Some(negative));
    assert_eq!(get_implementation_address(deployer.ledger(), proxy), negative);
    assert_eq!(logic_state(&deployer), (U256::from(43), "negative".to_owned()));

    deployer
        .ledger_mut()
        .transact(assistant, proxy, &ILogic::modifyCall {}.abi_encode())
        .expect("should modify");
    assert_eq!(logic_state(&deployer), (UNIVERSAL_NUMBER, "negative".to_owned()));

    let nonce = deployer.ledger().nonce(deployer.accounts().deployer);
    deployer.upgrade_proxy(LOGIC, &logic_implementation(Version::Positive), None).await?;
    assert_eq!(get_implementation_address(deployer.ledger(), proxy), positive);
    assert_eq!(deployer.deployments().require("Logic_positive")?.address, positive);
    // Only the upgrade itself was sent: the initial implementation is reused.
    assert_eq!(deployer.ledger().nonce(deployer.accounts().deployer), nonce + 1);

    deployer.upgrade_proxy(LOGIC, &logic_implementation(Version::Negative), None).await?;
    assert_eq!(get_implementation_address(deployer.ledger(), proxy), negative);
    assert_eq!(logic_state(&deployer), (UNIVERSAL_NUMBER, "negative".to_owned()));
    Ok(())
}

#[tokio::test]
async fn proxied_implementation_defaults_to_its_own_record() -> Result<()> {
    let mut deployer = deployer("hardhat", NoopVerifier);
    let script =
        DeploymentDescriptor::new("Counter", Logic::positive()).with_proxy(ProxyConfig::default());

    let deployed = deployer.deploy(&script).await?;

    let implementation = deployer.deployments().require("Counter_Implementation")?.address;
    assert_eq!(deployed.implementation, Some(implementation));
    Ok(())
}

#[tokio::test]
async fn replayed_initializer_reverts_the_upgrade() -> Result<()> {
    let mut deployer = deployer("hardhat", NoopVerifier);
    deployer.run_tags(&scripts::registry(), &["Logic"]).await?;
    let proxy = deployer.deployments().require(LOGIC)?.address;
    let before = get_implementation_address(deployer.ledger(), proxy);

    let replay = Initializer::new(&ILogic::initalValueCall { value: U256::from(7) });
    let err = deployer
        .upgrade_proxy(LOGIC, &logic_implementation(Version::Negative), Some(&replay))
        .await
        .unwrap_err();

    assert!(err.is_err(InvalidInitialization {}));
    assert_eq!(get_implementation_address(deployer.ledger(), proxy), before);
    assert_eq!(logic_state(&deployer), (UNIVERSAL_NUMBER, "positive".to_owned()));
    Ok(())
}

#[tokio::test]
async fn chains_without_revert_data_fail_silently() -> Result<()> {
    let mut deployer = deployer("etherlink", NoopVerifier);
    deployer.run_tags(&scripts::registry(), &["Logic"]).await?;

    let replay = Initializer::new(&ILogic::initalValueCall { value: U256::from(7) });
    let err = deployer
        .upgrade_proxy(LOGIC, &logic_implementation(Version::Negative), Some(&replay))
        .await
        .unwrap_err();

    assert!(err.is_silent());
    assert!(!err.is_err(InvalidInitialization {}));
    assert!(Expect::on(deployer.network()).reverted_with(&err, InvalidInitialization {}));
    Ok(())
}

#[tokio::test]
async fn upgrading_an_unknown_proxy_fails() {
    let mut deployer = deployer("hardhat", NoopVerifier);

    let err = deployer
        .upgrade_proxy(LOGIC, &logic_implementation(Version::Negative), None)
        .await
        .unwrap_err();

    assert!(matches!(err, DeployError::MissingDeployment(name) if name == LOGIC));
    assert_eq!(deployer.ledger().block_number(), 0);
}

#[tokio::test]
async fn unknown_tags_fail_before_deploying() {
    let mut deployer = deployer("hardhat", NoopVerifier);

    let err = deployer.run_tags(&scripts::registry(), &["basics", "ERC1155"]).await.unwrap_err();

    assert!(matches!(err, DeployError::UnknownTag(tag) if tag == "ERC1155"));
    assert!(deployer.deployments().is_empty());
    assert_eq!(deployer.ledger().block_number(), 0);
}
