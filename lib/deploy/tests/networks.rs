//! The workspace's `networks.toml`.
use alloy_primitives::address;
use playground_deploy::{scripts, Config, ConfigError};

fn config() -> Config {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../networks.toml");
    Config::load(path).expect("networks.toml should load")
}

#[test]
fn live_networks_are_configured() {
    let config = config();

    let sepolia = config.network("sepolia").unwrap();
    assert_eq!(sepolia.chain_id(), 11_155_111);
    assert_eq!(sepolia.confirmations(), 6);

    let etherlink = config.network("etherlink").unwrap();
    assert_eq!(etherlink.confirmations(), 0);
    assert!(!etherlink.revert_data());

    assert!(config.network("localhost").unwrap().is_development());
}

#[test]
fn etherlink_has_the_whole_proxy_system() {
    let config = config();

    assert_eq!(
        config.address("etherlink", "logicProxy").unwrap(),
        address!("0x6A64DC3eE728896A855De6a5d3519fE6961Bf844")
    );
    for key in ["logic_positive", "logic_negative", "logicAdmin"] {
        config.address("etherlink", key).unwrap();
    }
}

#[test]
fn sepolia_proxy_is_not_deployed() {
    let err = config().address("sepolia", "logicProxy").unwrap_err();
    assert!(matches!(err, ConfigError::MissingAddress { .. }));
}

#[test]
fn every_listed_script_has_an_entry() {
    let config = config();
    let keys: Vec<_> = config.addresses.keys().collect();

    for script in scripts::registry() {
        if let Some(key) = script.address_key {
            assert!(keys.contains(&key.as_str()), "{key} is not in networks.toml");
        }
    }
}

#[test]
fn every_entry_is_well_formed() {
    let config = config();
    for network in ["sepolia", "mumbai", "etherlink"] {
        for key in config.addresses.keys() {
            match config.address(network, key) {
                Ok(_) | Err(ConfigError::MissingAddress { .. }) => {}
                Err(e) => panic!("{e}"),
            }
        }
    }
}

#[test]
fn assistant_is_optional_until_a_scenario_needs_it() {
    let config = Config::from_toml_str(
        r#"
        [accounts]
        deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

        [networks.sepolia]
        chain_id = 11155111
        "#,
    )
    .expect("a deployer alone should be enough");

    assert_eq!(config.accounts.assistant, None);
    let err = config.accounts.assistant().unwrap_err();
    assert!(matches!(err, ConfigError::MissingAccount(ref name) if name == "assistant"));
    assert_eq!(
        err.to_string(),
        "no `assistant` account configured, add it under `[accounts]`"
    );
}

#[test]
fn workspace_config_has_an_assistant() {
    assert_eq!(
        config().accounts.assistant().unwrap(),
        address!("0x70997970C51812dc3A010C7d01b50e0d17dc79C8")
    );
}
