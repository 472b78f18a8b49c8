//! Implementations of the CLI commands

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use eyre::{bail, WrapErr};
use playground_contracts::{
    logic::ILogic,
    token::erc721::{IBasicNft, IErc721, Transfer},
};
use playground_deploy::{
    scripts::{self, logic_implementation, LOGIC},
    Config, ConfigError, Deployer, InMemoryVerifier, Network,
};

use crate::cli::{DeployArgs, NftArgs, UpgradeArgs};

const BASIC_NFT: &str = "BasicNFT";

pub(crate) async fn deploy(
    args: DeployArgs,
    config: &Config,
    network: Network,
) -> eyre::Result<()> {
    let scripts = scripts::registry();
    let mut deployer = Deployer::new(network, config.accounts, InMemoryVerifier::new());

    let deployed = deployer.run_tags(&scripts, args.tags.as_slice()).await?;

    let network = deployer.network();
    for name in &deployed {
        let deployment = deployer.deployments().require(name)?;
        tracing::info!(name = %name, address = %deployment.address, "deployment");

        let key = scripts
            .iter()
            .find(|script| &script.name == name)
            .and_then(|script| script.address_key.as_deref());
        if let (Some(key), false) = (key, network.is_development()) {
            if config.addresses.address(network.name(), key).is_err() {
                tracing::warn!(
                    key,
                    network = network.name(),
                    "remember to add the address to the address table"
                );
            }
        }
    }

    if let Some(out) = args.out {
        deployer
            .deployments()
            .write(&out)
            .wrap_err_with(|| format!("failed to write {}", out.display()))?;
        tracing::info!(path = %out.display(), "deployments written");
    }
    Ok(())
}

pub(crate) fn check(config: &Config, network: &Network) -> eyre::Result<()> {
    let mut invalid = 0;
    for key in config.addresses.keys() {
        match config.addresses.address(network.name(), key) {
            Ok(address) => tracing::info!(key, %address, "configured"),
            Err(ConfigError::MissingAddress { .. }) => {
                tracing::warn!(key, network = network.name(), "not deployed");
            }
            Err(e) => {
                tracing::error!(key, error = %e, "invalid entry");
                invalid += 1;
            }
        }
    }

    for script in scripts::registry() {
        let Some(key) = script.address_key else {
            continue;
        };
        if !config.addresses.keys().any(|k| k == key) {
            tracing::warn!(name = %script.name, key = %key, "missing from the address table");
        }
    }

    if invalid > 0 {
        bail!("{invalid} malformed address(es) for network `{}`", network.name());
    }
    Ok(())
}

pub(crate) async fn upgrade(
    args: UpgradeArgs,
    config: &Config,
    network: Network,
) -> eyre::Result<()> {
    let mut deployer = Deployer::new(network, config.accounts, InMemoryVerifier::new());
    deployer.run_tags(&scripts::registry(), &[LOGIC]).await?;
    let proxy = deployer.deployments().require(LOGIC)?.address;

    if args.modify {
        modify(&mut deployer, proxy)?;
    }

    let upgraded =
        deployer.upgrade_proxy(LOGIC, &logic_implementation(args.version), None).await?;
    tracing::info!(
        proxy = %upgraded.address,
        implementation = ?upgraded.implementation,
        admin = ?upgraded.admin,
        "{LOGIC} upgraded to {}",
        args.version
    );

    if args.modify {
        modify(&mut deployer, proxy)?;
    }

    let (number, version) = state(&deployer, proxy)?;
    tracing::info!(%number, %version, "proxy state");
    Ok(())
}

fn modify(deployer: &mut Deployer<InMemoryVerifier>, proxy: Address) -> eyre::Result<()> {
    let from = deployer.accounts().assistant()?;
    deployer
        .ledger_mut()
        .transact(from, proxy, &ILogic::modifyCall {}.abi_encode())
        .wrap_err("modify() reverted")?;
    let (number, version) = state(deployer, proxy)?;
    tracing::info!(%number, %version, "modified");
    Ok(())
}

fn state(deployer: &Deployer<InMemoryVerifier>, proxy: Address) -> eyre::Result<(U256, String)> {
    let from = deployer.accounts().deployer;
    let ledger = deployer.ledger();
    let number = ledger.call(from, proxy, &ILogic::numberCall {}.abi_encode())?;
    let version = ledger.call(from, proxy, &ILogic::versionCall {}.abi_encode())?;
    Ok((U256::abi_decode(&number)?, String::abi_decode(&version)?))
}

pub(crate) async fn mint_nft(args: NftArgs, config: &Config, network: Network) -> eyre::Result<()> {
    let mut deployer = Deployer::new(network, config.accounts, InMemoryVerifier::new());
    let nft = basic_nft(&mut deployer, config).await?;

    let owner = deployer.accounts().deployer;
    let token_id = mint(&mut deployer, nft, owner, &args.uri)?;
    let uri = token_uri(&deployer, nft, token_id)?;
    tracing::info!(%owner, %token_id, uri = %uri, "token minted");
    Ok(())
}

pub(crate) async fn transfer_nft(
    args: NftArgs,
    config: &Config,
    network: Network,
) -> eyre::Result<()> {
    let receiver = config.accounts.assistant()?;
    let mut deployer = Deployer::new(network, config.accounts, InMemoryVerifier::new());
    let nft = basic_nft(&mut deployer, config).await?;

    let owner = deployer.accounts().deployer;
    let token_id = mint(&mut deployer, nft, owner, &args.uri)?;
    transfer(&mut deployer, nft, owner, receiver, token_id)?;
    tracing::info!(
        %token_id,
        owner = %owner_of(&deployer, nft, token_id)?,
        "new owner"
    );
    Ok(())
}

/// Deploys `BasicNFT` on the simulated network.
async fn basic_nft(
    deployer: &mut Deployer<InMemoryVerifier>,
    config: &Config,
) -> eyre::Result<Address> {
    let network = deployer.network().name().to_owned();
    if let Ok(live) = config.address(&network, "basicNFT") {
        tracing::info!(
            %live,
            network = %network,
            "acting on a simulated copy of the listed deployment"
        );
    }
    deployer.run_tags(&scripts::registry(), &[BASIC_NFT]).await?;
    let address = deployer.deployments().require(BASIC_NFT)?.address;
    tracing::info!(%address, "{BASIC_NFT}");
    Ok(address)
}

/// Mints a token with `uri` to `to`, returning its id.
fn mint(
    deployer: &mut Deployer<InMemoryVerifier>,
    nft: Address,
    to: Address,
    uri: &str,
) -> eyre::Result<U256> {
    let from = deployer.accounts().deployer;
    let receipt = deployer
        .ledger_mut()
        .transact(from, nft, &IBasicNft::safeMintCall { to, uri: uri.to_owned() }.abi_encode())
        .wrap_err("safeMint() reverted")?;
    let Some(minted) = receipt.decoded::<Transfer>().next() else {
        bail!("safeMint() emitted no Transfer event");
    };
    tracing::info!(owner = %minted.to, token_id = %minted.token_id, "mint");
    Ok(minted.token_id)
}

fn transfer(
    deployer: &mut Deployer<InMemoryVerifier>,
    nft: Address,
    from: Address,
    to: Address,
    token_id: U256,
) -> eyre::Result<()> {
    tracing::info!(%from, %to, %token_id, "transferring");
    let receipt = deployer
        .ledger_mut()
        .transact(from, nft, &IErc721::transferFromCall { from, to, token_id }.abi_encode())
        .wrap_err("transferFrom() reverted")?;
    for event in receipt.decoded::<Transfer>() {
        tracing::info!(from = %event.from, to = %event.to, token_id = %event.token_id, "transfer");
    }
    Ok(())
}

fn owner_of(
    deployer: &Deployer<InMemoryVerifier>,
    nft: Address,
    token_id: U256,
) -> eyre::Result<Address> {
    let from = deployer.accounts().deployer;
    let out = deployer
        .ledger()
        .call(from, nft, &IErc721::ownerOfCall { token_id }.abi_encode())?;
    Ok(Address::abi_decode(&out)?)
}

fn token_uri(
    deployer: &Deployer<InMemoryVerifier>,
    nft: Address,
    token_id: U256,
) -> eyre::Result<String> {
    let from = deployer.accounts().deployer;
    let out = deployer
        .ledger()
        .call(from, nft, &IBasicNft::tokenURICall { token_id }.abi_encode())?;
    Ok(String::abi_decode(&out)?)
}
