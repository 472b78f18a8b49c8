//! Definitions of CLI arguments and commands

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use playground_contracts::logic::Version;
use playground_deploy::{Config, Network};

use crate::commands::{check, deploy, mint_nft, transfer_nft, upgrade};

/// Metadata of the tokens minted by the NFT commands.
pub(crate) const DEFAULT_TOKEN_URI: &str =
    "https://sapphire-welcome-narwhal-847.mypinata.cloud/ipfs/QmYsaYw2MKZHwAMzPmdqnG3DG9Qp6oNMEnsFQJsH7dWYHD";

#[derive(Parser)]
#[command(name = "playground", version, about)]
pub(crate) struct Cli {
    /// Network configuration file
    #[arg(short, long, env = "PLAYGROUND_CONFIG", default_value = "networks.toml")]
    pub(crate) config: PathBuf,

    /// Network to simulate
    #[arg(short, long, env = "PLAYGROUND_NETWORK", default_value = "hardhat")]
    pub(crate) network: String,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the deploy scripts selected by tags
    Deploy(DeployArgs),
    /// Check the address table of the network
    Check,
    /// Deploy the `Logic` proxy and upgrade it to another version
    Upgrade(UpgradeArgs),
    /// Mint a `BasicNFT` token to the deployer
    MintNft(NftArgs),
    /// Mint a `BasicNFT` token and transfer it to the assistant account
    TransferNft(NftArgs),
}

impl Command {
    pub(crate) async fn run(self, config: &Config, network: Network) -> eyre::Result<()> {
        match self {
            Command::Deploy(args) => deploy(args, config, network).await,
            Command::Check => check(config, &network),
            Command::Upgrade(args) => upgrade(args, config, network).await,
            Command::MintNft(args) => mint_nft(args, config, network).await,
            Command::TransferNft(args) => transfer_nft(args, config, network).await,
        }
    }
}

#[derive(Args)]
pub(crate) struct DeployArgs {
    /// Tags of the scripts to run, e.g. `all`, `basics`, `Logic`
    #[arg(short, long, value_delimiter = ',', default_value = "all")]
    pub(crate) tags: Vec<String>,

    /// Write the deployments record to this file, as JSON
    #[arg(short, long)]
    pub(crate) out: Option<PathBuf>,
}

#[derive(Args)]
pub(crate) struct UpgradeArgs {
    /// Version to upgrade to
    #[arg(short, long, default_value = "negative")]
    pub(crate) version: Version,

    /// Call `modify()` through the proxy before and after the upgrade
    #[arg(short, long)]
    pub(crate) modify: bool,
}

#[derive(Args)]
pub(crate) struct NftArgs {
    /// Token URI of the minted token
    #[arg(short, long, default_value = DEFAULT_TOKEN_URI)]
    pub(crate) uri: String,
}
