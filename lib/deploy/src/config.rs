//! Network configuration: development chains, named accounts, confirmation
//! policy and the per-network address table.
//!
//! Everything here is loaded from a TOML file (`networks.toml` at the root of
//! the workspace), never compiled in:
//!
//! ```toml
//! development_chains = ["hardhat", "localhost"]
//!
//! [accounts]
//! deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
//! assistant = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
//!
//! [networks.sepolia]
//! chain_id = 11155111
//! confirmations = 6
//!
//! [addresses.logicProxy]
//! sepolia = ""
//! ```
use std::{collections::BTreeMap, fs, path::Path, str::FromStr};

use alloy_primitives::Address;
use playground_contracts::vm::{Ledger, DEFAULT_CHAIN_ID};
use serde::Deserialize;

use crate::error::ConfigError;

/// Blocks to wait for when a network does not say otherwise.
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// Parsed `networks.toml`.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Networks on which verification is skipped.
    #[serde(default = "default_development_chains")]
    pub development_chains: Vec<String>,
    /// Accounts the deploy scripts act as.
    pub accounts: NamedAccounts,
    /// Live networks, by name.
    #[serde(default)]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Known deployments, by contract and network.
    #[serde(default)]
    pub addresses: AddressTable,
}

fn default_development_chains() -> Vec<String> {
    vec!["hardhat".to_owned(), "localhost".to_owned()]
}

/// Named accounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct NamedAccounts {
    /// Sends every deployment and owns what is deployed.
    pub deployer: Address,
    /// Second account, used by scenarios that need a non-owner. Only those
    /// scenarios require it, see [`NamedAccounts::assistant`].
    #[serde(default)]
    pub assistant: Option<Address>,
}

impl NamedAccounts {
    /// The second account.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::MissingAccount`] - If no assistant is configured.
    pub fn assistant(&self) -> Result<Address, ConfigError> {
        self.assistant.ok_or_else(|| ConfigError::MissingAccount("assistant".to_owned()))
    }
}

/// Settings of one network.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Chain id.
    pub chain_id: u64,
    /// Blocks to wait after each deployment. Missing means
    /// [`DEFAULT_CONFIRMATIONS`], an explicit `0` means no wait.
    #[serde(default)]
    pub confirmations: Option<u64>,
    /// Whether the chain returns revert data to callers.
    #[serde(default = "default_revert_data")]
    pub revert_data: bool,
}

fn default_revert_data() -> bool {
    true
}

impl NetworkConfig {
    fn development() -> Self {
        Self { chain_id: DEFAULT_CHAIN_ID, confirmations: None, revert_data: true }
    }
}

/// Contract key → network → address.
///
/// Entries are kept as written: an empty string marks a contract that was
/// never deployed to that network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AddressTable(BTreeMap<String, BTreeMap<String, String>>);

impl AddressTable {
    /// Returns the address of `key` on `network`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::MissingAddress`] - If there is no entry, or the entry
    ///   is empty.
    /// * [`ConfigError::InvalidAddress`] - If the entry is not a hex address.
    pub fn address(&self, network: &str, key: &str) -> Result<Address, ConfigError> {
        let value = self
            .0
            .get(key)
            .and_then(|networks| networks.get(network))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::MissingAddress {
                network: network.to_owned(),
                key: key.to_owned(),
            })?;

        Address::from_str(value).map_err(|_| ConfigError::InvalidAddress {
            network: network.to_owned(),
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Contract keys present in the table.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl Config {
    /// Reads and parses the configuration at `path`.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Io`] - If the file cannot be read.
    /// * [`ConfigError::Parse`] - If it is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_owned(), source })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a configuration.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::Parse`] - If `s` is not a valid configuration.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Resolves `name` to a network.
    ///
    /// Development chains need no `[networks]` entry: they run on the default
    /// local chain id.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::UnknownNetwork`] - If `name` is neither configured nor
    ///   a development chain.
    pub fn network(&self, name: &str) -> Result<Network, ConfigError> {
        let development = self.development_chains.iter().any(|chain| chain == name);
        let config = match self.networks.get(name) {
            Some(config) => config.clone(),
            None if development => NetworkConfig::development(),
            None => return Err(ConfigError::UnknownNetwork(name.to_owned())),
        };
        Ok(Network { name: name.to_owned(), config, development })
    }

    /// Address of `key` on `network`, from the address table.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::UnknownNetwork`] - If the network is unknown.
    /// * See [`AddressTable::address`].
    pub fn address(&self, network: &str, key: &str) -> Result<Address, ConfigError> {
        self.network(network)?;
        self.addresses.address(network, key)
    }
}

/// A resolved network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Network {
    name: String,
    config: NetworkConfig,
    development: bool,
}

impl Network {
    /// Name of the network.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chain id of the network.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Whether this is a local development chain.
    #[must_use]
    pub fn is_development(&self) -> bool {
        self.development
    }

    /// Blocks to wait after a deployment.
    #[must_use]
    pub fn confirmations(&self) -> u64 {
        self.config.confirmations.unwrap_or(DEFAULT_CONFIRMATIONS)
    }

    /// Whether the chain returns revert data.
    #[must_use]
    pub fn revert_data(&self) -> bool {
        self.config.revert_data
    }

    /// A fresh ledger behaving like this network.
    #[must_use]
    pub fn ledger(&self) -> Ledger {
        Ledger::new(self.chain_id()).with_revert_data(self.revert_data())
    }
}
