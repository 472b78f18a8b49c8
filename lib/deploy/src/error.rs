//! Errors of the deploy library.
use std::path::PathBuf;

use playground_contracts::vm::Reverted;

/// Errors raised while loading or querying the network configuration.
///
/// These are raised before anything is sent to a ledger.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read `{}`: {source}", path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML or misses required fields.
    #[error("invalid network configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// The network is neither configured nor a development chain.
    #[error("unknown network `{0}`")]
    UnknownNetwork(String),
    /// A named account needed by a scenario is not configured.
    #[error("no `{0}` account configured, add it under `[accounts]`")]
    MissingAccount(String),
    /// The address table has no usable entry for the contract.
    #[error("no `{key}` address configured for network `{network}`")]
    MissingAddress {
        /// Network the lookup was made for.
        network: String,
        /// Contract key in the address table.
        key: String,
    },
    /// The address table entry is not a 20-byte hex address.
    #[error("`{key}` address for network `{network}` is malformed: `{value}`")]
    InvalidAddress {
        /// Network the lookup was made for.
        network: String,
        /// Contract key in the address table.
        key: String,
        /// The offending entry.
        value: String,
    },
}

/// Errors raised by the deploy orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// A deployment or upgrade transaction reverted.
    #[error("`{name}` reverted: {source}")]
    Reverted {
        /// Deployment the transaction belonged to.
        name: String,
        /// Revert returned by the ledger.
        #[source]
        source: Reverted,
    },
    /// No deploy script carries the requested tag.
    #[error("no deploy script is tagged `{0}`")]
    UnknownTag(String),
    /// A deploy script depends on a tag no script carries.
    #[error("`{name}` depends on `{dependency}`, which no deploy script provides")]
    UnknownDependency {
        /// Script declaring the dependency.
        name: String,
        /// The missing tag.
        dependency: String,
    },
    /// Deploy scripts depend on each other in a loop.
    #[error("dependency cycle through `{0}`")]
    DependencyCycle(String),
    /// A deployment that should already exist was not recorded.
    #[error("`{0}` has not been deployed")]
    MissingDeployment(String),
    /// The deployments record could not be written.
    #[error("failed to write deployments: {0}")]
    Io(#[from] std::io::Error),
    /// The deployments record could not be serialized.
    #[error("failed to serialize deployments: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by a [`crate::verify::Verifier`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// The explorer refused the verification request.
    #[error("verification rejected: {0}")]
    Rejected(String),
    /// The explorer could not be reached.
    #[error("explorer unavailable: {0}")]
    Unavailable(String),
}

impl VerifyError {
    /// Whether the explorer refused because the source is already verified.
    #[must_use]
    pub fn is_already_verified(&self) -> bool {
        match self {
            VerifyError::Rejected(message) => {
                message.to_lowercase().contains("already verified")
            }
            VerifyError::Unavailable(_) => false,
        }
    }
}
