//! Deploy tooling for the upgrade playground.
//!
//! Networks, named accounts and the address table come from a TOML file (see
//! [`config`]). A [`Deployer`] runs tagged [`DeploymentDescriptor`]s against a
//! ledger that behaves like the selected network, waiting for the network's
//! confirmations and submitting each contract to a [`Verifier`].
//!
//! ```
//! use playground_deploy::{scripts, Config, Deployer, NoopVerifier};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), playground_deploy::DeployError> {
//! let config = Config::from_toml_str(
//!     r#"
//!     [accounts]
//!     deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
//!     assistant = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
//!     "#,
//! )?;
//! let network = config.network("hardhat")?;
//! let mut deployer = Deployer::new(network, config.accounts, NoopVerifier);
//!
//! let deployed = deployer.run_tags(&scripts::registry(), &["basics"]).await?;
//! assert_eq!(deployed, ["EVMCompatibilityTest", "BasicStorage", "Chatterbox"]);
//! # Ok(())
//! # }
//! ```
#![allow(clippy::module_name_repetitions)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod assertions;
pub mod config;
pub mod deploy;
pub mod deployments;
pub mod error;
pub mod scripts;
pub mod verify;

pub use assertions::{ErrorExt, Expect, RevertExt};
pub use config::{AddressTable, Config, NamedAccounts, Network, NetworkConfig};
pub use deploy::{
    ConstructorArgs, Deployer, DeploymentDescriptor, Initializer, ProxyConfig, ProxyKind,
};
pub use deployments::{Deployment, Deployments};
pub use error::{ConfigError, DeployError, VerifyError};
pub use verify::{InMemoryVerifier, NoopVerifier, VerificationStatus, Verifier};
