//! Source verification on block explorers.
use std::collections::BTreeMap;

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{config::Network, error::VerifyError};

/// Outcome of a verification attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerificationStatus {
    /// The explorer accepted the source.
    Verified,
    /// The source had been verified before.
    AlreadyVerified,
    /// Nothing was submitted.
    Skipped,
    /// The explorer refused; the deployment is kept regardless.
    Failed,
}

/// Submits deployed contracts to a block explorer.
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Verifies the contract at `address`, deployed with `constructor_args`.
    ///
    /// # Errors
    ///
    /// * [`VerifyError`] - If the explorer refuses or cannot be reached.
    async fn verify(
        &self,
        address: Address,
        constructor_args: &[u8],
    ) -> Result<VerificationStatus, VerifyError>;
}

/// Verifier that never submits anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopVerifier;

#[async_trait]
impl Verifier for NoopVerifier {
    async fn verify(
        &self,
        _address: Address,
        _constructor_args: &[u8],
    ) -> Result<VerificationStatus, VerifyError> {
        Ok(VerificationStatus::Skipped)
    }
}

/// Explorer kept in memory. Each address verifies once; later attempts are
/// refused the way public explorers refuse them.
#[derive(Debug, Default)]
pub struct InMemoryVerifier {
    verified: Mutex<BTreeMap<Address, Bytes>>,
}

impl InMemoryVerifier {
    /// Creates an explorer with nothing verified.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Addresses verified so far, with the constructor arguments they were
    /// verified with.
    pub async fn verified(&self) -> BTreeMap<Address, Bytes> {
        self.verified.lock().await.clone()
    }
}

#[async_trait]
impl Verifier for InMemoryVerifier {
    async fn verify(
        &self,
        address: Address,
        constructor_args: &[u8],
    ) -> Result<VerificationStatus, VerifyError> {
        let mut verified = self.verified.lock().await;
        if verified.contains_key(&address) {
            return Err(VerifyError::Rejected(format!(
                "contract source code already verified: {address}"
            )));
        }
        verified.insert(address, Bytes::copy_from_slice(constructor_args));
        Ok(VerificationStatus::Verified)
    }
}

/// Verifies a deployment on `network`.
///
/// Development chains are skipped. A refusal because the source is already
/// verified counts as success; any other error is logged and reported as
/// [`VerificationStatus::Failed`] without failing the deployment.
pub async fn verify_deployment<V: Verifier + ?Sized>(
    verifier: &V,
    network: &Network,
    address: Address,
    constructor_args: &[u8],
) -> VerificationStatus {
    if network.is_development() {
        return VerificationStatus::Skipped;
    }

    tracing::info!(%address, network = network.name(), "verifying contract");
    match verifier.verify(address, constructor_args).await {
        Ok(status) => status,
        Err(e) if e.is_already_verified() => {
            tracing::info!(%address, "already verified");
            VerificationStatus::AlreadyVerified
        }
        Err(e) => {
            tracing::warn!(%address, error = %e, "verification failed");
            VerificationStatus::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;
    use crate::config::Config;

    const CONFIG: &str = r#"
        [accounts]
        deployer = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        assistant = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

        [networks.sepolia]
        chain_id = 11155111
    "#;

    const CONTRACT: Address = address!("0x5FbDB2315678afecb367f032d93F642f64180aa3");

    struct Offline;

    #[async_trait]
    impl Verifier for Offline {
        async fn verify(
            &self,
            _address: Address,
            _constructor_args: &[u8],
        ) -> Result<VerificationStatus, VerifyError> {
            Err(VerifyError::Unavailable("connection refused".into()))
        }
    }

    fn network(name: &str) -> Network {
        Config::from_toml_str(CONFIG).unwrap().network(name).unwrap()
    }

    #[tokio::test]
    async fn skips_development_chains() {
        let verifier = InMemoryVerifier::new();

        let status = verify_deployment(&verifier, &network("hardhat"), CONTRACT, &[]).await;

        assert_eq!(status, VerificationStatus::Skipped);
        assert!(verifier.verified().await.is_empty());
    }

    #[tokio::test]
    async fn already_verified_counts_as_success() {
        let verifier = InMemoryVerifier::new();
        let sepolia = network("sepolia");

        let first = verify_deployment(&verifier, &sepolia, CONTRACT, &[1, 2]).await;
        let second = verify_deployment(&verifier, &sepolia, CONTRACT, &[1, 2]).await;

        assert_eq!(first, VerificationStatus::Verified);
        assert_eq!(second, VerificationStatus::AlreadyVerified);
        assert_eq!(
            verifier.verified().await.get(&CONTRACT),
            Some(&Bytes::from(vec![1, 2]))
        );
    }

    #[tokio::test]
    async fn other_failures_are_tolerated() {
        let status = verify_deployment(&Offline, &network("sepolia"), CONTRACT, &[]).await;
        assert_eq!(status, VerificationStatus::Failed);
    }

    #[tokio::test]
    async fn noop_verifier_submits_nothing() {
        let status = verify_deployment(&NoopVerifier, &network("sepolia"), CONTRACT, &[]).await;
        assert_eq!(status, VerificationStatus::Skipped);
    }
}
