//! Record of what has been deployed on a network.
use std::{collections::BTreeMap, fs, path::Path};

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::error::DeployError;

/// One named deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Address users interact with. For proxied deployments, the proxy.
    pub address: Address,
    /// Implementation behind the proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implementation: Option<Address>,
    /// `ProxyAdmin` of the proxy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Address>,
    /// Block the deployment was mined in.
    pub block_number: u64,
}

/// Deployments by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Deployments(BTreeMap<String, Deployment>);

impl Deployments {
    /// The deployment recorded as `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Deployment> {
        self.0.get(name)
    }

    /// The deployment recorded as `name`.
    ///
    /// # Errors
    ///
    /// * [`DeployError::MissingDeployment`] - If nothing is recorded.
    pub fn require(&self, name: &str) -> Result<&Deployment, DeployError> {
        self.get(name).ok_or_else(|| DeployError::MissingDeployment(name.to_owned()))
    }

    /// Records `deployment` as `name`, replacing any earlier record.
    pub fn insert(&mut self, name: impl Into<String>, deployment: Deployment) {
        self.0.insert(name.into(), deployment);
    }

    /// Number of recorded deployments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Deployments sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Deployment)> {
        self.0.iter().map(|(name, deployment)| (name.as_str(), deployment))
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// * [`DeployError::Json`] - If serialization fails.
    pub fn to_json(&self) -> Result<String, DeployError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the record to `path` as JSON.
    ///
    /// # Errors
    ///
    /// * [`DeployError::Json`] - If serialization fails.
    /// * [`DeployError::Io`] - If the file cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), DeployError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
