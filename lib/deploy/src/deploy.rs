//! Deployment descriptors and the orchestrator that runs them.
use std::{fmt, sync::Arc};

use alloy_primitives::{Address, Bytes};
use alloy_sol_types::{SolCall, SolValue};
use playground_contracts::{
    proxy::{
        erc1967::{get_admin_address, get_implementation_address},
        transparent::{constructor_args, IProxyAdmin, TransparentUpgradeableProxy},
    },
    vm::{Contract, Ledger, Receipt},
};

use crate::{
    config::{NamedAccounts, Network},
    deployments::{Deployment, Deployments},
    error::DeployError,
    verify::{verify_deployment, Verifier},
};

/// How the constructor parameters of a deployment are obtained.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConstructorArgs {
    /// The constructor takes no parameters.
    Empty,
    /// Already ABI-encoded parameters.
    Encoded(Bytes),
    /// The deployer's address.
    Deployer,
    /// The address of an earlier deployment, by name.
    AddressOf(String),
}

impl ConstructorArgs {
    fn resolve(
        &self,
        accounts: &NamedAccounts,
        deployments: &Deployments,
    ) -> Result<Vec<u8>, DeployError> {
        Ok(match self {
            ConstructorArgs::Empty => Vec::new(),
            ConstructorArgs::Encoded(args) => args.to_vec(),
            ConstructorArgs::Deployer => accounts.deployer.abi_encode(),
            ConstructorArgs::AddressOf(name) => deployments.require(name)?.address.abi_encode(),
        })
    }
}

/// Call run through the proxy right after it is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Initializer {
    /// Solidity signature of the method, e.g. `initalValue(uint256)`.
    pub method: &'static str,
    /// ABI-encoded call.
    pub calldata: Bytes,
}

impl Initializer {
    /// Initializer running `call`.
    pub fn new<C: SolCall>(call: &C) -> Self {
        Self { method: C::SIGNATURE, calldata: call.abi_encode().into() }
    }
}

/// Kind of proxy placed in front of an implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProxyKind {
    /// [`TransparentUpgradeableProxy`] with its own `ProxyAdmin`.
    #[default]
    Transparent,
}

/// Proxy settings of a deployment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Kind of proxy.
    pub kind: ProxyKind,
    /// Call run through the proxy once it exists.
    pub initializer: Option<Initializer>,
    /// Owner of the proxy admin. Defaults to the deployer.
    pub owner: Option<Address>,
    /// Name the implementation is recorded under. Defaults to
    /// `<name>_Implementation`. An implementation already recorded under
    /// that name is reused.
    pub implementation: Option<String>,
}

/// A named, tagged deployment.
#[derive(Clone)]
pub struct DeploymentDescriptor {
    /// Name the deployment is recorded under.
    pub name: String,
    /// Code to deploy.
    pub code: Arc<dyn Contract>,
    /// Constructor parameters.
    pub constructor_args: ConstructorArgs,
    /// Set when the code is deployed behind a proxy.
    pub proxy: Option<ProxyConfig>,
    /// Tags that must be deployed first.
    pub dependencies: Vec<String>,
    /// Tags selecting this deployment.
    pub tags: Vec<String>,
    /// Key of the deployment in the network address table.
    pub address_key: Option<String>,
}

impl fmt::Debug for DeploymentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeploymentDescriptor")
            .field("name", &self.name)
            .field("code", &self.code.name())
            .field("constructor_args", &self.constructor_args)
            .field("proxy", &self.proxy)
            .field("dependencies", &self.dependencies)
            .field("tags", &self.tags)
            .field("address_key", &self.address_key)
            .finish()
    }
}

impl DeploymentDescriptor {
    /// Deployment of `code` recorded as `name`, without parameters or tags.
    pub fn new<C>(name: impl Into<String>, code: C) -> Self
    where
        C: Contract + 'static,
    {
        Self {
            name: name.into(),
            code: Arc::new(code),
            constructor_args: ConstructorArgs::Empty,
            proxy: None,
            dependencies: Vec::new(),
            tags: Vec::new(),
            address_key: None,
        }
    }

    /// Sets the constructor parameters.
    #[must_use]
    pub fn with_args(mut self, args: ConstructorArgs) -> Self {
        self.constructor_args = args;
        self
    }

    /// Deploys the code behind a proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Adds tags that must be deployed first.
    #[must_use]
    pub fn depends_on(mut self, tags: &[&str]) -> Self {
        self.dependencies.extend(tags.iter().map(ToString::to_string));
        self
    }

    /// Adds tags selecting this deployment.
    #[must_use]
    pub fn tagged(mut self, tags: &[&str]) -> Self {
        self.tags.extend(tags.iter().map(ToString::to_string));
        self
    }

    /// Sets the key of this deployment in the address table.
    #[must_use]
    pub fn listed_as(mut self, key: impl Into<String>) -> Self {
        self.address_key = Some(key.into());
        self
    }

    /// Whether `tag` selects this deployment.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Orders the deployments selected by `tags` after their dependencies.
///
/// No tags selects every script. Scripts keep their registry order unless a
/// dependency moves them.
///
/// # Errors
///
/// * [`DeployError::UnknownTag`] - If a tag selects no script.
/// * [`DeployError::UnknownDependency`] - If a dependency names a tag no
///   script carries.
/// * [`DeployError::DependencyCycle`] - If scripts depend on each other.
pub fn plan<'a, S: AsRef<str>>(
    scripts: &'a [DeploymentDescriptor],
    tags: &[S],
) -> Result<Vec<&'a DeploymentDescriptor>, DeployError> {
    let mut roots = Vec::new();
    if tags.is_empty() {
        roots.extend(0..scripts.len());
    }
    for tag in tags {
        let tag = tag.as_ref();
        let selected = tagged(scripts, tag);
        if selected.is_empty() {
            return Err(DeployError::UnknownTag(tag.to_owned()));
        }
        roots.extend(selected);
    }

    let mut marks = vec![Mark::Unvisited; scripts.len()];
    let mut order = Vec::new();
    for root in roots {
        visit(scripts, root, &mut marks, &mut order)?;
    }
    Ok(order.into_iter().map(|index| &scripts[index]).collect())
}

fn tagged(scripts: &[DeploymentDescriptor], tag: &str) -> Vec<usize> {
    scripts
        .iter()
        .enumerate()
        .filter(|(_, script)| script.has_tag(tag))
        .map(|(index, _)| index)
        .collect()
}

fn visit(
    scripts: &[DeploymentDescriptor],
    index: usize,
    marks: &mut [Mark],
    order: &mut Vec<usize>,
) -> Result<(), DeployError> {
    let script = &scripts[index];
    match marks[index] {
        Mark::Done => return Ok(()),
        Mark::Visiting => return Err(DeployError::DependencyCycle(script.name.clone())),
        Mark::Unvisited => {}
    }

    marks[index] = Mark::Visiting;
    for dependency in &script.dependencies {
        let providers = tagged(scripts, dependency);
        if providers.is_empty() {
            return Err(DeployError::UnknownDependency {
                name: script.name.clone(),
                dependency: dependency.clone(),
            });
        }
        for provider in providers {
            visit(scripts, provider, marks, order)?;
        }
    }
    marks[index] = Mark::Done;
    order.push(index);
    Ok(())
}

/// Runs deployments against the ledger of one network.
pub struct Deployer<V> {
    network: Network,
    accounts: NamedAccounts,
    ledger: Ledger,
    verifier: V,
    deployments: Deployments,
}

impl<V> fmt::Debug for Deployer<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field("network", &self.network)
            .field("accounts", &self.accounts)
            .field("ledger", &self.ledger)
            .field("deployments", &self.deployments)
            .finish_non_exhaustive()
    }
}

impl<V: Verifier> Deployer<V> {
    /// Deployer for `network`, on a fresh ledger behaving like it.
    pub fn new(network: Network, accounts: NamedAccounts, verifier: V) -> Self {
        let ledger = network.ledger();
        Self { network, accounts, ledger, verifier, deployments: Deployments::default() }
    }

    /// Network deployed to.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Accounts deployed from.
    pub fn accounts(&self) -> &NamedAccounts {
        &self.accounts
    }

    /// Ledger deployed to.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Ledger deployed to, for interacting with the deployments.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Verifier deployments are submitted to.
    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// What has been deployed so far.
    pub fn deployments(&self) -> &Deployments {
        &self.deployments
    }

    /// Deploys `descriptor`, or returns the existing deployment of the same
    /// name.
    ///
    /// Proxied deployments record the implementation as well, under
    /// [`ProxyConfig::implementation`].
    ///
    /// # Errors
    ///
    /// * [`DeployError::MissingDeployment`] - If the constructor parameters
    ///   refer to a deployment that does not exist.
    /// * [`DeployError::Reverted`] - If a constructor or the initializer
    ///   reverts.
    pub async fn deploy(
        &mut self,
        descriptor: &DeploymentDescriptor,
    ) -> Result<Deployment, DeployError> {
        if let Some(existing) = self.deployments.get(&descriptor.name) {
            tracing::info!(
                name = %descriptor.name,
                address = %existing.address,
                "reusing deployment"
            );
            return Ok(existing.clone());
        }

        tracing::info!(
            name = %descriptor.name,
            network = self.network.name(),
            "deploying and waiting for confirmations"
        );
        let args = descriptor.constructor_args.resolve(&self.accounts, &self.deployments)?;
        let deployment = match &descriptor.proxy {
            None => self.deploy_contract(&descriptor.name, descriptor.code.clone(), &args).await?,
            Some(proxy) => self.deploy_proxied(descriptor, proxy, &args).await?,
        };

        tracing::info!(
            name = %descriptor.name,
            address = %deployment.address,
            block = deployment.block_number,
            "deployed"
        );
        self.deployments.insert(descriptor.name.clone(), deployment.clone());
        Ok(deployment)
    }

    async fn deploy_proxied(
        &mut self,
        descriptor: &DeploymentDescriptor,
        proxy: &ProxyConfig,
        args: &[u8],
    ) -> Result<Deployment, DeployError> {
        let implementation_name = proxy
            .implementation
            .clone()
            .unwrap_or_else(|| format!("{}_Implementation", descriptor.name));
        let implementation = match self.deployments.get(&implementation_name) {
            Some(existing) => existing.clone(),
            None => {
                let implementation = self
                    .deploy_contract(&implementation_name, descriptor.code.clone(), args)
                    .await?;
                self.deployments.insert(implementation_name, implementation.clone());
                implementation
            }
        };

        let owner = proxy.owner.unwrap_or(self.accounts.deployer);
        let data = match &proxy.initializer {
            Some(initializer) => {
                tracing::debug!(method = initializer.method, "initializing through the proxy");
                initializer.calldata.clone()
            }
            None => Bytes::new(),
        };
        let code: Arc<dyn Contract> = match proxy.kind {
            ProxyKind::Transparent => Arc::new(TransparentUpgradeableProxy),
        };
        let proxy_args = constructor_args(implementation.address, owner, &data);
        let deployed = self.deploy_contract(&descriptor.name, code, &proxy_args).await?;

        Ok(Deployment {
            implementation: Some(implementation.address),
            admin: Some(get_admin_address(&self.ledger, deployed.address)),
            ..deployed
        })
    }

    async fn deploy_contract(
        &mut self,
        name: &str,
        code: Arc<dyn Contract>,
        args: &[u8],
    ) -> Result<Deployment, DeployError> {
        let receipt = self
            .ledger
            .deploy_code(self.accounts.deployer, code, args)
            .map_err(|source| DeployError::Reverted { name: name.to_owned(), source })?;
        let address = created(name, &receipt)?;

        self.wait_for_confirmations(receipt.block_number);
        verify_deployment(&self.verifier, &self.network, address, args).await;

        Ok(Deployment {
            address,
            implementation: None,
            admin: None,
            block_number: receipt.block_number,
        })
    }

    /// Points the proxy deployed as `proxy` to `implementation`, deploying
    /// the implementation first unless it already exists.
    ///
    /// The upgrade goes through the proxy's `ProxyAdmin`, sent by the
    /// deployer. `call`, when set, runs through the proxy in the same
    /// transaction.
    ///
    /// # Errors
    ///
    /// * [`DeployError::MissingDeployment`] - If `proxy` was not deployed.
    /// * [`DeployError::Reverted`] - If the implementation cannot be deployed
    ///   or the upgrade reverts. The proxy is left unchanged.
    pub async fn upgrade_proxy(
        &mut self,
        proxy: &str,
        implementation: &DeploymentDescriptor,
        call: Option<&Initializer>,
    ) -> Result<Deployment, DeployError> {
        let record = self.deployments.require(proxy)?.clone();
        let new_implementation = self.deploy(implementation).await?;

        let admin = get_admin_address(&self.ledger, record.address);
        let upgrade = IProxyAdmin::upgradeAndCallCall {
            proxy: record.address,
            implementation: new_implementation.address,
            data: call.map(|call| call.calldata.clone()).unwrap_or_default(),
        };
        let receipt = self
            .ledger
            .transact(self.accounts.deployer, admin, &upgrade.abi_encode())
            .map_err(|source| DeployError::Reverted { name: proxy.to_owned(), source })?;
        self.wait_for_confirmations(receipt.block_number);

        let upgraded = Deployment {
            implementation: Some(get_implementation_address(&self.ledger, record.address)),
            admin: Some(admin),
            ..record
        };
        tracing::info!(
            proxy,
            implementation = %new_implementation.address,
            %admin,
            "upgraded"
        );
        self.deployments.insert(proxy, upgraded.clone());
        Ok(upgraded)
    }

    /// Deploys every script selected by `tags`, dependencies first.
    ///
    /// Returns the names of the selected deployments in the order they ran.
    ///
    /// # Errors
    ///
    /// * See [`plan`] and [`Deployer::deploy`].
    pub async fn run_tags<S: AsRef<str>>(
        &mut self,
        scripts: &[DeploymentDescriptor],
        tags: &[S],
    ) -> Result<Vec<String>, DeployError> {
        let mut names = Vec::new();
        for script in plan(scripts, tags)? {
            self.deploy(script).await?;
            names.push(script.name.clone());
        }
        Ok(names)
    }

    /// Mines until the block of a receipt has the network's number of
    /// confirmations on top of it.
    ///
    /// Returns the current block number.
    pub fn wait_for_confirmations(&mut self, receipt_block: u64) -> u64 {
        let target = receipt_block.saturating_add(self.network.confirmations());
        let current = self.ledger.block_number();
        if current < target {
            self.ledger.mine(target - current);
        }
        tracing::debug!(
            receipt_block,
            confirmations = self.network.confirmations(),
            block = self.ledger.block_number(),
            "confirmed"
        );
        self.ledger.block_number()
    }
}

fn created(name: &str, receipt: &Receipt) -> Result<Address, DeployError> {
    receipt
        .contract_address
        .ok_or_else(|| DeployError::MissingDeployment(name.to_owned()))
}
