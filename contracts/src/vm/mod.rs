//! In-memory execution host for the playground contracts.
//!
//! A [`Ledger`] keeps accounts, their slot-addressed storage, nonces and
//! emitted logs. Contracts are native Rust objects implementing [`Contract`];
//! they only ever see the ledger through a [`Context`], which exposes the same
//! primitives a contract has on-chain: storage of the executing address,
//! `msg.sender`, the current [`Block`], logs, message calls, delegated calls
//! and contract creation.
//!
//! Every [`Ledger::transact`] and [`Ledger::deploy`] is one automined block.
//! A transaction either commits every state change it made or none of them.
use std::{collections::HashMap, fmt, sync::Arc};

use alloy_primitives::{keccak256, Address, Bytes, Log, B256, U256};
use alloy_sol_types::{Panic, Revert, SolError, SolEvent, SolInterface};

pub mod storage;

/// Chain id of a [`Ledger`] created with [`Ledger::default`].
pub const DEFAULT_CHAIN_ID: u64 = 31337;

/// Maximum nesting of message and delegated calls.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Timestamp of block zero.
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;

/// Seconds between two consecutive blocks.
pub const BLOCK_TIME: u64 = 12;

/// Block a transaction executes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
    /// Chain id of the ledger.
    pub chain_id: u64,
    /// Block number.
    pub number: u64,
    /// Block timestamp, in seconds.
    pub timestamp: u64,
}

/// Return data of a successful call, or revert data of a failed one.
pub type CallResult = Result<Vec<u8>, Vec<u8>>;

/// Code that can be deployed to a [`Ledger`].
///
/// Implementations hold no state of their own: everything persistent lives in
/// the storage of the address the code executes for, which is
/// [`Context::address`]. This is what makes delegated execution possible.
pub trait Contract: Send + Sync {
    /// Human readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Runs once when the code is deployed.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Execution context of the new account.
    /// * `args` - ABI-encoded constructor parameters.
    ///
    /// # Errors
    ///
    /// * ABI-encoded revert data, which aborts the deployment.
    fn constructor(
        &self,
        _ctx: &mut Context<'_>,
        _args: &[u8],
    ) -> Result<(), Vec<u8>> {
        Ok(())
    }

    /// Handles a call to the contract.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Execution context of the call.
    /// * `calldata` - ABI-encoded selector and parameters.
    ///
    /// # Errors
    ///
    /// * ABI-encoded revert data. Unknown selectors revert with empty data.
    fn call(&self, ctx: &mut Context<'_>, calldata: &[u8]) -> CallResult;
}

#[derive(Clone, Default)]
struct Account {
    nonce: u64,
    code: Option<Arc<dyn Contract>>,
    storage: HashMap<U256, U256>,
}

#[derive(Clone, Default)]
struct State {
    accounts: HashMap<Address, Account>,
    logs: Vec<Log>,
}

impl State {
    fn code(&self, account: Address) -> Option<Arc<dyn Contract>> {
        self.accounts.get(&account).and_then(|a| a.code.clone())
    }

    fn nonce(&self, account: Address) -> u64 {
        self.accounts.get(&account).map_or(0, |a| a.nonce)
    }

    fn bump_nonce(&mut self, account: Address) {
        self.accounts.entry(account).or_default().nonce += 1;
    }

    fn sload(&self, account: Address, slot: U256) -> U256 {
        self.accounts
            .get(&account)
            .and_then(|a| a.storage.get(&slot).copied())
            .unwrap_or_default()
    }

    /// Installs `code` at `address` and runs its constructor.
    fn create(
        &mut self,
        creator: Address,
        address: Address,
        code: Arc<dyn Contract>,
        args: &[u8],
        block: Block,
        depth: usize,
    ) -> Result<(), Vec<u8>> {
        if self.code(address).is_some() {
            return Err(revert_reason("create collision"));
        }

        let account = self.accounts.entry(address).or_default();
        // EIP-161: contract accounts start with nonce 1.
        account.nonce = 1;
        account.code = Some(Arc::clone(&code));

        let mut ctx = Context {
            state: self,
            address,
            code_address: address,
            msg_sender: creator,
            block,
            depth,
        };
        code.constructor(&mut ctx, args)
    }
}

/// Execution context handed to a [`Contract`].
///
/// `address` is the account whose storage is read and written, while
/// `code_address` is the account whose code is running. They differ only
/// inside a delegated call.
pub struct Context<'a> {
    state: &'a mut State,
    address: Address,
    code_address: Address,
    msg_sender: Address,
    block: Block,
    depth: usize,
}

impl Context<'_> {
    /// Address whose storage this execution operates on.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// Address whose code is executing.
    #[must_use]
    pub fn code_address(&self) -> Address {
        self.code_address
    }

    /// Immediate caller of this execution frame.
    #[must_use]
    pub fn msg_sender(&self) -> Address {
        self.msg_sender
    }

    /// Block this execution is part of.
    #[must_use]
    pub fn block(&self) -> Block {
        self.block
    }

    /// Reads a storage slot of [`Context::address`].
    #[must_use]
    pub fn sload(&self, slot: U256) -> U256 {
        self.state.sload(self.address, slot)
    }

    /// Writes a storage slot of [`Context::address`].
    pub fn sstore(&mut self, slot: U256, value: U256) {
        let storage = &mut self.state.accounts.entry(self.address).or_default().storage;
        if value.is_zero() {
            storage.remove(&slot);
        } else {
            storage.insert(slot, value);
        }
    }

    /// Whether `account` holds code.
    #[must_use]
    pub fn has_code(&self, account: Address) -> bool {
        self.state.code(account).is_some()
    }

    /// Emits `event` as a log of [`Context::address`].
    pub fn emit<E: SolEvent>(&mut self, event: &E) {
        self.state.logs.push(Log { address: self.address, data: event.encode_log_data() });
    }

    /// Performs a message call to `to`, with this frame's address as the
    /// sender. Calling an account without code succeeds with no return data.
    ///
    /// # Errors
    ///
    /// * Revert data of the callee. State changes of the callee are undone.
    pub fn call(&mut self, to: Address, calldata: &[u8]) -> CallResult {
        let Some(code) = self.state.code(to) else {
            return Ok(Vec::new());
        };
        let sender = self.address;
        self.enter(&code, to, to, sender, calldata)
    }

    /// Executes the code of `code_address` against this frame's storage,
    /// keeping the current `msg.sender`.
    ///
    /// # Errors
    ///
    /// * Revert data of the delegated code. Its state changes are undone.
    pub fn delegate_call(
        &mut self,
        code_address: Address,
        calldata: &[u8],
    ) -> CallResult {
        let Some(code) = self.state.code(code_address) else {
            return Ok(Vec::new());
        };
        let (address, sender) = (self.address, self.msg_sender);
        self.enter(&code, address, code_address, sender, calldata)
    }

    /// Deploys `code` from this frame's address, CREATE style: the new
    /// address is derived from the creator and its nonce.
    ///
    /// # Errors
    ///
    /// * Revert data of the constructor.
    pub fn create(
        &mut self,
        code: Arc<dyn Contract>,
        args: &[u8],
    ) -> Result<Address, Vec<u8>> {
        if self.depth + 1 >= MAX_CALL_DEPTH {
            return Err(revert_reason("call depth exceeded"));
        }

        let creator = self.address;
        let address = creator.create(self.state.nonce(creator));
        self.install(creator, address, code, args)
    }

    /// Deploys `code` from this frame's address, CREATE2 style: the new
    /// address only depends on the creator, `salt` and [`init_code_hash`].
    ///
    /// # Errors
    ///
    /// * Revert data of the constructor.
    /// * `create collision` - If the address already holds code.
    pub fn create2(
        &mut self,
        code: Arc<dyn Contract>,
        salt: B256,
        args: &[u8],
    ) -> Result<Address, Vec<u8>> {
        if self.depth + 1 >= MAX_CALL_DEPTH {
            return Err(revert_reason("call depth exceeded"));
        }

        let creator = self.address;
        let address = creator.create2(salt, init_code_hash(code.as_ref(), args));
        self.install(creator, address, code, args)
    }

    fn install(
        &mut self,
        creator: Address,
        address: Address,
        code: Arc<dyn Contract>,
        args: &[u8],
    ) -> Result<Address, Vec<u8>> {
        self.state.bump_nonce(creator);

        let checkpoint = self.state.clone();
        match self.state.create(creator, address, code, args, self.block, self.depth + 1) {
            Ok(()) => Ok(address),
            Err(data) => {
                *self.state = checkpoint;
                Err(data)
            }
        }
    }

    fn enter(
        &mut self,
        code: &Arc<dyn Contract>,
        address: Address,
        code_address: Address,
        msg_sender: Address,
        calldata: &[u8],
    ) -> CallResult {
        if self.depth + 1 >= MAX_CALL_DEPTH {
            return Err(revert_reason("call depth exceeded"));
        }

        let checkpoint = self.state.clone();
        let mut frame = Context {
            state: &mut *self.state,
            address,
            code_address,
            msg_sender,
            block: self.block,
            depth: self.depth + 1,
        };
        let result = code.call(&mut frame, calldata);
        if result.is_err() {
            *self.state = checkpoint;
        }
        result
    }
}

/// Outcome of a committed transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Sender of the transaction.
    pub from: Address,
    /// Recipient, `None` for deployments.
    pub to: Option<Address>,
    /// Address of the created contract, for deployments.
    pub contract_address: Option<Address>,
    /// Return data of the call.
    pub output: Bytes,
    /// Logs emitted by the transaction, in order.
    pub logs: Vec<Log>,
}

impl Receipt {
    /// Whether the transaction emitted `expected`.
    #[must_use]
    pub fn emits<E>(&self, expected: &E) -> bool
    where
        E: SolEvent + PartialEq,
    {
        self.decoded::<E>().any(|event| &event == expected)
    }

    /// Iterates over the logs that decode as `E`.
    pub fn decoded<E: SolEvent>(&self) -> impl Iterator<Item = E> + '_ {
        self.logs.iter().filter_map(|log| E::decode_log_data(&log.data).ok())
    }
}

/// A transaction or call that reverted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reverted {
    /// ABI-encoded revert data. Empty when the contract reverted without
    /// reason, or when the ledger does not echo revert data.
    pub data: Bytes,
}

impl Reverted {
    /// Decodes the revert data as the custom error `E`.
    #[must_use]
    pub fn decode<E: SolError>(&self) -> Option<E> {
        E::abi_decode(&self.data).ok()
    }

    /// Solidity panic code, if the revert is a `Panic(uint256)`.
    #[must_use]
    pub fn panic_code(&self) -> Option<U256> {
        self.decode::<Panic>().map(|panic| panic.code)
    }

    /// Reason string, if the revert is an `Error(string)`.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.decode::<Revert>().map(|revert| revert.reason)
    }

    /// Whether the revert carries no data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Display for Reverted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.data.is_empty() {
            f.write_str("execution reverted")
        } else {
            write!(f, "execution reverted: {}", self.data)
        }
    }
}

impl std::error::Error for Reverted {}

/// Single-threaded, automining ledger.
pub struct Ledger {
    state: State,
    chain_id: u64,
    block_number: u64,
    revert_data: bool,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_CHAIN_ID)
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("chain_id", &self.chain_id)
            .field("block_number", &self.block_number)
            .field("accounts", &self.state.accounts.len())
            .field("revert_data", &self.revert_data)
            .finish_non_exhaustive()
    }
}

impl Ledger {
    /// Creates an empty ledger for `chain_id`, at block zero.
    #[must_use]
    pub fn new(chain_id: u64) -> Self {
        Self { state: State::default(), chain_id, block_number: 0, revert_data: true }
    }

    /// Sets whether reverts surface their data.
    ///
    /// Some EVM-compatible chains do not return structured revert data to
    /// the caller; with `echo` set to `false` every revert surfaces with empty
    /// data, the way such a chain would report it.
    #[must_use]
    pub fn with_revert_data(mut self, echo: bool) -> Self {
        self.revert_data = echo;
        self
    }

    /// Chain id of this ledger.
    #[must_use]
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Number of the latest mined block.
    #[must_use]
    pub fn block_number(&self) -> u64 {
        self.block_number
    }

    /// Mines `blocks` empty blocks.
    pub fn mine(&mut self, blocks: u64) {
        self.block_number = self.block_number.saturating_add(blocks);
    }

    /// Latest mined block.
    #[must_use]
    pub fn block(&self) -> Block {
        let elapsed = self.block_number.saturating_mul(BLOCK_TIME);
        Block {
            chain_id: self.chain_id,
            number: self.block_number,
            timestamp: GENESIS_TIMESTAMP.saturating_add(elapsed),
        }
    }

    /// Transaction count of `account`.
    #[must_use]
    pub fn nonce(&self, account: Address) -> u64 {
        self.state.nonce(account)
    }

    /// Whether `account` holds code.
    #[must_use]
    pub fn has_code(&self, account: Address) -> bool {
        self.state.code(account).is_some()
    }

    /// Raw storage read, the equivalent of `eth_getStorageAt`.
    #[must_use]
    pub fn storage_at(&self, account: Address, slot: U256) -> U256 {
        self.state.sload(account, slot)
    }

    /// Overwrites a storage slot outside of any transaction, the way a
    /// development node's `setStorageAt` does.
    pub fn set_storage_at(&mut self, account: Address, slot: U256, value: U256) {
        let storage = &mut self.state.accounts.entry(account).or_default().storage;
        if value.is_zero() {
            storage.remove(&slot);
        } else {
            storage.insert(slot, value);
        }
    }

    /// Every log emitted since genesis.
    #[must_use]
    pub fn logs(&self) -> &[Log] {
        &self.state.logs
    }

    /// Deploys `code` from `from`. The address is derived from `from` and its
    /// nonce.
    ///
    /// # Errors
    ///
    /// * [`Reverted`] - If the constructor reverts. No account is created,
    ///   but the sender's nonce is consumed.
    pub fn deploy<C>(
        &mut self,
        from: Address,
        code: C,
        args: &[u8],
    ) -> Result<Receipt, Reverted>
    where
        C: Contract + 'static,
    {
        self.deploy_code(from, Arc::new(code), args)
    }

    /// Same as [`Ledger::deploy`], for code that is already shared.
    ///
    /// # Errors
    ///
    /// * [`Reverted`] - If the constructor reverts.
    pub fn deploy_code(
        &mut self,
        from: Address,
        code: Arc<dyn Contract>,
        args: &[u8],
    ) -> Result<Receipt, Reverted> {
        let address = from.create(self.state.nonce(from));
        let name = code.name();
        let receipt = self.execute(from, None, |state, block| {
            state.create(from, address, code, args, block, 0)?;
            Ok((Some(address), Vec::new()))
        })?;
        tracing::debug!(contract = name, %address, block = receipt.block_number, "deployed");
        Ok(receipt)
    }

    /// Sends a transaction from `from` to `to`.
    ///
    /// # Errors
    ///
    /// * [`Reverted`] - If execution reverts. Every state change is undone,
    ///   but the block is mined and the sender's nonce is consumed.
    pub fn transact(
        &mut self,
        from: Address,
        to: Address,
        calldata: &[u8],
    ) -> Result<Receipt, Reverted> {
        self.execute(from, Some(to), |state, block| {
            let output = run(state, block, from, to, calldata)?;
            Ok((None, output))
        })
    }

    /// Executes a call against the latest block without committing anything.
    ///
    /// # Errors
    ///
    /// * [`Reverted`] - If execution reverts.
    pub fn call(
        &self,
        from: Address,
        to: Address,
        calldata: &[u8],
    ) -> Result<Bytes, Reverted> {
        let mut scratch = self.state.clone();
        run(&mut scratch, self.block(), from, to, calldata)
            .map(Bytes::from)
            .map_err(|data| self.reverted(data))
    }

    fn execute<F>(
        &mut self,
        from: Address,
        to: Option<Address>,
        f: F,
    ) -> Result<Receipt, Reverted>
    where
        F: FnOnce(&mut State, Block) -> Result<(Option<Address>, Vec<u8>), Vec<u8>>,
    {
        let checkpoint = self.state.clone();
        let first_log = self.state.logs.len();
        self.mine(1);
        let block = self.block();

        let result = f(&mut self.state, block);
        if result.is_err() {
            self.state = checkpoint;
        }
        self.state.bump_nonce(from);

        let (contract_address, output) = result.map_err(|data| self.reverted(data))?;
        Ok(Receipt {
            block_number: self.block_number,
            from,
            to,
            contract_address,
            output: output.into(),
            logs: self.state.logs[first_log..].to_vec(),
        })
    }

    fn reverted(&self, data: Vec<u8>) -> Reverted {
        if self.revert_data {
            Reverted { data: data.into() }
        } else {
            Reverted { data: Bytes::new() }
        }
    }
}

/// ABI-encodes `reason` as an `Error(string)` revert.
#[must_use]
pub fn revert_reason(reason: &str) -> Vec<u8> {
    Revert { reason: reason.to_owned() }.abi_encode()
}

/// Hash standing in for the init code of a CREATE2 deployment.
///
/// Native contracts have no bytecode, so the init code is the contract name
/// followed by the ABI-encoded constructor arguments.
#[must_use]
pub fn init_code_hash(code: &dyn Contract, args: &[u8]) -> B256 {
    keccak256([code.name().as_bytes(), args].concat())
}

/// Decodes `calldata` as a call of the interface `I`.
///
/// Returns `None` when the selector is not part of `I`, so that a contract
/// can try the interfaces it inherits one after another. A known selector
/// with malformed arguments decodes to empty revert data.
pub fn decode_call<I: SolInterface>(
    calldata: &[u8],
) -> Option<Result<I, Vec<u8>>> {
    let selector: [u8; 4] = calldata.get(..4)?.try_into().ok()?;
    if !I::valid_selector(selector) {
        return None;
    }
    Some(I::abi_decode(calldata).map_err(|_| Vec::new()))
}

fn run(
    state: &mut State,
    block: Block,
    from: Address,
    to: Address,
    calldata: &[u8],
) -> CallResult {
    let Some(code) = state.code(to) else {
        return Ok(Vec::new());
    };
    let mut ctx =
        Context { state, address: to, code_address: to, msg_sender: from, block, depth: 0 };
    code.call(&mut ctx, calldata)
}
