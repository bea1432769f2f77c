// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// VODA SOUL-BOUND TOKEN (VSTB) - LOCAL CHAIN
//
// In-process, single-node chain that hosts the VSTB contract and its mock
// collaborators (ERC-20, WBNB, pair factory, pair, router).
// - Contracts are native Rust state machines, dispatched by typed calls
// - Every transaction is atomic: any revert restores the pre-call state
// - Cross-contract calls run with the calling contract as msg.sender
// - Native value moves with the call; contract payouts settle afterwards
// - Whole-chain JSON snapshot for persistence between CLI runs
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use vsbt_core::Address;

// U256-backed helpers for pool math
pub mod math;
// Reserve-backed price quotes
pub mod oracle;
// Error types and revert reasons
pub mod error;
// Mock ERC-20 and wrapped native token
pub mod erc20;
// Mock constant-product DEX: factory, pair, router
pub mod dex;
// VSTB: the soul-bound token with referral rewards
pub mod vsbt;

pub use dex::{
    DexEvent, FactoryAction, FactoryQuery, Pair, PairAction, PairFactory, PairQuery, Router,
    seed_stable_pool, RouterAction, RouterQuery, StablePool, MINIMUM_LIQUIDITY,
};
pub use erc20::{Erc20Action, Erc20Event, Erc20Init, Erc20Query, MockErc20, Wbnb, WbnbAction};
pub use error::{ChainError, ContractError};
pub use oracle::{PoolReserves, ReserveSource};
pub use vsbt::{SaleParams, VsbtAction, VsbtContract, VsbtEvent, VsbtInit, VsbtQuery};

/// Timestamp of block 0 (seconds since epoch).
pub const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
/// Seconds added per mined block.
pub const BLOCK_TIME_SECS: u64 = 3;

// ─────────────────────────────────────────────────────────────
// u128 ↔ String serialization for tagged enums
// ─────────────────────────────────────────────────────────────

pub(crate) mod u128_str {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────
// CALL PLUMBING
// ─────────────────────────────────────────────────────────────

/// Execution environment handed to a contract for one call frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// `msg.sender`: an account, or the contract making a nested call
    pub caller: Address,
    /// Address of the contract being executed
    pub this: Address,
    /// Native value attached to this frame (already credited to `this`)
    pub value: u128,
    /// Native balance of `this`, including `value`
    pub balance: u128,
    pub block_number: u64,
    pub timestamp: u64,
}

impl CallContext {
    /// Frame for a nested call made by the current contract.
    pub fn sub_call(&self, to: Address) -> Self {
        Self {
            caller: self.this,
            this: to,
            value: 0,
            balance: 0,
            block_number: self.block_number,
            timestamp: self.timestamp,
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }

    #[cfg(test)]
    pub(crate) fn for_test(caller: Address, this: Address) -> Self {
        Self {
            caller,
            this,
            value: 0,
            balance: 0,
            block_number: 1,
            timestamp: GENESIS_TIMESTAMP,
        }
    }
}

/// Typed return data of a call or query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnValue {
    None,
    Bool(bool),
    Uint(u128),
    Address(Address),
    Addresses(Vec<Address>),
    Text(String),
    Reserves {
        reserve0: u128,
        reserve1: u128,
        block_timestamp_last: u64,
    },
}

impl ReturnValue {
    pub fn as_uint(&self) -> Option<u128> {
        match self {
            ReturnValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ReturnValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            ReturnValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_addresses(&self) -> Option<&[Address]> {
        match self {
            ReturnValue::Addresses(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ReturnValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Event emitted by any hosted contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Vsbt(VsbtEvent),
    Erc20(Erc20Event),
    Dex(DexEvent),
}

impl From<VsbtEvent> for Event {
    fn from(e: VsbtEvent) -> Self {
        Event::Vsbt(e)
    }
}

impl From<Erc20Event> for Event {
    fn from(e: Erc20Event) -> Self {
        Event::Erc20(e)
    }
}

impl From<DexEvent> for Event {
    fn from(e: DexEvent) -> Self {
        Event::Dex(e)
    }
}

/// Event tagged with the emitting contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub address: Address,
    pub event: Event,
}

/// Result of one contract frame before the chain settles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub output: ReturnValue,
    pub events: Vec<Event>,
    /// Native payouts from the contract's balance: (recipient, wei).
    pub payouts: Vec<(Address, u128)>,
}

impl Outcome {
    pub fn new(output: ReturnValue) -> Self {
        Self {
            output,
            events: Vec::new(),
            payouts: Vec::new(),
        }
    }

    pub fn event(mut self, event: impl Into<Event>) -> Self {
        self.events.push(event.into());
        self
    }

    pub fn payout(mut self, to: Address, amount: u128) -> Self {
        self.payouts.push((to, amount));
        self
    }
}

/// State-changing call, addressed by contract interface.
/// `Erc20` calls are accepted by both mock tokens and WBNB.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    Vsbt(VsbtAction),
    Erc20(Erc20Action),
    Wbnb(WbnbAction),
    Factory(FactoryAction),
    Pair(PairAction),
    Router(RouterAction),
}

/// Read-only call. Never mutates state and never advances the block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    Vsbt(VsbtQuery),
    Erc20(Erc20Query),
    Factory(FactoryQuery),
    Pair(PairQuery),
    Router(RouterQuery),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub value: u128,
    pub call: Call,
}

impl Transaction {
    pub fn new(from: Address, to: Address, call: Call) -> Self {
        Self {
            from,
            to,
            value: 0,
            call,
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: String,
    pub block_number: u64,
    pub from: Address,
    pub to: Address,
    pub output: ReturnValue,
    /// Events of every frame, in emission order
    pub logs: Vec<Log>,
}

impl Receipt {
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.logs.iter().map(|l| &l.event)
    }

    pub fn find_event<F>(&self, predicate: F) -> Option<&Event>
    where
        F: Fn(&Event) -> bool,
    {
        self.events().find(|e| predicate(e))
    }
}

// ─────────────────────────────────────────────────────────────
// CONTRACTS
// ─────────────────────────────────────────────────────────────

/// Constructor input for each hosted contract type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractInit {
    Vsbt(VsbtInit),
    Erc20(Erc20Init),
    Wbnb,
    PairFactory { fee_to_setter: Address },
    Router { factory: Address, weth: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractKind {
    Vsbt(VsbtContract),
    Erc20(MockErc20),
    Wbnb(Wbnb),
    Factory(PairFactory),
    Pair(Pair),
    Router(Router),
}

impl ContractKind {
    /// Stable identifier of the contract's code.
    pub fn code_id(&self) -> &'static str {
        match self {
            ContractKind::Vsbt(_) => "VODAVSTB",
            ContractKind::Erc20(_) => "MockERC20",
            ContractKind::Wbnb(_) => "WBNB",
            ContractKind::Factory(_) => "PairFactory",
            ContractKind::Pair(_) => "Pair",
            ContractKind::Router(_) => "Router",
        }
    }

    pub(crate) fn wrong_interface(&self, address: Address, interface: &'static str) -> ChainError {
        ChainError::WrongInterface {
            address,
            kind: self.code_id(),
            interface,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub address: Address,
    pub code_hash: String,
    pub deployer: Address,
    pub created_at_block: u64,
    pub kind: ContractKind,
}

/// Deployment metadata without contract storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractInfo {
    pub address: Address,
    pub kind: String,
    pub code_hash: String,
    pub deployer: Address,
    pub created_at_block: u64,
    pub balance: u128,
}

/// blake3 hash of a contract's code identifier and crate version.
pub fn compute_code_hash(code_id: &str) -> String {
    let input = format!("{}@{}", code_id, env!("CARGO_PKG_VERSION"));
    hex::encode(blake3::hash(input.as_bytes()).as_bytes())
}

// ─────────────────────────────────────────────────────────────
// CHAIN STATE
// ─────────────────────────────────────────────────────────────

/// Entire world state. `Clone` is the snapshot used for atomic reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainState {
    pub block_number: u64,
    pub timestamp: u64,
    /// Native balances of accounts and contracts alike
    pub balances: BTreeMap<Address, u128>,
    pub nonces: BTreeMap<Address, u64>,
    pub contracts: BTreeMap<Address, Contract>,
}

impl Default for ChainState {
    fn default() -> Self {
        Self {
            block_number: 0,
            timestamp: GENESIS_TIMESTAMP,
            balances: BTreeMap::new(),
            nonces: BTreeMap::new(),
            contracts: BTreeMap::new(),
        }
    }
}

impl ChainState {
    pub fn native_balance(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn contract(&self, address: &Address) -> Result<&Contract, ChainError> {
        self.contracts
            .get(address)
            .ok_or(ChainError::UnknownContract(*address))
    }

    pub(crate) fn kind_mut(&mut self, address: &Address) -> Result<&mut ContractKind, ChainError> {
        self.contracts
            .get_mut(address)
            .map(|c| &mut c.kind)
            .ok_or(ChainError::UnknownContract(*address))
    }

    fn move_native(&mut self, from: &Address, to: &Address, amount: u128) -> Result<(), ChainError> {
        if amount == 0 {
            return Ok(());
        }
        let available = self.native_balance(from);
        if available < amount {
            return Err(ChainError::InsufficientNativeBalance {
                account: *from,
                available,
                required: amount,
            });
        }
        self.balances.insert(*from, available - amount);
        let credited = self
            .native_balance(to)
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;
        self.balances.insert(*to, credited);
        Ok(())
    }

    /// Current nonce of `account`, then increment it.
    fn bump_nonce(&mut self, account: &Address) -> u64 {
        let nonce = self.nonces.entry(*account).or_insert(0);
        let current = *nonce;
        *nonce = nonce.saturating_add(1);
        current
    }

    fn advance_block(&mut self) {
        self.block_number += 1;
        self.timestamp += BLOCK_TIME_SECS;
    }

    /// Place a contract at the address derived from `deployer`'s nonce.
    pub(crate) fn install(&mut self, deployer: Address, kind: ContractKind) -> Address {
        let nonce = self.bump_nonce(&deployer);
        let address = deployer.create(nonce);
        let contract = Contract {
            address,
            code_hash: compute_code_hash(kind.code_id()),
            deployer,
            created_at_block: self.block_number,
            kind,
        };
        self.contracts.insert(address, contract);
        address
    }
}

impl ReserveSource for ChainState {
    fn reserves(&self, pool: &Address) -> Result<PoolReserves, ContractError> {
        match self.contracts.get(pool).map(|c| &c.kind) {
            Some(ContractKind::Pair(pair)) => Ok(pair.reserves()),
            _ => Err(ContractError::Custom(format!(
                "{} is not a liquidity pool",
                pool
            ))),
        }
    }
}

/// Execute one call frame: move attached value, run the contract, settle
/// its payouts and record its events. Nested frames recurse through here.
pub(crate) fn dispatch(
    state: &mut ChainState,
    mut ctx: CallContext,
    call: Call,
    logs: &mut Vec<Log>,
) -> Result<ReturnValue, ChainError> {
    let this = ctx.this;
    state.contract(&this)?;
    state.move_native(&ctx.caller, &this, ctx.value)?;
    ctx.balance = state.native_balance(&this);

    let outcome = match call {
        Call::Vsbt(action) => {
            // Detached while it runs so mint pricing can read pool reserves
            let mut contract = state
                .contracts
                .remove(&this)
                .ok_or(ChainError::UnknownContract(this))?;
            let result = match &mut contract.kind {
                ContractKind::Vsbt(c) => {
                    c.execute(&ctx, action, &*state).map_err(ChainError::from)
                }
                other => Err(other.wrong_interface(this, "VSBT")),
            };
            state.contracts.insert(this, contract);
            result?
        }
        Call::Erc20(action) => match state.kind_mut(&this)? {
            ContractKind::Erc20(t) => t.execute(&ctx, action)?,
            ContractKind::Wbnb(w) => w.token.execute(&ctx, action)?,
            other => return Err(other.wrong_interface(this, "ERC20")),
        },
        Call::Wbnb(action) => match state.kind_mut(&this)? {
            ContractKind::Wbnb(w) => w.execute(&ctx, action)?,
            other => return Err(other.wrong_interface(this, "WBNB")),
        },
        Call::Factory(action) => dex::execute_factory(state, &ctx, action)?,
        Call::Pair(action) => dex::execute_pair(state, &ctx, action)?,
        Call::Router(action) => dex::execute_router(state, &ctx, action, logs)?,
    };

    for (to, amount) in &outcome.payouts {
        state.move_native(&this, to, *amount)?;
        debug!("payout {} -> {}: {} wei", this, to, amount);
    }
    logs.extend(
        outcome
            .events
            .into_iter()
            .map(|event| Log { address: this, event }),
    );
    Ok(outcome.output)
}

fn query_contract(state: &ChainState, to: &Address, query: &Query) -> Result<ReturnValue, ChainError> {
    let kind = &state.contract(to)?.kind;
    let value = match (kind, query) {
        (ContractKind::Vsbt(c), Query::Vsbt(q)) => c.query(q, state)?,
        (ContractKind::Erc20(t), Query::Erc20(q)) => t.query(q),
        (ContractKind::Wbnb(w), Query::Erc20(q)) => w.token.query(q),
        (ContractKind::Factory(f), Query::Factory(q)) => f.query(q),
        (ContractKind::Pair(p), Query::Pair(q)) => p.query(q),
        (ContractKind::Router(r), Query::Router(q)) => r.query(q)?,
        (other, q) => {
            let interface = match q {
                Query::Vsbt(_) => "VSBT",
                Query::Erc20(_) => "ERC20",
                Query::Factory(_) => "PairFactory",
                Query::Pair(_) => "Pair",
                Query::Router(_) => "Router",
            };
            return Err(other.wrong_interface(*to, interface));
        }
    };
    Ok(value)
}

fn tx_hash(from: &Address, to: &Address, nonce: u64, block_number: u64) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(from.as_slice());
    hasher.update(to.as_slice());
    hasher.update(&nonce.to_be_bytes());
    hasher.update(&block_number.to_be_bytes());
    format!("0x{}", hex::encode(hasher.finalize().as_bytes()))
}

// ─────────────────────────────────────────────────────────────
// LOCAL CHAIN
// ─────────────────────────────────────────────────────────────

/// Shared handle to the simulated chain. Clones share the same state;
/// transactions are serialized by a single lock.
#[derive(Debug, Clone, Default)]
pub struct LocalChain {
    state: Arc<Mutex<ChainState>>,
}

impl LocalChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: ChainState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, ChainState>, ChainError> {
        self.state.lock().map_err(|_| ChainError::Lock)
    }

    /// Copy of the full world state.
    pub fn snapshot(&self) -> Result<ChainState, ChainError> {
        Ok(self.lock()?.clone())
    }

    pub fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.lock()?.block_number)
    }

    pub fn timestamp(&self) -> Result<u64, ChainError> {
        Ok(self.lock()?.timestamp)
    }

    /// Move the clock forward without mining a transaction.
    pub fn advance_time(&self, secs: u64) -> Result<(), ChainError> {
        let mut state = self.lock()?;
        state.timestamp = state.timestamp.saturating_add(secs);
        Ok(())
    }

    /// Credit native currency to an account (genesis allocation / faucet).
    pub fn fund(&self, account: Address, amount: u128) -> Result<(), ChainError> {
        let mut state = self.lock()?;
        let balance = state
            .native_balance(&account)
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;
        state.balances.insert(account, balance);
        Ok(())
    }

    pub fn native_balance(&self, account: &Address) -> Result<u128, ChainError> {
        Ok(self.lock()?.native_balance(account))
    }

    /// Deploy a contract. The deployer becomes owner where the contract has one.
    pub fn deploy(&self, deployer: Address, init: ContractInit) -> Result<Address, ChainError> {
        let kind = match init {
            ContractInit::Vsbt(init) => ContractKind::Vsbt(VsbtContract::new(deployer, init)?),
            ContractInit::Erc20(init) => ContractKind::Erc20(MockErc20::new(deployer, init)),
            ContractInit::Wbnb => ContractKind::Wbnb(Wbnb::new()),
            ContractInit::PairFactory { fee_to_setter } => {
                ContractKind::Factory(PairFactory::new(fee_to_setter))
            }
            ContractInit::Router { factory, weth } => ContractKind::Router(Router::new(factory, weth)),
        };
        let code_id = kind.code_id();

        let mut state = self.lock()?;
        state.advance_block();
        let address = state.install(deployer, kind);
        info!(
            "Deployed {} at {} (deployer {}, block {})",
            code_id, address, deployer, state.block_number
        );
        Ok(address)
    }

    /// Mine one transaction. On any error the state is left exactly as it
    /// was before the call.
    pub fn call(&self, tx: Transaction) -> Result<Receipt, ChainError> {
        let mut state = self.lock()?;
        let snapshot = state.clone();
        match Self::execute_transaction(&mut state, tx) {
            Ok(receipt) => Ok(receipt),
            Err(e) => {
                *state = snapshot;
                warn!("Transaction failed: {}", e);
                Err(e)
            }
        }
    }

    fn execute_transaction(state: &mut ChainState, tx: Transaction) -> Result<Receipt, ChainError> {
        let nonce = state.bump_nonce(&tx.from);
        state.advance_block();

        let ctx = CallContext {
            caller: tx.from,
            this: tx.to,
            value: tx.value,
            balance: 0,
            block_number: state.block_number,
            timestamp: state.timestamp,
        };
        let mut logs = Vec::new();
        let output = dispatch(state, ctx, tx.call, &mut logs)?;

        Ok(Receipt {
            tx_hash: tx_hash(&tx.from, &tx.to, nonce, state.block_number),
            block_number: state.block_number,
            from: tx.from,
            to: tx.to,
            output,
            logs,
        })
    }

    /// Read-only call against current state.
    pub fn view(&self, to: &Address, query: Query) -> Result<ReturnValue, ChainError> {
        let state = self.lock()?;
        query_contract(&state, to, &query)
    }

    pub fn contract_info(&self, address: &Address) -> Result<ContractInfo, ChainError> {
        let state = self.lock()?;
        let contract = state.contract(address)?;
        Ok(ContractInfo {
            address: contract.address,
            kind: contract.kind.code_id().to_string(),
            code_hash: contract.code_hash.clone(),
            deployer: contract.deployer,
            created_at_block: contract.created_at_block,
            balance: state.native_balance(address),
        })
    }

    pub fn contract_addresses(&self) -> Result<Vec<Address>, ChainError> {
        Ok(self.lock()?.contracts.keys().copied().collect())
    }

    // ── Persistence ─────────────────────────────────────────

    pub fn save_to_file(&self, path: &Path) -> Result<(), ChainError> {
        let state = self.lock()?;
        let data = serde_json::to_vec_pretty(&*state)?;
        std::fs::write(path, data)?;
        debug!("Chain state saved to {}", path.display());
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ChainError> {
        let data = std::fs::read(path)?;
        let state: ChainState = serde_json::from_slice(&data)?;
        debug!(
            "Chain state loaded from {} ({} contracts, block {})",
            path.display(),
            state.contracts.len(),
            state.block_number
        );
        Ok(Self::from_state(state))
    }

    /// Load `path` if it exists, otherwise start a fresh chain.
    pub fn open(path: &Path) -> Result<Self, ChainError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::new())
        }
    }
}
