// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// MOCK CONSTANT-PRODUCT DEX
//
// Factory, pair and router contracts in the shape of a Uniswap-V2 style
// exchange. Only the liquidity-provision path is modelled: pairs are
// created, liquidity is added and reserves are reported. Swaps are out
// of scope; the SBT contract only ever reads reserves.
//
// Pool math is integer-only. First deposit mints sqrt(a0*a1) LP tokens
// minus MINIMUM_LIQUIDITY, which is locked forever at the zero address.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use crate::erc20::{Erc20Action, Erc20Event, WbnbAction};
use crate::error::{ChainError, ContractError};
use crate::math::{mul_div, sqrt_product};
use crate::oracle::PoolReserves;
use crate::{
    dispatch, u128_str, Call, CallContext, ChainState, ContractInit, ContractKind, Erc20Init,
    LocalChain, Log, Outcome, Query, ReturnValue, Transaction,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vsbt_core::Address;

/// LP tokens burned to the zero address on a pool's first deposit.
pub const MINIMUM_LIQUIDITY: u128 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum DexEvent {
    PairCreated {
        token0: Address,
        token1: Address,
        pair: Address,
        index: u64,
    },
    Mint {
        sender: Address,
        #[serde(with = "u128_str")]
        amount0: u128,
        #[serde(with = "u128_str")]
        amount1: u128,
    },
    Sync {
        #[serde(with = "u128_str")]
        reserve0: u128,
        #[serde(with = "u128_str")]
        reserve1: u128,
    },
}

/// Canonical token order of a pair: lower address first.
pub fn sort_tokens(a: Address, b: Address) -> Result<(Address, Address), ContractError> {
    if a == b {
        return Err(ContractError::Custom("IDENTICAL_ADDRESSES".to_string()));
    }
    let (token0, token1) = if a < b { (a, b) } else { (b, a) };
    if token0.is_zero() {
        return Err(ContractError::Custom("ZERO_ADDRESS".to_string()));
    }
    Ok((token0, token1))
}

/// `amount_a * reserve_b / reserve_a`: the amount of B worth `amount_a` of A.
pub fn quote_amount(amount_a: u128, reserve_a: u128, reserve_b: u128) -> Result<u128, ContractError> {
    if amount_a == 0 {
        return Err(ContractError::Custom("INSUFFICIENT_AMOUNT".to_string()));
    }
    if reserve_a == 0 || reserve_b == 0 {
        return Err(ContractError::Custom("INSUFFICIENT_LIQUIDITY".to_string()));
    }
    mul_div(amount_a, reserve_b, reserve_a).ok_or(ContractError::Overflow)
}

// ─────────────────────────────────────────────────────────────
// FACTORY
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum FactoryAction {
    CreatePair { token_a: Address, token_b: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query")]
pub enum FactoryQuery {
    GetPair { token_a: Address, token_b: Address },
    AllPairsLength,
    AllPairs { index: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairEntry {
    pub token0: Address,
    pub token1: Address,
    pub pair: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairFactory {
    pub fee_to_setter: Address,
    all_pairs: Vec<PairEntry>,
}

impl PairFactory {
    pub fn new(fee_to_setter: Address) -> Self {
        Self {
            fee_to_setter,
            all_pairs: Vec::new(),
        }
    }

    /// Pair for the two tokens in either order.
    pub fn get_pair(&self, token_a: &Address, token_b: &Address) -> Option<Address> {
        let (token0, token1) = if token_a < token_b {
            (token_a, token_b)
        } else {
            (token_b, token_a)
        };
        self.all_pairs
            .iter()
            .find(|e| &e.token0 == token0 && &e.token1 == token1)
            .map(|e| e.pair)
    }

    pub fn query(&self, query: &FactoryQuery) -> ReturnValue {
        match query {
            FactoryQuery::GetPair { token_a, token_b } => {
                ReturnValue::Address(self.get_pair(token_a, token_b).unwrap_or(Address::ZERO))
            }
            FactoryQuery::AllPairsLength => ReturnValue::Uint(self.all_pairs.len() as u128),
            FactoryQuery::AllPairs { index } => ReturnValue::Address(
                self.all_pairs
                    .get(*index as usize)
                    .map(|e| e.pair)
                    .unwrap_or(Address::ZERO),
            ),
        }
    }
}

pub(crate) fn execute_factory(
    state: &mut ChainState,
    ctx: &CallContext,
    action: FactoryAction,
) -> Result<Outcome, ChainError> {
    match action {
        FactoryAction::CreatePair { token_a, token_b } => {
            let (token0, token1) = sort_tokens(token_a, token_b)?;
            if factory_ref(state, &ctx.this)?.get_pair(&token0, &token1).is_some() {
                return Err(ContractError::Custom("PAIR_EXISTS".to_string()).into());
            }

            let pair = state.install(
                ctx.this,
                ContractKind::Pair(Pair::new(ctx.this, token0, token1)),
            );
            let factory = factory_mut(state, &ctx.this)?;
            factory.all_pairs.push(PairEntry { token0, token1, pair });
            let index = factory.all_pairs.len() as u64;
            info!("Pair created: {} ({} / {})", pair, token0, token1);

            Ok(Outcome::new(ReturnValue::Address(pair)).event(DexEvent::PairCreated {
                token0,
                token1,
                pair,
                index,
            }))
        }
    }
}

// ─────────────────────────────────────────────────────────────
// PAIR
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PairAction {
    /// Mint LP tokens for whatever token balance exceeds the reserves.
    Mint { to: Address },
    /// Force reserves to match the pair's token balances.
    Sync,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query")]
pub enum PairQuery {
    GetReserves,
    Token0,
    Token1,
    Factory,
    TotalSupply,
    BalanceOf { account: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    pub factory: Address,
    pub token0: Address,
    pub token1: Address,
    pub reserve0: u128,
    pub reserve1: u128,
    pub block_timestamp_last: u64,
    pub total_supply: u128,
    balances: BTreeMap<Address, u128>,
}

impl Pair {
    pub fn new(factory: Address, token0: Address, token1: Address) -> Self {
        Self {
            factory,
            token0,
            token1,
            reserve0: 0,
            reserve1: 0,
            block_timestamp_last: 0,
            total_supply: 0,
            balances: BTreeMap::new(),
        }
    }

    pub fn reserves(&self) -> PoolReserves {
        PoolReserves {
            token0: self.token0,
            token1: self.token1,
            reserve0: self.reserve0,
            reserve1: self.reserve1,
        }
    }

    pub fn lp_balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn query(&self, query: &PairQuery) -> ReturnValue {
        match query {
            PairQuery::GetReserves => ReturnValue::Reserves {
                reserve0: self.reserve0,
                reserve1: self.reserve1,
                block_timestamp_last: self.block_timestamp_last,
            },
            PairQuery::Token0 => ReturnValue::Address(self.token0),
            PairQuery::Token1 => ReturnValue::Address(self.token1),
            PairQuery::Factory => ReturnValue::Address(self.factory),
            PairQuery::TotalSupply => ReturnValue::Uint(self.total_supply),
            PairQuery::BalanceOf { account } => ReturnValue::Uint(self.lp_balance_of(account)),
        }
    }

    fn mint_lp(&mut self, to: Address, amount: u128) -> Result<Erc20Event, ContractError> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(ContractError::Overflow)?;
        *self.balances.entry(to).or_insert(0) += amount;
        Ok(Erc20Event::Transfer {
            from: Address::ZERO,
            to,
            value: amount,
        })
    }

    fn update(&mut self, balance0: u128, balance1: u128, timestamp: u64) -> DexEvent {
        self.reserve0 = balance0;
        self.reserve1 = balance1;
        self.block_timestamp_last = timestamp;
        DexEvent::Sync {
            reserve0: balance0,
            reserve1: balance1,
        }
    }
}

pub(crate) fn execute_pair(
    state: &mut ChainState,
    ctx: &CallContext,
    action: PairAction,
) -> Result<Outcome, ChainError> {
    let (token0, token1, reserve0, reserve1, supply) = {
        let pair = pair_ref(state, &ctx.this)?;
        (pair.token0, pair.token1, pair.reserve0, pair.reserve1, pair.total_supply)
    };
    let balance0 = token_balance(state, &token0, &ctx.this)?;
    let balance1 = token_balance(state, &token1, &ctx.this)?;

    match action {
        PairAction::Mint { to } => {
            let insufficient = || ContractError::Custom("INSUFFICIENT_LIQUIDITY_MINTED".to_string());
            let amount0 = balance0.checked_sub(reserve0).ok_or_else(insufficient)?;
            let amount1 = balance1.checked_sub(reserve1).ok_or_else(insufficient)?;

            let liquidity = if supply == 0 {
                sqrt_product(amount0, amount1)
                    .checked_sub(MINIMUM_LIQUIDITY)
                    .ok_or_else(insufficient)?
            } else {
                let by0 = mul_div(amount0, supply, reserve0).ok_or(ContractError::Overflow)?;
                let by1 = mul_div(amount1, supply, reserve1).ok_or(ContractError::Overflow)?;
                by0.min(by1)
            };
            if liquidity == 0 {
                return Err(insufficient().into());
            }

            let pair = pair_mut(state, &ctx.this)?;
            let mut outcome = Outcome::new(ReturnValue::Uint(liquidity));
            if supply == 0 {
                outcome = outcome.event(pair.mint_lp(Address::ZERO, MINIMUM_LIQUIDITY)?);
            }
            outcome = outcome
                .event(pair.mint_lp(to, liquidity)?)
                .event(pair.update(balance0, balance1, ctx.timestamp))
                .event(DexEvent::Mint {
                    sender: ctx.caller,
                    amount0,
                    amount1,
                });
            info!(
                "Liquidity added to {}: {} / {} -> {} LP",
                ctx.this, amount0, amount1, liquidity
            );
            Ok(outcome)
        }
        PairAction::Sync => {
            let pair = pair_mut(state, &ctx.this)?;
            let sync = pair.update(balance0, balance1, ctx.timestamp);
            Ok(Outcome::new(ReturnValue::None).event(sync))
        }
    }
}

// ─────────────────────────────────────────────────────────────
// ROUTER
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RouterAction {
    AddLiquidity {
        token_a: Address,
        token_b: Address,
        #[serde(with = "u128_str")]
        amount_a_desired: u128,
        #[serde(with = "u128_str")]
        amount_b_desired: u128,
        #[serde(with = "u128_str")]
        amount_a_min: u128,
        #[serde(with = "u128_str")]
        amount_b_min: u128,
        to: Address,
        deadline: u64,
    },
    /// Pairs `token` with the attached native value, wrapped on the way in.
    /// Native value not needed at the pool ratio is refunded.
    AddLiquidityEth {
        token: Address,
        #[serde(with = "u128_str")]
        amount_token_desired: u128,
        #[serde(with = "u128_str")]
        amount_token_min: u128,
        #[serde(with = "u128_str")]
        amount_eth_min: u128,
        to: Address,
        deadline: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query")]
pub enum RouterQuery {
    Factory,
    Weth,
    Quote {
        #[serde(with = "u128_str")]
        amount_a: u128,
        #[serde(with = "u128_str")]
        reserve_a: u128,
        #[serde(with = "u128_str")]
        reserve_b: u128,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Router {
    pub factory: Address,
    pub weth: Address,
}

impl Router {
    pub fn new(factory: Address, weth: Address) -> Self {
        Self { factory, weth }
    }

    pub fn query(&self, query: &RouterQuery) -> Result<ReturnValue, ContractError> {
        match query {
            RouterQuery::Factory => Ok(ReturnValue::Address(self.factory)),
            RouterQuery::Weth => Ok(ReturnValue::Address(self.weth)),
            RouterQuery::Quote {
                amount_a,
                reserve_a,
                reserve_b,
            } => quote_amount(*amount_a, *reserve_a, *reserve_b).map(ReturnValue::Uint),
        }
    }
}

struct LiquidityRequest {
    token_a: Address,
    token_b: Address,
    amount_a_desired: u128,
    amount_b_desired: u128,
    amount_a_min: u128,
    amount_b_min: u128,
}

pub(crate) fn execute_router(
    state: &mut ChainState,
    ctx: &CallContext,
    action: RouterAction,
    logs: &mut Vec<Log>,
) -> Result<Outcome, ChainError> {
    let (factory, weth) = {
        let router = router_ref(state, &ctx.this)?;
        (router.factory, router.weth)
    };

    match action {
        RouterAction::AddLiquidity {
            token_a,
            token_b,
            amount_a_desired,
            amount_b_desired,
            amount_a_min,
            amount_b_min,
            to,
            deadline,
        } => {
            ensure_deadline(ctx, deadline)?;
            let request = LiquidityRequest {
                token_a,
                token_b,
                amount_a_desired,
                amount_b_desired,
                amount_a_min,
                amount_b_min,
            };
            let (pair, amount_a, amount_b) = liquidity_amounts(state, ctx, logs, factory, &request)?;
            pull_token(state, ctx, logs, token_a, pair, amount_a)?;
            pull_token(state, ctx, logs, token_b, pair, amount_b)?;
            let liquidity = dispatch(state, ctx.sub_call(pair), Call::Pair(PairAction::Mint { to }), logs)?;
            Ok(Outcome::new(liquidity))
        }
        RouterAction::AddLiquidityEth {
            token,
            amount_token_desired,
            amount_token_min,
            amount_eth_min,
            to,
            deadline,
        } => {
            ensure_deadline(ctx, deadline)?;
            let request = LiquidityRequest {
                token_a: token,
                token_b: weth,
                amount_a_desired: amount_token_desired,
                amount_b_desired: ctx.value,
                amount_a_min: amount_token_min,
                amount_b_min: amount_eth_min,
            };
            let (pair, amount_token, amount_eth) =
                liquidity_amounts(state, ctx, logs, factory, &request)?;
            pull_token(state, ctx, logs, token, pair, amount_token)?;

            dispatch(
                state,
                ctx.sub_call(weth).with_value(amount_eth),
                Call::Wbnb(WbnbAction::Deposit),
                logs,
            )?;
            dispatch(
                state,
                ctx.sub_call(weth),
                Call::Erc20(Erc20Action::Transfer {
                    to: pair,
                    amount: amount_eth,
                }),
                logs,
            )?;
            let liquidity = dispatch(state, ctx.sub_call(pair), Call::Pair(PairAction::Mint { to }), logs)?;

            let mut outcome = Outcome::new(liquidity);
            if ctx.value > amount_eth {
                outcome = outcome.payout(ctx.caller, ctx.value - amount_eth);
            }
            Ok(outcome)
        }
    }
}

fn ensure_deadline(ctx: &CallContext, deadline: u64) -> Result<(), ContractError> {
    if deadline < ctx.timestamp {
        return Err(ContractError::Expired);
    }
    Ok(())
}

/// Resolve (creating if needed) the pair and the amounts to deposit at the
/// current pool ratio.
fn liquidity_amounts(
    state: &mut ChainState,
    ctx: &CallContext,
    logs: &mut Vec<Log>,
    factory: Address,
    request: &LiquidityRequest,
) -> Result<(Address, u128, u128), ChainError> {
    let existing = factory_ref(state, &factory)?.get_pair(&request.token_a, &request.token_b);
    let pair = match existing {
        Some(pair) => pair,
        None => dispatch(
            state,
            ctx.sub_call(factory),
            Call::Factory(FactoryAction::CreatePair {
                token_a: request.token_a,
                token_b: request.token_b,
            }),
            logs,
        )?
        .as_address()
        .ok_or_else(|| ContractError::Custom("factory returned no pair".to_string()))?,
    };

    let reserves = pair_ref(state, &pair)?.reserves();
    let (reserve_a, reserve_b) = if request.token_a == reserves.token0 {
        (reserves.reserve0, reserves.reserve1)
    } else {
        (reserves.reserve1, reserves.reserve0)
    };
    if reserve_a == 0 && reserve_b == 0 {
        return Ok((pair, request.amount_a_desired, request.amount_b_desired));
    }

    let amount_b_optimal = quote_amount(request.amount_a_desired, reserve_a, reserve_b)?;
    if amount_b_optimal <= request.amount_b_desired {
        if amount_b_optimal < request.amount_b_min {
            return Err(ContractError::Custom("INSUFFICIENT_B_AMOUNT".to_string()).into());
        }
        return Ok((pair, request.amount_a_desired, amount_b_optimal));
    }

    let amount_a_optimal = quote_amount(request.amount_b_desired, reserve_b, reserve_a)?;
    if amount_a_optimal > request.amount_a_desired || amount_a_optimal < request.amount_a_min {
        return Err(ContractError::Custom("INSUFFICIENT_A_AMOUNT".to_string()).into());
    }
    Ok((pair, amount_a_optimal, request.amount_b_desired))
}

/// `transferFrom(caller → pair)` executed with the router as spender.
fn pull_token(
    state: &mut ChainState,
    ctx: &CallContext,
    logs: &mut Vec<Log>,
    token: Address,
    pair: Address,
    amount: u128,
) -> Result<(), ChainError> {
    dispatch(
        state,
        ctx.sub_call(token),
        Call::Erc20(Erc20Action::TransferFrom {
            from: ctx.caller,
            to: pair,
            amount,
        }),
        logs,
    )?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// State accessors
// ─────────────────────────────────────────────────────────────

fn token_balance(state: &ChainState, token: &Address, holder: &Address) -> Result<u128, ChainError> {
    match &state.contract(token)?.kind {
        ContractKind::Erc20(t) => Ok(t.balance_of(holder)),
        ContractKind::Wbnb(w) => Ok(w.token.balance_of(holder)),
        other => Err(other.wrong_interface(*token, "ERC20")),
    }
}

fn factory_ref<'a>(state: &'a ChainState, address: &Address) -> Result<&'a PairFactory, ChainError> {
    match &state.contract(address)?.kind {
        ContractKind::Factory(f) => Ok(f),
        other => Err(other.wrong_interface(*address, "PairFactory")),
    }
}

fn factory_mut<'a>(state: &'a mut ChainState, address: &Address) -> Result<&'a mut PairFactory, ChainError> {
    match state.kind_mut(address)? {
        ContractKind::Factory(f) => Ok(f),
        other => Err(other.wrong_interface(*address, "PairFactory")),
    }
}

fn pair_ref<'a>(state: &'a ChainState, address: &Address) -> Result<&'a Pair, ChainError> {
    match &state.contract(address)?.kind {
        ContractKind::Pair(p) => Ok(p),
        other => Err(other.wrong_interface(*address, "Pair")),
    }
}

fn pair_mut<'a>(state: &'a mut ChainState, address: &Address) -> Result<&'a mut Pair, ChainError> {
    match state.kind_mut(address)? {
        ContractKind::Pair(p) => Ok(p),
        other => Err(other.wrong_interface(*address, "Pair")),
    }
}

fn router_ref<'a>(state: &'a ChainState, address: &Address) -> Result<&'a Router, ChainError> {
    match &state.contract(address)?.kind {
        ContractKind::Router(r) => Ok(r),
        other => Err(other.wrong_interface(*address, "Router")),
    }
}

// ─────────────────────────────────────────────────────────────
// POOL BOOTSTRAP
// ─────────────────────────────────────────────────────────────

/// Addresses of a freshly seeded stable/native market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StablePool {
    pub stable: Address,
    pub wrapped_native: Address,
    pub factory: Address,
    pub router: Address,
    pub pair: Address,
}

/// Deploy USDT, WBNB, factory and router from `provider`, then add
/// `native_amount` / `stable_amount` of liquidity through the router.
/// `provider` must already hold `native_amount` wei.
pub fn seed_stable_pool(
    chain: &LocalChain,
    provider: Address,
    native_amount: u128,
    stable_amount: u128,
) -> Result<StablePool, ChainError> {
    let stable = chain.deploy(
        provider,
        ContractInit::Erc20(Erc20Init {
            name: "Tether USD".to_string(),
            symbol: "USDT".to_string(),
            initial_supply: stable_amount,
        }),
    )?;
    let wrapped_native = chain.deploy(provider, ContractInit::Wbnb)?;
    let factory = chain.deploy(
        provider,
        ContractInit::PairFactory {
            fee_to_setter: provider,
        },
    )?;
    let router = chain.deploy(
        provider,
        ContractInit::Router {
            factory,
            weth: wrapped_native,
        },
    )?;

    chain.call(Transaction::new(
        provider,
        stable,
        Call::Erc20(Erc20Action::Approve {
            spender: router,
            amount: stable_amount,
        }),
    ))?;
    let deadline = chain.timestamp()? + 600;
    chain.call(
        Transaction::new(
            provider,
            router,
            Call::Router(RouterAction::AddLiquidityEth {
                token: stable,
                amount_token_desired: stable_amount,
                amount_token_min: 0,
                amount_eth_min: 0,
                to: provider,
                deadline,
            }),
        )
        .with_value(native_amount),
    )?;

    let pair = chain
        .view(
            &factory,
            Query::Factory(FactoryQuery::GetPair {
                token_a: stable,
                token_b: wrapped_native,
            }),
        )?
        .as_address()
        .unwrap_or(Address::ZERO);
    info!("Seeded USDT/WBNB pool {} via router {}", pair, router);
    Ok(StablePool {
        stable,
        wrapped_native,
        factory,
        router,
        pair,
    })
}
