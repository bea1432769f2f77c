//! # VSTB: VODA Soul-Bound Token
//!
//! Non-transferable membership token with a referral reward programme.
//!
//! ## Overview
//! Every account may hold at most one token. The mint price is set in whole
//! stable-token units (`stable_cost`); each paid mint converts it to native
//! currency at the live price of the configured pool and stores the result
//! as `bnb_cost`. A mint may name an inviter; the inviter (and, when
//! configured, further ancestors) accrue a percentage of that `bnb_cost`
//! and collect it with `Claim`.
//!
//! ## Features
//! - One-soul-one-token: no transfer entry point exists
//! - Token ids start at 1 and increase strictly; 0 means "no token"
//! - Owner gate (`Ownable`) on every administrative action
//! - Pause gate on the paid mint only; the owner mint bypasses it
//! - Live spot-price quote read from the configured liquidity pool
//! - All amounts in wei (`u128`), no floating point
//!
//! ## Architecture
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │  VsbtContract                                          │
//! │  ┌──────────────┐  ┌───────────────┐  ┌─────────────┐  │
//! │  │ Global       │  │ Accounts      │  │ Tokens      │  │
//! │  │ owner        │  │ addr →        │  │ id → owner  │  │
//! │  │ paused       │  │  token_id     │  │             │  │
//! │  │ stable_cost  │  │  inviter      │  │             │  │
//! │  │ bnb_cost     │  │               │  │             │  │
//! │  │ base URI     │  │  referrals[]  │  │             │  │
//! │  │ sale params  │  │  pending      │  │             │  │
//! │  └──────────────┘  └───────────────┘  └─────────────┘  │
//! └────────────────────────────────────────────────────────┘
//! ```

use crate::error::ContractError;
use crate::oracle::{self, ReserveSource};
use crate::{u128_str, CallContext, Outcome, ReturnValue};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vsbt_core::{Address, ConstructorArgs, SaleConfig, MAX_SYMBOL_LEN, TOKEN_URI_SUFFIX};

// ─────────────────────────────────────────────────────────────
// CONSTRUCTION
// ─────────────────────────────────────────────────────────────

/// Pricing and reward parameters fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleParams {
    /// `bnb_cost` reported until the first paid mint prices it.
    pub initial_cost: u128,
    /// Mint price in whole stable-token units.
    pub stable_cost: u128,
    /// Percent of the mint price accrued per ancestor level, nearest first.
    pub reward_percents: Vec<u8>,
}

impl Default for SaleParams {
    fn default() -> Self {
        Self::from(&SaleConfig::default())
    }
}

impl From<&SaleConfig> for SaleParams {
    fn from(sale: &SaleConfig) -> Self {
        Self {
            initial_cost: sale.initial_cost_wei,
            stable_cost: sale.stable_cost,
            reward_percents: sale.reward_percents.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VsbtInit {
    pub wrapped_native: Address,
    pub pool: Address,
    pub creator: Address,
    pub plan_a: Address,
    pub name: String,
    pub symbol: String,
    pub sale: SaleParams,
}

impl VsbtInit {
    pub fn from_args(args: &ConstructorArgs, sale: SaleParams) -> Self {
        Self {
            wrapped_native: args.wrapped_native,
            pool: args.pool,
            creator: args.creator,
            plan_a: args.plan_a,
            name: args.token_name.clone(),
            symbol: args.token_symbol.clone(),
            sale,
        }
    }

    fn validate(&self) -> Result<(), ContractError> {
        let invalid = |msg: &str| Err(ContractError::Custom(msg.to_string()));
        if self.name.is_empty() {
            return invalid("Token name must not be empty");
        }
        if self.symbol.is_empty() || self.symbol.len() > MAX_SYMBOL_LEN {
            return invalid("Token symbol must be 1-11 characters");
        }
        if self.creator.is_zero() || self.plan_a.is_zero() {
            return invalid("Payout addresses must not be the zero address");
        }
        if self.sale.initial_cost == 0 {
            return invalid("Initial cost must be > 0");
        }
        if self.sale.stable_cost == 0 {
            return invalid("Stable cost must be > 0");
        }
        let total: u32 = self.sale.reward_percents.iter().map(|p| *p as u32).sum();
        if total > 100 {
            return invalid("Referral rewards exceed 100% of the mint price");
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// ACTIONS / QUERIES / EVENTS
// ─────────────────────────────────────────────────────────────

/// State-changing entry points. Serialized with an `action` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum VsbtAction {
    /// Paid mint to the caller. A zero `inviter` means "no inviter".
    MintNft { inviter: Address },
    /// Owner mint: no payment and no pause check. An inviter is linked but
    /// earns nothing, since no value entered the contract.
    MintForAddress {
        recipient: Address,
        #[serde(default)]
        inviter: Option<Address>,
    },
    SetPaused { paused: bool },
    /// Mint price in whole stable-token units.
    SetCost {
        #[serde(with = "u128_str")]
        cost: u128,
    },
    SetBaseTokenUri { uri: String },
    TransferOwnership { new_owner: Address },
    /// Pay out the contract balance not reserved for unclaimed rewards.
    Withdraw,
    /// Pay the caller's accrued referral reward.
    Claim,
}

/// Read-only entry points. Serialized with a `query` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query")]
pub enum VsbtQuery {
    Name,
    Symbol,
    Owner,
    BnbCost,
    StableCost,
    Paused,
    TotalSupply,
    BaseTokenUri,
    BalanceOf { account: Address },
    TokenIdOf { account: Address },
    OwnerOf { token_id: u64 },
    GetPrice { pool: Address, inverse: bool },
    GetReferrals { account: Address },
    GetInviter { account: Address },
    GetReferralsAmountForTwoLevels { account: Address },
    GetRewardSum { account: Address },
    TokenUri { token_id: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum VsbtEvent {
    Transfer {
        from: Address,
        to: Address,
        token_id: u64,
    },
    Claimed {
        user: Address,
        #[serde(with = "u128_str")]
        reward: u128,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
}

// ─────────────────────────────────────────────────────────────
// STATE
// ─────────────────────────────────────────────────────────────

/// Per-account record. Created on first mint or first referral credit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub token_id: u64,
    pub inviter: Address,
    pub referrals: Vec<Address>,
    pub pending_reward: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VsbtContract {
    pub name: String,
    pub symbol: String,
    pub owner: Address,
    pub wrapped_native: Address,
    pub pool: Address,
    pub creator: Address,
    pub plan_a: Address,
    pub paused: bool,
    /// Whole stable-token units per mint.
    pub stable_cost: u128,
    /// Native price charged by the latest paid mint.
    pub bnb_cost: u128,
    pub base_token_uri: Option<String>,
    pub sale: SaleParams,
    /// Last assigned token id; equals total supply.
    pub last_token_id: u64,
    /// Sum of every account's unclaimed reward.
    pub outstanding_rewards: u128,
    accounts: BTreeMap<Address, AccountRecord>,
    token_owners: BTreeMap<u64, Address>,
}

impl VsbtContract {
    /// Construct with `deployer` as owner.
    pub fn new(deployer: Address, init: VsbtInit) -> Result<Self, ContractError> {
        init.validate()?;
        Ok(Self {
            name: init.name,
            symbol: init.symbol,
            owner: deployer,
            wrapped_native: init.wrapped_native,
            pool: init.pool,
            creator: init.creator,
            plan_a: init.plan_a,
            paused: false,
            stable_cost: init.sale.stable_cost,
            bnb_cost: init.sale.initial_cost,
            base_token_uri: None,
            sale: init.sale,
            last_token_id: 0,
            outstanding_rewards: 0,
            accounts: BTreeMap::new(),
            token_owners: BTreeMap::new(),
        })
    }

    // ── Execute ─────────────────────────────────────────────

    pub fn execute(
        &mut self,
        ctx: &CallContext,
        action: VsbtAction,
        reserves: &dyn ReserveSource,
    ) -> Result<Outcome, ContractError> {
        match action {
            VsbtAction::MintNft { inviter } => self.mint_nft(ctx, inviter, reserves),
            VsbtAction::MintForAddress { recipient, inviter } => {
                self.only_owner(ctx)?;
                self.mint_for_address(recipient, inviter)
            }
            VsbtAction::SetPaused { paused } => {
                self.only_owner(ctx)?;
                self.paused = paused;
                info!("VSTB paused = {}", paused);
                Ok(Outcome::new(ReturnValue::None))
            }
            VsbtAction::SetCost { cost } => {
                self.only_owner(ctx)?;
                if cost == 0 {
                    return Err(ContractError::Custom("Cost must be > 0".to_string()));
                }
                self.stable_cost = cost;
                info!("VSTB stable cost = {}", cost);
                Ok(Outcome::new(ReturnValue::None))
            }
            VsbtAction::SetBaseTokenUri { uri } => {
                self.only_owner(ctx)?;
                self.base_token_uri = Some(uri);
                Ok(Outcome::new(ReturnValue::None))
            }
            VsbtAction::TransferOwnership { new_owner } => {
                self.only_owner(ctx)?;
                if new_owner.is_zero() {
                    return Err(ContractError::Custom(
                        "Ownable: new owner is the zero address".to_string(),
                    ));
                }
                let previous_owner = self.owner;
                self.owner = new_owner;
                Ok(Outcome::new(ReturnValue::None).event(VsbtEvent::OwnershipTransferred {
                    previous_owner,
                    new_owner,
                }))
            }
            VsbtAction::Withdraw => {
                self.only_owner(ctx)?;
                self.withdraw(ctx)
            }
            VsbtAction::Claim => self.claim(ctx),
        }
    }

    fn only_owner(&self, ctx: &CallContext) -> Result<(), ContractError> {
        if ctx.caller != self.owner {
            return Err(ContractError::NotOwner);
        }
        Ok(())
    }

    fn mint_nft(
        &mut self,
        ctx: &CallContext,
        inviter: Address,
        reserves: &dyn ReserveSource,
    ) -> Result<Outcome, ContractError> {
        if self.paused {
            return Err(ContractError::Paused);
        }
        if self.token_id_of(&ctx.caller) != 0 {
            return Err(ContractError::AlreadyExists);
        }

        let cost = oracle::native_cost(
            reserves,
            &self.pool,
            &self.wrapped_native,
            self.stable_cost,
        )?;
        if ctx.value < cost {
            return Err(ContractError::InsufficientFunds);
        }
        self.bnb_cost = cost;

        let (token_id, transfer) = self.issue(ctx.caller);
        if !inviter.is_zero() && inviter != ctx.caller {
            self.link_referral(ctx.caller, inviter);
            self.accrue_rewards(ctx.caller, cost)?;
        }

        info!(
            "VSTB #{} minted to {} for {} wei ({} stable units)",
            token_id, ctx.caller, cost, self.stable_cost
        );
        Ok(Outcome::new(ReturnValue::Uint(token_id as u128)).event(transfer))
    }

    fn mint_for_address(
        &mut self,
        recipient: Address,
        inviter: Option<Address>,
    ) -> Result<Outcome, ContractError> {
        if recipient.is_zero() {
            return Err(ContractError::Custom("Mint to the zero address".to_string()));
        }
        if self.token_id_of(&recipient) != 0 {
            return Err(ContractError::AlreadyExists);
        }

        let (token_id, transfer) = self.issue(recipient);
        if let Some(inviter) = inviter.filter(|i| !i.is_zero() && *i != recipient) {
            self.link_referral(recipient, inviter);
        }

        info!("VSTB #{} minted to {} by owner", token_id, recipient);
        Ok(Outcome::new(ReturnValue::Uint(token_id as u128)).event(transfer))
    }

    fn withdraw(&mut self, ctx: &CallContext) -> Result<Outcome, ContractError> {
        let available = ctx.balance.saturating_sub(self.outstanding_rewards);
        if available == 0 {
            return Err(ContractError::NothingToWithdraw);
        }
        let creator_share = available / 2;
        let plan_a_share = available - creator_share;

        let mut outcome = Outcome::new(ReturnValue::Uint(available));
        if creator_share > 0 {
            outcome = outcome.payout(self.creator, creator_share);
        }
        outcome = outcome.payout(self.plan_a, plan_a_share);
        info!(
            "VSTB withdraw: {} wei to creator {}, {} wei to plan A {}",
            creator_share, self.creator, plan_a_share, self.plan_a
        );
        Ok(outcome)
    }

    fn claim(&mut self, ctx: &CallContext) -> Result<Outcome, ContractError> {
        let reward = self.reward_sum(&ctx.caller);
        if reward == 0 {
            return Err(ContractError::NothingToClaim);
        }
        if let Some(record) = self.accounts.get_mut(&ctx.caller) {
            record.pending_reward = 0;
        }
        self.outstanding_rewards -= reward;

        info!("VSTB reward claimed by {}: {} wei", ctx.caller, reward);
        Ok(Outcome::new(ReturnValue::Uint(reward))
            .event(VsbtEvent::Claimed {
                user: ctx.caller,
                reward,
            })
            .payout(ctx.caller, reward))
    }

    // ── Ledger internals ────────────────────────────────────

    /// Assign the next id to `to`.
    fn issue(&mut self, to: Address) -> (u64, VsbtEvent) {
        self.last_token_id += 1;
        let token_id = self.last_token_id;
        self.accounts.entry(to).or_default().token_id = token_id;
        self.token_owners.insert(token_id, to);
        (
            token_id,
            VsbtEvent::Transfer {
                from: Address::ZERO,
                to,
                token_id,
            },
        )
    }

    /// Record the inviter edge in both directions. Only reached on a first
    /// mint, so the inviter is never overwritten.
    fn link_referral(&mut self, invitee: Address, inviter: Address) {
        self.accounts.entry(invitee).or_default().inviter = inviter;
        self.accounts.entry(inviter).or_default().referrals.push(invitee);
        debug!("referral {} -> {}", inviter, invitee);
    }

    /// Credit each configured ancestor level of `invitee` with its share of
    /// `cost`. Stops at the first account without an inviter.
    fn accrue_rewards(&mut self, invitee: Address, cost: u128) -> Result<(), ContractError> {
        let mut current = invitee;
        for percent in self.sale.reward_percents.clone() {
            let ancestor = self.inviter_of(&current);
            if ancestor.is_zero() {
                break;
            }
            let reward = cost.checked_mul(percent as u128).ok_or(ContractError::Overflow)? / 100;
            let record = self.accounts.entry(ancestor).or_default();
            record.pending_reward = record
                .pending_reward
                .checked_add(reward)
                .ok_or(ContractError::Overflow)?;
            self.outstanding_rewards = self
                .outstanding_rewards
                .checked_add(reward)
                .ok_or(ContractError::Overflow)?;
            current = ancestor;
        }
        Ok(())
    }

    // ── Views ───────────────────────────────────────────────

    pub fn token_id_of(&self, account: &Address) -> u64 {
        self.accounts.get(account).map(|r| r.token_id).unwrap_or(0)
    }

    pub fn inviter_of(&self, account: &Address) -> Address {
        self.accounts
            .get(account)
            .map(|r| r.inviter)
            .unwrap_or(Address::ZERO)
    }

    pub fn referrals_of(&self, account: &Address) -> &[Address] {
        self.accounts
            .get(account)
            .map(|r| r.referrals.as_slice())
            .unwrap_or(&[])
    }

    pub fn reward_sum(&self, account: &Address) -> u128 {
        self.accounts
            .get(account)
            .map(|r| r.pending_reward)
            .unwrap_or(0)
    }

    /// Direct invitees plus their direct invitees. Deeper levels are not counted.
    pub fn referrals_two_levels(&self, account: &Address) -> u64 {
        let direct = self.referrals_of(account);
        let second: usize = direct.iter().map(|r| self.referrals_of(r).len()).sum();
        (direct.len() + second) as u64
    }

    pub fn token_uri(&self, token_id: u64) -> String {
        match &self.base_token_uri {
            Some(base) => format!("{}{}{}", base, token_id, TOKEN_URI_SUFFIX),
            None => String::new(),
        }
    }

    pub fn query(
        &self,
        query: &VsbtQuery,
        reserves: &dyn ReserveSource,
    ) -> Result<ReturnValue, ContractError> {
        let value = match query {
            VsbtQuery::Name => ReturnValue::Text(self.name.clone()),
            VsbtQuery::Symbol => ReturnValue::Text(self.symbol.clone()),
            VsbtQuery::Owner => ReturnValue::Address(self.owner),
            VsbtQuery::BnbCost => ReturnValue::Uint(self.bnb_cost),
            VsbtQuery::StableCost => ReturnValue::Uint(self.stable_cost),
            VsbtQuery::Paused => ReturnValue::Bool(self.paused),
            VsbtQuery::TotalSupply => ReturnValue::Uint(self.last_token_id as u128),
            VsbtQuery::BaseTokenUri => {
                ReturnValue::Text(self.base_token_uri.clone().unwrap_or_default())
            }
            VsbtQuery::BalanceOf { account } => {
                ReturnValue::Uint(u128::from(self.token_id_of(account) != 0))
            }
            VsbtQuery::TokenIdOf { account } => ReturnValue::Uint(self.token_id_of(account) as u128),
            VsbtQuery::OwnerOf { token_id } => ReturnValue::Address(
                *self
                    .token_owners
                    .get(token_id)
                    .ok_or(ContractError::NonexistentToken)?,
            ),
            VsbtQuery::GetPrice { pool, inverse } => {
                ReturnValue::Uint(oracle::quote(reserves, pool, *inverse)?)
            }
            VsbtQuery::GetReferrals { account } => {
                ReturnValue::Addresses(self.referrals_of(account).to_vec())
            }
            VsbtQuery::GetInviter { account } => ReturnValue::Address(self.inviter_of(account)),
            VsbtQuery::GetReferralsAmountForTwoLevels { account } => {
                ReturnValue::Uint(self.referrals_two_levels(account) as u128)
            }
            VsbtQuery::GetRewardSum { account } => ReturnValue::Uint(self.reward_sum(account)),
            VsbtQuery::TokenUri { token_id } => ReturnValue::Text(self.token_uri(*token_id)),
        };
        Ok(value)
    }
}
