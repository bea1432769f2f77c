//! # Mock ERC-20 and Wrapped BNB
//!
//! Fungible tokens used as the liquidity pool's collaborators in local
//! scenarios. `MockErc20` stands in for USDT; `Wbnb` wraps native value
//! 1:1 and additionally lets anyone mint unbacked test tokens.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  MockErc20                                    │
//! │  ┌──────────┐  ┌──────────┐  ┌─────────────┐  │
//! │  │ Metadata │  │ Balances │  │ Allowances  │  │
//! │  │ name     │  │ addr→u128│  │ owner →     │  │
//! │  │ symbol   │  │          │  │  spender →  │  │
//! │  │ decimals │  │          │  │   u128      │  │
//! │  └──────────┘  └──────────┘  └─────────────┘  │
//! └───────────────────────────────────────────────┘
//! ```

use crate::error::ContractError;
use crate::{u128_str, CallContext, Outcome, ReturnValue};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vsbt_core::Address;

/// Decimals of every mock token.
pub const MOCK_DECIMALS: u8 = 18;

/// An allowance of `u128::MAX` is never decremented by `TransferFrom`.
pub const UNLIMITED_ALLOWANCE: u128 = u128::MAX;

// ─────────────────────────────────────────────────────────────
// ACTIONS / QUERIES / EVENTS
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Erc20Action {
    Transfer {
        to: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    Approve {
        spender: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    TransferFrom {
        from: Address,
        to: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Test faucet: mints to `to` without backing.
    Mint {
        to: Address,
        #[serde(with = "u128_str")]
        amount: u128,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "query")]
pub enum Erc20Query {
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf { account: Address },
    Allowance { owner: Address, spender: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Erc20Event {
    Transfer {
        from: Address,
        to: Address,
        #[serde(with = "u128_str")]
        value: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        #[serde(with = "u128_str")]
        value: u128,
    },
    Deposit {
        dst: Address,
        #[serde(with = "u128_str")]
        wad: u128,
    },
    Withdrawal {
        src: Address,
        #[serde(with = "u128_str")]
        wad: u128,
    },
}

// ─────────────────────────────────────────────────────────────
// MOCK ERC-20
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Erc20Init {
    pub name: String,
    pub symbol: String,
    /// Minted to the deployer at construction.
    pub initial_supply: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockErc20 {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: u128,
    balances: BTreeMap<Address, u128>,
    allowances: BTreeMap<Address, BTreeMap<Address, u128>>,
}

impl MockErc20 {
    pub fn new(deployer: Address, init: Erc20Init) -> Self {
        let mut token = Self {
            name: init.name,
            symbol: init.symbol,
            decimals: MOCK_DECIMALS,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        };
        if init.initial_supply > 0 {
            token.total_supply = init.initial_supply;
            token.balances.insert(deployer, init.initial_supply);
        }
        token
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn execute(
        &mut self,
        ctx: &CallContext,
        action: Erc20Action,
    ) -> Result<Outcome, ContractError> {
        match action {
            Erc20Action::Transfer { to, amount } => {
                let event = self.transfer_internal(ctx.caller, to, amount)?;
                Ok(Outcome::new(ReturnValue::Bool(true)).event(event))
            }
            Erc20Action::Approve { spender, amount } => {
                if spender.is_zero() {
                    return Err(ContractError::Custom(
                        "ERC20: approve to the zero address".to_string(),
                    ));
                }
                self.allowances
                    .entry(ctx.caller)
                    .or_default()
                    .insert(spender, amount);
                Ok(Outcome::new(ReturnValue::Bool(true)).event(Erc20Event::Approval {
                    owner: ctx.caller,
                    spender,
                    value: amount,
                }))
            }
            Erc20Action::TransferFrom { from, to, amount } => {
                let current = self.allowance(&from, &ctx.caller);
                if current < amount {
                    return Err(ContractError::InsufficientAllowance);
                }
                let event = self.transfer_internal(from, to, amount)?;
                if current != UNLIMITED_ALLOWANCE {
                    self.allowances
                        .entry(from)
                        .or_default()
                        .insert(ctx.caller, current - amount);
                }
                Ok(Outcome::new(ReturnValue::Bool(true)).event(event))
            }
            Erc20Action::Mint { to, amount } => {
                let event = self.mint(to, amount)?;
                Ok(Outcome::new(ReturnValue::None).event(event))
            }
        }
    }

    pub fn query(&self, query: &Erc20Query) -> ReturnValue {
        match query {
            Erc20Query::Name => ReturnValue::Text(self.name.clone()),
            Erc20Query::Symbol => ReturnValue::Text(self.symbol.clone()),
            Erc20Query::Decimals => ReturnValue::Uint(self.decimals as u128),
            Erc20Query::TotalSupply => ReturnValue::Uint(self.total_supply),
            Erc20Query::BalanceOf { account } => ReturnValue::Uint(self.balance_of(account)),
            Erc20Query::Allowance { owner, spender } => {
                ReturnValue::Uint(self.allowance(owner, spender))
            }
        }
    }

    pub(crate) fn mint(&mut self, to: Address, amount: u128) -> Result<Erc20Event, ContractError> {
        if to.is_zero() {
            return Err(ContractError::Custom(
                "ERC20: mint to the zero address".to_string(),
            ));
        }
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

    pub(crate) fn burn(&mut self, from: Address, amount: u128) -> Result<Erc20Event, ContractError> {
        let balance = self.balance_of(&from);
        if balance < amount {
            return Err(ContractError::InsufficientBalance);
        }
        self.balances.insert(from, balance - amount);
        self.total_supply -= amount;
        Ok(Erc20Event::Transfer {
            from,
            to: Address::ZERO,
            value: amount,
        })
    }

    fn transfer_internal(
        &mut self,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<Erc20Event, ContractError> {
        if to.is_zero() {
            return Err(ContractError::Custom(
                "ERC20: transfer to the zero address".to_string(),
            ));
        }
        let from_balance = self.balance_of(&from);
        if from_balance < amount {
            return Err(ContractError::InsufficientBalance);
        }
        self.balances.insert(from, from_balance - amount);
        // Total supply bounds every balance, so the credit cannot overflow.
        *self.balances.entry(to).or_insert(0) += amount;
        debug!("{} transfer {} -> {}: {}", self.symbol, from, to, amount);
        Ok(Erc20Event::Transfer {
            from,
            to,
            value: amount,
        })
    }
}

// ─────────────────────────────────────────────────────────────
// WRAPPED BNB
// ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum WbnbAction {
    /// Wrap the attached native value 1:1.
    Deposit,
    /// Burn wrapped tokens and pay out the same native amount.
    Withdraw {
        #[serde(with = "u128_str")]
        amount: u128,
    },
    /// Test faucet: mint unbacked wrapped tokens to the caller.
    MintTokens {
        #[serde(with = "u128_str")]
        amount: u128,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wbnb {
    pub token: MockErc20,
}

impl Default for Wbnb {
    fn default() -> Self {
        Self::new()
    }
}

impl Wbnb {
    pub fn new() -> Self {
        Self {
            token: MockErc20 {
                name: "Wrapped BNB".to_string(),
                symbol: "WBNB".to_string(),
                decimals: MOCK_DECIMALS,
                total_supply: 0,
                balances: BTreeMap::new(),
                allowances: BTreeMap::new(),
            },
        }
    }

    pub fn execute(&mut self, ctx: &CallContext, action: WbnbAction) -> Result<Outcome, ContractError> {
        match action {
            WbnbAction::Deposit => {
                let transfer = self.token.mint(ctx.caller, ctx.value)?;
                Ok(Outcome::new(ReturnValue::None)
                    .event(transfer)
                    .event(Erc20Event::Deposit {
                        dst: ctx.caller,
                        wad: ctx.value,
                    }))
            }
            WbnbAction::Withdraw { amount } => {
                let transfer = self.token.burn(ctx.caller, amount)?;
                Ok(Outcome::new(ReturnValue::None)
                    .event(transfer)
                    .event(Erc20Event::Withdrawal {
                        src: ctx.caller,
                        wad: amount,
                    })
                    .payout(ctx.caller, amount))
            }
            WbnbAction::MintTokens { amount } => {
                let transfer = self.token.mint(ctx.caller, amount)?;
                Ok(Outcome::new(ReturnValue::None).event(transfer))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Event;
    use vsbt_core::AddressExt;

    fn ctx(caller: &str) -> CallContext {
        CallContext::for_test(Address::from_label(caller), Address::from_label("token"))
    }

    fn usdt() -> MockErc20 {
        MockErc20::new(
            Address::from_label("deployer"),
            Erc20Init {
                name: "Tether USD".to_string(),
                symbol: "USDT".to_string(),
                initial_supply: 1_000,
            },
        )
    }

    #[test]
    fn test_initial_supply_to_deployer() {
        let token = usdt();
        assert_eq!(token.total_supply, 1_000);
        assert_eq!(token.balance_of(&Address::from_label("deployer")), 1_000);
        assert_eq!(token.decimals, 18);
    }

    #[test]
    fn test_transfer_moves_balance() {
        let mut token = usdt();
        let bob = Address::from_label("bob");
        let outcome = token
            .execute(&ctx("deployer"), Erc20Action::Transfer { to: bob, amount: 400 })
            .unwrap();
        assert_eq!(token.balance_of(&bob), 400);
        assert_eq!(token.balance_of(&Address::from_label("deployer")), 600);
        assert!(matches!(
            outcome.events[0],
            Event::Erc20(Erc20Event::Transfer { value: 400, .. })
        ));
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut token = usdt();
        let err = token
            .execute(
                &ctx("bob"),
                Erc20Action::Transfer {
                    to: Address::from_label("alice"),
                    amount: 1,
                },
            )
            .unwrap_err();
        assert_eq!(err, ContractError::InsufficientBalance);
    }

    #[test]
    fn test_transfer_from_requires_allowance() {
        let mut token = usdt();
        let deployer = Address::from_label("deployer");
        let router = Address::from_label("router");
        let pair = Address::from_label("pair");

        let err = token
            .execute(
                &ctx("router"),
                Erc20Action::TransferFrom { from: deployer, to: pair, amount: 10 },
            )
            .unwrap_err();
        assert_eq!(err, ContractError::InsufficientAllowance);

        token
            .execute(&ctx("deployer"), Erc20Action::Approve { spender: router, amount: 100 })
            .unwrap();
        token
            .execute(
                &ctx("router"),
                Erc20Action::TransferFrom { from: deployer, to: pair, amount: 10 },
            )
            .unwrap();
        assert_eq!(token.allowance(&deployer, &router), 90);
        assert_eq!(token.balance_of(&pair), 10);
    }

    #[test]
    fn test_unlimited_allowance_not_decremented() {
        let mut token = usdt();
        let deployer = Address::from_label("deployer");
        let router = Address::from_label("router");
        token
            .execute(
                &ctx("deployer"),
                Erc20Action::Approve { spender: router, amount: UNLIMITED_ALLOWANCE },
            )
            .unwrap();
        token
            .execute(
                &ctx("router"),
                Erc20Action::TransferFrom {
                    from: deployer,
                    to: Address::from_label("pair"),
                    amount: 500,
                },
            )
            .unwrap();
        assert_eq!(token.allowance(&deployer, &router), UNLIMITED_ALLOWANCE);
    }

    #[test]
    fn test_wbnb_deposit_and_withdraw() {
        let mut wbnb = Wbnb::new();
        let alice = Address::from_label("alice");
        let mut deposit = ctx("alice");
        deposit.value = 250;
        wbnb.execute(&deposit, WbnbAction::Deposit).unwrap();
        assert_eq!(wbnb.token.balance_of(&alice), 250);

        let outcome = wbnb
            .execute(&ctx("alice"), WbnbAction::Withdraw { amount: 100 })
            .unwrap();
        assert_eq!(outcome.payouts, vec![(alice, 100)]);
        assert_eq!(wbnb.token.balance_of(&alice), 150);
        assert_eq!(wbnb.token.total_supply, 150);
    }

    #[test]
    fn test_wbnb_withdraw_more_than_balance() {
        let mut wbnb = Wbnb::new();
        let err = wbnb
            .execute(&ctx("alice"), WbnbAction::Withdraw { amount: 1 })
            .unwrap_err();
        assert_eq!(err, ContractError::InsufficientBalance);
    }

    #[test]
    fn test_wbnb_mint_tokens_faucet() {
        let mut wbnb = Wbnb::new();
        wbnb.execute(&ctx("bob"), WbnbAction::MintTokens { amount: 7 })
            .unwrap();
        assert_eq!(wbnb.token.balance_of(&Address::from_label("bob")), 7);
    }
}
