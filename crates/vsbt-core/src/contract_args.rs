//! Positional constructor arguments of the VSTB contract.
//!
//! Update this list if the contract constructor changes: the order here is
//! the order the deploy command passes them and the order block explorers
//! decode them during source verification.

use crate::{Address, CollectionConfig};
use alloy_sol_types::SolValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorArgs {
    pub wrapped_native: Address,
    pub pool: Address,
    pub creator: Address,
    pub plan_a: Address,
    pub token_name: String,
    pub token_symbol: String,
}

impl ConstructorArgs {
    pub fn from_config(config: &CollectionConfig) -> Self {
        Self {
            wrapped_native: config.bnb_token,
            pool: config.usdt_bnb_lp_token,
            creator: config.creator_address,
            plan_a: config.plan_a_address,
            token_name: config.token_name.clone(),
            token_symbol: config.token_symbol.clone(),
        }
    }

    /// Arguments in constructor order, rendered for display.
    pub fn to_strings(&self) -> Vec<String> {
        vec![
            self.wrapped_native.to_string(),
            self.pool.to_string(),
            self.creator.to_string(),
            self.plan_a.to_string(),
            self.token_name.clone(),
            self.token_symbol.clone(),
        ]
    }

    /// Solidity ABI encoding of `(address,address,address,address,string,string)`,
    /// hex without `0x`, as submitted with explorer verification requests.
    pub fn abi_encode(&self) -> String {
        let params = (
            self.wrapped_native,
            self.pool,
            self.creator,
            self.plan_a,
            self.token_name.clone(),
            self.token_symbol.clone(),
        );
        hex::encode(params.abi_encode_params())
    }
}
