use crate::error::ConfigError;
use crate::{
    parse_address, Address, BSC_MAINNET_CHAIN_ID, BSC_TESTNET_CHAIN_ID, DEFAULT_COST_WEI,
    DEFAULT_REWARD_LEVELS, DEFAULT_REWARD_PERCENT, DEFAULT_STABLE_COST, MAX_SYMBOL_LEN,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Serde adapter for u128 ↔ TOML: serialize as string, deserialize from string or integer.
/// TOML crate doesn't natively support u128, so we round-trip through strings.
mod u128_toml {
    use super::*;

    pub fn serialize<S: Serializer>(val: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        use serde::de::{self, Visitor};
        struct U128Visitor;

        impl<'de> Visitor<'de> for U128Visitor {
            type Value = u128;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a u128 as a string or integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<u128, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<u128, E> {
                Ok(v as u128)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<u128, E> {
                if v >= 0 {
                    Ok(v as u128)
                } else {
                    Err(E::custom("negative value for u128"))
                }
            }
        }

        d.deserialize_any(U128Visitor)
    }
}

// ─────────────────────────────────────────────────────────────────
// NETWORKS
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockExplorer {
    pub name: String,
    /// Human-facing site, e.g. https://bscscan.com
    pub url: String,
    /// Etherscan-compatible API endpoint used for source verification
    pub api_url: String,
}

impl BlockExplorer {
    pub fn contract_url(&self, address: &Address) -> String {
        format!("{}/address/{}", self.url.trim_end_matches('/'), address)
    }

    pub fn transaction_url(&self, hash: &str) -> String {
        format!("{}/tx/{}", self.url.trim_end_matches('/'), hash)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    pub chain_id: u64,
    /// Native currency ticker
    pub symbol: String,
    pub rpc_url: String,
    pub block_explorer: BlockExplorer,
}

impl NetworkConfig {
    pub fn bsc_testnet() -> Self {
        Self {
            name: "BNB Smart Chain Testnet".to_string(),
            chain_id: BSC_TESTNET_CHAIN_ID,
            symbol: "tBNB".to_string(),
            rpc_url: "https://data-seed-prebsc-1-s1.binance.org:8545".to_string(),
            block_explorer: BlockExplorer {
                name: "BscScan (Testnet)".to_string(),
                url: "https://testnet.bscscan.com".to_string(),
                api_url: "https://api-testnet.bscscan.com/api".to_string(),
            },
        }
    }

    pub fn bsc_mainnet() -> Self {
        Self {
            name: "BNB Smart Chain".to_string(),
            chain_id: BSC_MAINNET_CHAIN_ID,
            symbol: "BNB".to_string(),
            rpc_url: "https://bsc-dataseed.binance.org".to_string(),
            block_explorer: BlockExplorer {
                name: "BscScan".to_string(),
                url: "https://bscscan.com".to_string(),
                api_url: "https://api.bscscan.com/api".to_string(),
            },
        }
    }

    pub fn contract_url(&self, address: &Address) -> String {
        self.block_explorer.contract_url(address)
    }

    pub fn transaction_url(&self, hash: &str) -> String {
        self.block_explorer.transaction_url(hash)
    }

    fn validate(&self, label: &str) -> Result<(), ConfigError> {
        if self.name.is_empty() {
            return Err(ConfigError::Invalid(format!("{}: name cannot be empty", label)));
        }
        if self.chain_id == 0 {
            return Err(ConfigError::Invalid(format!("{}: chain_id must be > 0", label)));
        }
        if !self.rpc_url.starts_with("http") {
            return Err(ConfigError::Invalid(format!(
                "{}: rpc_url must be an http(s) URL",
                label
            )));
        }
        if !self.block_explorer.api_url.starts_with("http") {
            return Err(ConfigError::Invalid(format!(
                "{}: block_explorer.api_url must be an http(s) URL",
                label
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkKind {
    Testnet,
    Mainnet,
}

impl Default for NetworkKind {
    #[cfg(feature = "mainnet")]
    fn default() -> Self {
        NetworkKind::Mainnet
    }

    #[cfg(not(feature = "mainnet"))]
    fn default() -> Self {
        NetworkKind::Testnet
    }
}

impl FromStr for NetworkKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(NetworkKind::Testnet),
            "mainnet" => Ok(NetworkKind::Mainnet),
            other => Err(ConfigError::Invalid(format!(
                "unknown network `{}` (expected testnet or mainnet)",
                other
            ))),
        }
    }
}

impl fmt::Display for NetworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkKind::Testnet => f.write_str("testnet"),
            NetworkKind::Mainnet => f.write_str("mainnet"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// SALE PARAMETERS
// ─────────────────────────────────────────────────────────────────

/// Pricing and referral parameters handed to the contract at deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleConfig {
    /// Native cost reported before the first paid mint (wei)
    #[serde(with = "u128_toml")]
    pub initial_cost_wei: u128,
    /// Mint price in whole stable-token units, converted to native at the
    /// pool price on every paid mint
    #[serde(with = "u128_toml")]
    pub stable_cost: u128,
    /// Percent of the mint cost credited per inviter level (index 0 = direct inviter)
    pub reward_percents: Vec<u8>,
}

impl Default for SaleConfig {
    fn default() -> Self {
        Self {
            initial_cost_wei: DEFAULT_COST_WEI,
            stable_cost: DEFAULT_STABLE_COST,
            reward_percents: vec![DEFAULT_REWARD_PERCENT; DEFAULT_REWARD_LEVELS],
        }
    }
}

impl SaleConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_cost_wei == 0 {
            return Err(ConfigError::Invalid(
                "sale.initial_cost_wei must be > 0".to_string(),
            ));
        }
        if self.stable_cost == 0 {
            return Err(ConfigError::Invalid(
                "sale.stable_cost must be > 0".to_string(),
            ));
        }
        if self.reward_percents.is_empty() {
            return Err(ConfigError::Invalid(
                "sale.reward_percents needs at least one level".to_string(),
            ));
        }
        let total: u32 = self.reward_percents.iter().map(|p| *p as u32).sum();
        if total > 100 {
            return Err(ConfigError::Invalid(format!(
                "sale.reward_percents sum to {}% (max 100%)",
                total
            )));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// COLLECTION
// ─────────────────────────────────────────────────────────────────

/// Everything the deploy script needs to know about the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub contract_name: String,
    pub token_name: String,
    pub token_symbol: String,
    /// Wrapped native token (WBNB)
    pub bnb_token: Address,
    /// USDT/WBNB liquidity pool used as the price oracle
    pub usdt_bnb_lp_token: Address,
    pub creator_address: Address,
    pub plan_a_address: Address,
    /// Filled in once the contract is deployed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub sale: SaleConfig,
    pub testnet: NetworkConfig,
    pub mainnet: NetworkConfig,
}

fn known_address(s: &str) -> Address {
    parse_address(s).unwrap_or(Address::ZERO)
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            contract_name: "VODAVSTB".to_string(),
            token_name: "VODA SBT".to_string(),
            token_symbol: "VSTB".to_string(),
            bnb_token: known_address("0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"),
            usdt_bnb_lp_token: known_address("0x16b9a82891338f9bA80E2D6970FddA79D1eb0daE"),
            creator_address: known_address("0x729816eD59Ac14C3Fced1051d80c89eeDA7eF54d"),
            plan_a_address: known_address("0x0e5b5603ebc3c1841a0b2ce1e7afc081c50ca310"),
            contract_address: None,
            sale: SaleConfig::default(),
            testnet: NetworkConfig::bsc_testnet(),
            mainnet: NetworkConfig::bsc_mainnet(),
        }
    }
}

impl CollectionConfig {
    /// Load collection config from TOML file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: CollectionConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save collection config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(())
    }

    /// Apply `VSBT_*` environment variables on top of the file values.
    /// Useful for CI deployments where addresses differ per environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an injectable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("VSBT_CONTRACT_ADDRESS") {
            self.contract_address = Some(parse_address(&v)?);
        }
        if let Some(v) = non_empty("VSBT_CREATOR_ADDRESS") {
            self.creator_address = parse_address(&v)?;
        }
        if let Some(v) = non_empty("VSBT_PLAN_A_ADDRESS") {
            self.plan_a_address = parse_address(&v)?;
        }
        if let Some(v) = non_empty("VSBT_TESTNET_RPC_URL") {
            self.testnet.rpc_url = v;
        }
        if let Some(v) = non_empty("VSBT_MAINNET_RPC_URL") {
            self.mainnet.rpc_url = v;
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contract_name.is_empty() {
            return Err(ConfigError::Invalid("contract_name cannot be empty".to_string()));
        }
        if self.token_name.is_empty() {
            return Err(ConfigError::Invalid("token_name cannot be empty".to_string()));
        }
        if self.token_symbol.is_empty() || self.token_symbol.len() > MAX_SYMBOL_LEN {
            return Err(ConfigError::Invalid(format!(
                "token_symbol must be 1-{} characters",
                MAX_SYMBOL_LEN
            )));
        }
        for (field, addr) in [
            ("bnb_token", &self.bnb_token),
            ("usdt_bnb_lp_token", &self.usdt_bnb_lp_token),
            ("creator_address", &self.creator_address),
            ("plan_a_address", &self.plan_a_address),
        ] {
            if addr.is_zero() {
                return Err(ConfigError::Invalid(format!(
                    "{} cannot be the zero address",
                    field
                )));
            }
        }
        self.sale.validate()?;
        self.testnet.validate("testnet")?;
        self.mainnet.validate("mainnet")?;
        Ok(())
    }

    pub fn network(&self, kind: NetworkKind) -> &NetworkConfig {
        match kind {
            NetworkKind::Testnet => &self.testnet,
            NetworkKind::Mainnet => &self.mainnet,
        }
    }
}
