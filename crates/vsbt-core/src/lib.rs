// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// VODA SOUL-BOUND TOKEN (VSTB) - CORE MODULE
//
// Shared primitives: 20-byte addresses, wei/ether units, sale constants,
// collection configuration and the positional constructor-argument list.
// All currency arithmetic uses u128 wei units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub mod collection_config;
pub mod contract_args;
pub mod error;
pub mod units;

pub use alloy_primitives::{Address, U256};
pub use collection_config::{
    BlockExplorer, CollectionConfig, NetworkConfig, NetworkKind, SaleConfig,
};
pub use contract_args::ConstructorArgs;
pub use error::{AddressError, ConfigError, UnitsError};

/// 1 ether (BNB) = 10^18 wei
pub const WEI_PER_ETHER: u128 = 1_000_000_000_000_000_000;

/// Native cost shown before the first paid mint: 0.01 BNB
pub const DEFAULT_COST_WEI: u128 = WEI_PER_ETHER / 100;

/// Mint cost in whole stable-token units (10 USDT)
pub const DEFAULT_STABLE_COST: u128 = 10;

/// Share of the mint cost credited per inviter level (percent)
pub const DEFAULT_REWARD_PERCENT: u8 = 10;

/// Inviter levels rewarded by default: the direct inviter and theirs
pub const DEFAULT_REWARD_LEVELS: usize = 2;

/// Fixed-point scale of pool price quotes (one whole token = 10^18)
pub const PRICE_PRECISION: u128 = WEI_PER_ETHER;

/// Appended to `baseTokenURI + id` when resolving metadata
pub const TOKEN_URI_SUFFIX: &str = ".json";

/// Longest accepted token symbol
pub const MAX_SYMBOL_LEN: usize = 11;

/// BNB Smart Chain identifiers
pub const BSC_MAINNET_CHAIN_ID: u64 = 56;
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;

// ─────────────────────────────────────────────────────────────────
// ADDRESS
// ─────────────────────────────────────────────────────────────────

/// Local-chain helpers on top of [`Address`].
pub trait AddressExt {
    /// Stable account derived from a human label: first 20 bytes of blake3(label).
    /// Test suites use this to name actors (`alice`, `bob`, ...).
    fn from_label(label: &str) -> Self;
}

impl AddressExt for Address {
    fn from_label(label: &str) -> Self {
        let hash = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.as_bytes()[0..20]);
        Address::from(bytes)
    }
}

/// Parse a user-supplied `0x`-prefixed address. Checksummed and
/// lower/upper-case input are all accepted.
pub fn parse_address(input: &str) -> Result<Address, AddressError> {
    let trimmed = input.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(AddressError::MissingPrefix(trimmed.to_string()));
    }
    trimmed[2..]
        .parse::<Address>()
        .map_err(|e| AddressError::Invalid {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_roundtrip_display() {
        let addr = parse_address("0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c").unwrap();
        // Display is EIP-55 checksummed
        assert_eq!(
            addr.to_string(),
            "0xbb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"
        );
        assert_eq!(parse_address(&addr.to_string()).unwrap(), addr);
    }

    #[test]
    fn test_address_rejects_missing_prefix() {
        let err = parse_address("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c").unwrap_err();
        assert!(matches!(err, AddressError::MissingPrefix(_)));
    }

    #[test]
    fn test_address_rejects_bad_length() {
        let err = parse_address("0x1234").unwrap_err();
        assert!(matches!(err, AddressError::Invalid { .. }));
    }

    #[test]
    fn test_address_rejects_non_hex() {
        let err = parse_address("0xzz4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c").unwrap_err();
        assert!(matches!(err, AddressError::Invalid { .. }));
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert_eq!(
            Address::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
        assert!(!Address::from_label("alice").is_zero());
    }

    #[test]
    fn test_from_label_is_stable() {
        assert_eq!(Address::from_label("alice"), Address::from_label("alice"));
        assert_ne!(Address::from_label("alice"), Address::from_label("bob"));
    }

    #[test]
    fn test_contract_address_depends_on_nonce() {
        let deployer = Address::from_label("owner");
        let a = deployer.create(0);
        let b = deployer.create(1);
        assert_ne!(a, b);
        assert_eq!(a, deployer.create(0));
    }

    #[test]
    fn test_address_json_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(Address::from_label("carol"), 42u64);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::BTreeMap<Address, u64> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_default_cost_is_one_hundredth() {
        assert_eq!(DEFAULT_COST_WEI, 10_000_000_000_000_000);
    }
}
