//! Decimal ⇄ wei conversion (`parseEther` / `formatEther`).
//!
//! Conversion itself is done by `alloy_primitives::utils` over U256; this
//! module narrows the result to the u128 wei amounts the chain keeps and
//! renders the shortest exact decimal.

use crate::error::UnitsError;
use alloy_primitives::{utils, U256};

/// Decimals of the native currency and of every mock ERC20.
pub const ETHER_DECIMALS: u32 = 18;

/// Parse an ether-denominated decimal string into wei.
pub fn parse_ether(value: &str) -> Result<u128, UnitsError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(UnitsError::Empty);
    }

    let (whole, frac) = value.split_once('.').unwrap_or((value, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(UnitsError::Invalid(value.to_string()));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UnitsError::Invalid(value.to_string()));
    }
    if frac.len() > ETHER_DECIMALS as usize {
        return Err(UnitsError::TooPrecise {
            input: value.to_string(),
            decimals: ETHER_DECIMALS,
        });
    }

    // ".5" and "1." are accepted; alloy wants both sides present
    let whole = if whole.is_empty() { "0" } else { whole };
    let normalized = if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac)
    };
    let wei = utils::parse_ether(&normalized)
        .map_err(|_| UnitsError::Overflow(value.to_string()))?;
    u128::try_from(wei).map_err(|_| UnitsError::Overflow(value.to_string()))
}

/// Render wei as ether, without trailing fractional zeros.
pub fn format_ether(wei: u128) -> String {
    let full = utils::format_ether(U256::from(wei));
    match full.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ether_fractions() {
        assert_eq!(parse_ether("0.01").unwrap(), 10_000_000_000_000_000);
        assert_eq!(parse_ether("1").unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(parse_ether(".5").unwrap(), 500_000_000_000_000_000);
        assert_eq!(parse_ether("1.").unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(
            parse_ether("0.003333333333333333").unwrap(),
            3_333_333_333_333_333
        );
        assert_eq!(
            parse_ether("300000").unwrap(),
            300_000 * 1_000_000_000_000_000_000
        );
    }

    #[test]
    fn test_parse_ether_rejects_garbage() {
        assert_eq!(parse_ether(""), Err(UnitsError::Empty));
        assert!(matches!(parse_ether("."), Err(UnitsError::Invalid(_))));
        assert!(matches!(parse_ether("-1"), Err(UnitsError::Invalid(_))));
        assert!(matches!(parse_ether("1e18"), Err(UnitsError::Invalid(_))));
        assert!(matches!(
            parse_ether("0.0000000000000000001"),
            Err(UnitsError::TooPrecise { .. })
        ));
    }

    #[test]
    fn test_parse_ether_overflows_u128() {
        let huge = "9".repeat(40);
        assert!(matches!(parse_ether(&huge), Err(UnitsError::Overflow(_))));
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(0), "0");
        assert_eq!(format_ether(10_000_000_000_000_000), "0.01");
        assert_eq!(format_ether(33_333_333_333_333_333), "0.033333333333333333");
        assert_eq!(format_ether(2 * 1_000_000_000_000_000_000), "2");
    }

    #[test]
    fn test_format_then_parse_is_exact() {
        for wei in [1u128, 999, 10_000_000_000_000_000, 123_456_789_012_345_678_901] {
            assert_eq!(parse_ether(&format_ether(wei)).unwrap(), wei);
        }
    }
}
