// ─────────────────────────────────────────────────────────────────
// Deterministic integer math for pool accounting and price quotes.
//
// Reserves are 18-decimal amounts, so products such as `reserve * 1e18`
// or `amount0 * amount1` routinely exceed u128. Products are taken in
// U256 and only the final result has to fit back into u128.
// ─────────────────────────────────────────────────────────────────

use vsbt_core::U256;

/// `a * b / divisor` rounded down, or `None` when the divisor is zero or
/// the quotient does not fit in u128.
pub fn mul_div(a: u128, b: u128, divisor: u128) -> Option<u128> {
    if divisor == 0 {
        return None;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(divisor);
    u128::try_from(quotient).ok()
}

/// Integer square root (Newton's method).
pub fn isqrt(n: U256) -> U256 {
    if n.is_zero() {
        return U256::ZERO;
    }
    let two = U256::from(2u8);
    let mut x = n;
    let mut y = n / two + n % two;
    while y < x {
        x = y;
        y = (x + n / x) / two;
    }
    x
}

/// `floor(sqrt(a * b))` over the full 256-bit product.
pub fn sqrt_product(a: u128, b: u128) -> u128 {
    let root = isqrt(U256::from(a) * U256::from(b));
    // sqrt of a product of two u128 values always fits in u128
    u128::try_from(root).unwrap_or(u128::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_isqrt() {
        let root = |n: u64| isqrt(U256::from(n));
        assert_eq!(root(0), U256::ZERO);
        assert_eq!(root(1), U256::from(1u8));
        assert_eq!(root(2), U256::from(1u8));
        assert_eq!(root(4), U256::from(2u8));
        assert_eq!(root(1000), U256::from(31u8));
        assert_eq!(root(10000), U256::from(100u8));
    }

    #[test]
    fn test_mul_div_beyond_u128_intermediate() {
        // 1e18 * 1000e18 / 300000e18 = 1/300 ether
        let price = mul_div(E18, 1_000 * E18, 300_000 * E18).unwrap();
        assert_eq!(price, 3_333_333_333_333_333);
        let inverse = mul_div(E18, 300_000 * E18, 1_000 * E18).unwrap();
        assert_eq!(inverse, 300 * E18);
    }

    #[test]
    fn test_mul_div_rejects_zero_and_overflow() {
        assert_eq!(mul_div(1, 1, 0), None);
        assert_eq!(mul_div(u128::MAX, u128::MAX, 1), None);
    }

    #[test]
    fn test_sqrt_product_wide() {
        // sqrt(1000e18 * 1000e18) = 1000e18
        assert_eq!(sqrt_product(1_000 * E18, 1_000 * E18), 1_000 * E18);
        // sqrt(1000e18 * 300000e18) ≈ 17320.508e18
        let root = U256::from(sqrt_product(1_000 * E18, 300_000 * E18));
        let product = U256::from(1_000 * E18) * U256::from(300_000 * E18);
        assert!(root * root <= product);
        assert!((root + U256::from(1u8)) * (root + U256::from(1u8)) > product);
    }

    #[test]
    fn test_sqrt_product_extremes() {
        assert_eq!(sqrt_product(9, 16), 12);
        assert_eq!(sqrt_product(0, 16), 0);
        assert_eq!(sqrt_product(u128::MAX, u128::MAX), u128::MAX);
    }
}
