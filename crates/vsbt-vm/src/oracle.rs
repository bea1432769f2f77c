// Pool Price Oracle
// Quotes the spot price of one side of a two-token liquidity pool in units
// of the other, read live from the pool's reserves on every call.
//
// All prices are fixed-point integers scaled by PRICE_PRECISION (1e18).
// No value is cached between calls and no f64 is involved.

use crate::error::ContractError;
use crate::math::mul_div;
use serde::{Deserialize, Serialize};
use vsbt_core::{Address, PRICE_PRECISION};

/// Snapshot of a pool's reserves, in the pool's own token order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolReserves {
    pub token0: Address,
    pub token1: Address,
    pub reserve0: u128,
    pub reserve1: u128,
}

/// Anything that can report reserves for a pool address.
/// The simulated chain implements this over its deployed pair contracts.
pub trait ReserveSource {
    fn reserves(&self, pool: &Address) -> Result<PoolReserves, ContractError>;
}

/// Spot price of the pool.
///
/// - `inverse == false`: token0 priced in token1, `PRICE_PRECISION * r1 / r0`
/// - `inverse == true`:  token1 priced in token0, `PRICE_PRECISION * r0 / r1`
pub fn quote(
    source: &dyn ReserveSource,
    pool: &Address,
    inverse: bool,
) -> Result<u128, ContractError> {
    let reserves = source.reserves(pool)?;
    if reserves.reserve0 == 0 || reserves.reserve1 == 0 {
        return Err(ContractError::NoLiquidity);
    }
    let (numerator, denominator) = if inverse {
        (reserves.reserve0, reserves.reserve1)
    } else {
        (reserves.reserve1, reserves.reserve0)
    };
    mul_div(PRICE_PRECISION, numerator, denominator).ok_or(ContractError::Overflow)
}

/// Native wei paid for one whole stable token, whichever side of the pool
/// the wrapped native token sits on.
pub fn native_per_stable(
    source: &dyn ReserveSource,
    pool: &Address,
    wrapped_native: &Address,
) -> Result<u128, ContractError> {
    let reserves = source.reserves(pool)?;
    if reserves.token0 == *wrapped_native {
        quote(source, pool, true)
    } else if reserves.token1 == *wrapped_native {
        quote(source, pool, false)
    } else {
        Err(ContractError::Custom(format!(
            "{} does not pair {}",
            pool, wrapped_native
        )))
    }
}

/// Native cost of `stable_amount` whole stable tokens at the live pool price.
pub fn native_cost(
    source: &dyn ReserveSource,
    pool: &Address,
    wrapped_native: &Address,
    stable_amount: u128,
) -> Result<u128, ContractError> {
    native_per_stable(source, pool, wrapped_native)?
        .checked_mul(stable_amount)
        .ok_or(ContractError::Overflow)
}
