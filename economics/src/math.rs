//! Fixed-point helpers

use primitive_types::U256;

use crate::constants::SCALE_EXPONENT;
use crate::error::{EconomicsError, Result};

/// Reward index scale factor (10^36)
pub fn scale() -> U256 {
    U256::exp10(SCALE_EXPONENT)
}

/// Narrow a 256-bit value back to u128
pub fn to_u128(value: U256, context: &str) -> Result<u128> {
    if value > U256::from(u128::MAX) {
        return Err(EconomicsError::ArithmeticOverflow(context.to_string()));
    }
    Ok(value.as_u128())
}

/// `a * b / c` with a 256-bit intermediate, floored. Zero divisor yields zero.
pub fn mul_div(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Ok(0);
    }
    let product = U256::from(a)
        .checked_mul(U256::from(b))
        .ok_or_else(|| EconomicsError::ArithmeticOverflow("mul_div product".to_string()))?;
    to_u128(product / U256::from(c), "mul_div quotient")
}
