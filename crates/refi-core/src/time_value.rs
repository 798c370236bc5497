use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::RefiError;
use crate::types::{Factor, Money, Rate};
use crate::RefiResult;

const ROOT_TOLERANCE: Decimal = dec!(0.0000000000001);
const MAX_ROOT_ITERATIONS: u32 = 40;

/// Monthly periodic rate from an annual nominal rate.
pub fn monthly_rate(annual_rate: Rate) -> Rate {
    annual_rate / dec!(12)
}

/// Level payment that retires `principal` over `nper` periods at
/// `periodic_rate`. Returned as a positive amount.
pub fn level_payment(principal: Money, periodic_rate: Rate, nper: u32) -> RefiResult<Money> {
    if nper == 0 {
        return Err(RefiError::InvalidInput {
            field: "nper".into(),
            reason: "Number of periods must be > 0".into(),
        });
    }

    if periodic_rate.is_zero() {
        return Ok(principal / Decimal::from(nper));
    }

    let growth = (Decimal::ONE + periodic_rate).powu(nper as u64);
    if growth.is_zero() {
        return Err(RefiError::DivisionByZero {
            context: "payment growth factor".into(),
        });
    }

    let denom = Decimal::ONE - Decimal::ONE / growth;
    if denom.is_zero() {
        return Err(RefiError::DivisionByZero {
            context: "payment annuity factor".into(),
        });
    }

    Ok(principal * periodic_rate / denom)
}

/// Positive real n-th root via Newton's method, seeded from an f64 estimate.
pub fn nth_root(x: Decimal, n: u32) -> Decimal {
    if x <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if x == Decimal::ONE || n == 0 {
        return Decimal::ONE;
    }
    if n == 1 {
        return x;
    }

    let n_dec = Decimal::from(n);
    let mut guess = x
        .to_f64()
        .map(|v| v.powf(1.0 / n as f64))
        .and_then(Decimal::from_f64)
        .filter(|g| *g > Decimal::ZERO)
        .unwrap_or(Decimal::ONE);

    for _ in 0..MAX_ROOT_ITERATIONS {
        let g_n_minus_1 = guess.powu((n - 1) as u64);
        if g_n_minus_1.is_zero() {
            break;
        }
        let delta = (g_n_minus_1 * guess - x) / (n_dec * g_n_minus_1);
        guess -= delta;
        if delta.abs() < ROOT_TOLERANCE {
            break;
        }
    }

    guess
}

/// Convert an annual growth factor to its equivalent monthly factor.
/// Non-positive factors carry no growth information and map to 1.
pub fn annual_to_monthly(annual_factor: Factor) -> Factor {
    if annual_factor <= Decimal::ZERO {
        return Decimal::ONE;
    }
    nth_root(annual_factor, 12)
}
