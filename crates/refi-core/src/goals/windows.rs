use rust_decimal::Decimal;

use crate::error::RefiError;
use crate::invest::FactorSeries;
use crate::types::{Factor, Money, Rate};
use crate::RefiResult;

/// Rows between consecutive annual observations in a monthly-observed series.
pub const ROWS_PER_YEAR: usize = 12;

/// Number of start rows leaving room for `years` annual steps.
pub fn window_count(series: &FactorSeries, years: u32) -> RefiResult<usize> {
    if years == 0 {
        return Err(RefiError::input("years", "At least one year is required"));
    }
    let span = ROWS_PER_YEAR * (years as usize - 1);
    if series.len() <= span {
        return Err(RefiError::InsufficientData(format!(
            "Series '{}' has {} rows; {} years need at least {}",
            series.name,
            series.len(),
            years,
            span + 1
        )));
    }
    Ok(series.len() - span)
}

/// Fold `step(value, year, factor)` over each window's annual factors.
fn fold_windows(
    series: &FactorSeries,
    years: u32,
    initial: Money,
    step: impl Fn(Money, u32, Factor) -> Money,
) -> RefiResult<Vec<Money>> {
    let windows = window_count(series, years)?;
    Ok((0..windows)
        .map(|start| {
            (0..years).fold(initial, |value, year| {
                let factor = series.factors[start + ROWS_PER_YEAR * year as usize];
                step(value, year, factor)
            })
        })
        .collect())
}

/// Ending value per window when `annual_contribution` is invested at the
/// start of every year: v = (v + c) × f.
pub fn simulate_contributions(
    series: &FactorSeries,
    annual_contribution: Money,
    years: u32,
) -> RefiResult<Vec<Money>> {
    fold_windows(series, years, Decimal::ZERO, |v, _, f| {
        (v + annual_contribution) * f
    })
}

/// Ending value per window of a single investment.
pub fn simulate_lump_sum(series: &FactorSeries, initial: Money, years: u32) -> RefiResult<Vec<Money>> {
    fold_windows(series, years, initial, |v, _, f| v * f)
}

/// Ending value per window of an initial investment grown each year, with
/// `annual_addition` added after every year but the last.
pub fn simulate_lump_with_contributions(
    series: &FactorSeries,
    initial: Money,
    annual_addition: Money,
    years: u32,
) -> RefiResult<Vec<Money>> {
    fold_windows(series, years, initial, |v, year, f| {
        let grown = v * f;
        if year + 1 < years {
            grown + annual_addition
        } else {
            grown
        }
    })
}

/// Share of `values` at or above `goal`; zero when there are none.
pub fn success_probability(values: &[Money], goal: Money) -> Rate {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let hits = values.iter().filter(|v| **v >= goal).count();
    Decimal::from(hits as u64) / Decimal::from(values.len() as u64)
}
