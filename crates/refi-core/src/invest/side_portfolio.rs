//! Side-portfolio growth of monthly cash flows.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use super::growth::{GrowthModel, PortfolioState, TotalReturnGrowth};
use super::source::{require_factor, FactorSeries, FeeDrag, ReturnFactorSource};
use crate::error::RefiError;
use crate::types::*;
use crate::RefiResult;

/// Balance after each period when `contributions[k]` is added at the end
/// of period `k + 1`.
pub fn grow_side_portfolio(
    initial_balance: Money,
    contributions: &[Money],
    source: &dyn ReturnFactorSource,
    model: &dyn GrowthModel,
) -> RefiResult<Vec<Money>> {
    let mut state = PortfolioState::new(initial_balance);
    let mut trajectory = Vec::with_capacity(contributions.len());
    for (idx, cash_flow) in contributions.iter().enumerate() {
        let period = idx as u32 + 1;
        let factor = require_factor(source, period)?;
        trajectory.push(state.step(model, factor, *cash_flow));
    }
    Ok(trajectory)
}

/// Spread of final values across every historical starting month.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeDistribution {
    pub windows: u32,
    pub min: Money,
    pub median: Money,
    pub p75: Money,
    pub max: Money,
    /// Row offset of the window producing the minimum.
    pub worst_start_offset: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_start_month: Option<NaiveDate>,
}

/// Replay the same cash flows from every start row of `series` that leaves
/// enough history for the whole horizon.
pub fn rolling_outcomes(
    initial_balance: Money,
    contributions: &[Money],
    series: &FactorSeries,
    annual_fee_drag: Rate,
    model: &dyn GrowthModel,
) -> RefiResult<OutcomeDistribution> {
    let horizon = contributions.len();
    if series.len() < horizon {
        return Err(RefiError::IncompleteFactorData {
            series: series.name.clone(),
            period: series.len() as u32 + 1,
        });
    }

    let window_count = series.len() - horizon + 1;
    let mut finals = Vec::with_capacity(window_count);
    for offset in 0..window_count {
        let source = FeeDrag::new(series.window(offset), annual_fee_drag);
        let path = grow_side_portfolio(initial_balance, contributions, &source, model)?;
        finals.push(path.last().copied().unwrap_or(initial_balance));
    }

    let (worst_offset, min) = finals
        .iter()
        .copied()
        .enumerate()
        .min_by(|a, b| a.1.cmp(&b.1))
        .unwrap_or((0, initial_balance));
    let max = finals.iter().copied().max().unwrap_or(initial_balance);

    Ok(OutcomeDistribution {
        windows: window_count as u32,
        min,
        median: median(&finals),
        p75: percentile(&finals, dec!(75)),
        max,
        worst_start_offset: worst_offset as u32,
        worst_start_month: series.month_at(worst_offset),
    })
}

// ---------------------------------------------------------------------------
// Standalone entry point
// ---------------------------------------------------------------------------

/// Grow a stream of monthly contributions along a factor series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidePortfolioInput {
    #[serde(default)]
    pub initial_balance: Money,
    /// Cash added at the end of each month; its length sets the horizon.
    pub contributions: Vec<Money>,
    pub series: FactorSeries,
    /// Annual fee drag applied to every factor (0.002 = 20 bps).
    #[serde(default)]
    pub fee_drag: Rate,
    /// Also replay the contributions over every historical start month.
    #[serde(default)]
    pub rolling: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SidePortfolioOutput {
    pub trajectory: Vec<Money>,
    pub final_value: Money,
    pub total_contributed: Money,
    pub growth: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling: Option<OutcomeDistribution>,
}

/// Side-portfolio simulation from the first row of the series, optionally
/// with the rolling-window distribution.
pub fn simulate_side_portfolio(
    input: &SidePortfolioInput,
) -> RefiResult<ComputationOutput<SidePortfolioOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.contributions.is_empty() {
        return Err(RefiError::input(
            "contributions",
            "At least one monthly contribution is required",
        ));
    }
    input.series.validate()?;
    if input.fee_drag < Decimal::ZERO || input.fee_drag > Decimal::ONE {
        warnings.push(format!(
            "Fee drag {} outside [0, 1]; clamped",
            input.fee_drag
        ));
    }

    let model = TotalReturnGrowth;
    let source = FeeDrag::new(&input.series, input.fee_drag);
    let trajectory = grow_side_portfolio(input.initial_balance, &input.contributions, &source, &model)?;
    let final_value = trajectory.last().copied().unwrap_or(input.initial_balance);
    let total_contributed = input.initial_balance + input.contributions.iter().copied().sum::<Decimal>();

    let rolling = if input.rolling {
        let dist = rolling_outcomes(
            input.initial_balance,
            &input.contributions,
            &input.series,
            input.fee_drag,
            &model,
        )?;
        if dist.windows < 12 {
            warnings.push(format!(
                "Only {} historical windows available; distribution is thin",
                dist.windows
            ));
        }
        Some(dist)
    } else {
        None
    };

    let output = SidePortfolioOutput {
        trajectory,
        final_value,
        total_contributed,
        growth: final_value - total_contributed,
        rolling,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Side Portfolio Growth (monthly total-return factors)",
        &serde_json::json!({
            "series": input.series.name,
            "months": input.contributions.len(),
            "fee_drag": input.fee_drag.to_string(),
            "rolling": input.rolling,
        }),
        warnings,
        elapsed,
        output,
    ))
}
