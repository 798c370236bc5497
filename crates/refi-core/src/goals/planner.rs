//! Solvers for "how much do I need to invest" questions.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::windows::{
    simulate_contributions, simulate_lump_sum, simulate_lump_with_contributions,
    success_probability, window_count,
};
use crate::error::RefiError;
use crate::factors::FactorTable;
use crate::invest::FactorSeries;
use crate::types::*;
use crate::RefiResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Bisection bounds for the annual contribution.
const CONTRIBUTION_LOW: Decimal = dec!(0.10);
const CONTRIBUTION_HIGH: Decimal = dec!(1000000);

/// Accepted distance between achieved and target probability.
const PROBABILITY_TOL: Decimal = dec!(0.001);

/// Bracket width at which the contribution is considered converged.
const AMOUNT_TOL: Decimal = dec!(0.000001);

const MAX_ITERATIONS: u32 = 1000;

// ---------------------------------------------------------------------------
// Solvers
// ---------------------------------------------------------------------------

fn check_probability(field: &str, value: Rate) -> RefiResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(RefiError::input(field, "Must be between 0 and 1"));
    }
    Ok(())
}

fn check_goal(goal: Money) -> RefiResult<()> {
    if goal <= Decimal::ZERO {
        return Err(RefiError::input("goal", "Goal must be positive"));
    }
    Ok(())
}

/// Smallest annual contribution whose share of successful windows is
/// within tolerance of `target_probability`.
///
/// Bisects between 0.10 and 1,000,000. When the probability never lands
/// within tolerance, returns the lowest amount found that meets the target
/// (the upper bound if none did).
pub fn required_contribution(
    series: &FactorSeries,
    goal: Money,
    years: u32,
    target_probability: Rate,
) -> RefiResult<Money> {
    check_goal(goal)?;
    check_probability("target_probability", target_probability)?;
    window_count(series, years)?;

    let mut low = CONTRIBUTION_LOW;
    let mut high = CONTRIBUTION_HIGH;
    for iteration in 0..MAX_ITERATIONS {
        let mid = (low + high) / dec!(2);
        let endings = simulate_contributions(series, mid, years)?;
        let probability = success_probability(&endings, goal);

        if (probability - target_probability).abs() <= PROBABILITY_TOL {
            debug!(iteration, amount = %mid, %probability, "contribution solved");
            return Ok(mid);
        }
        if probability < target_probability {
            low = mid;
        } else {
            high = mid;
        }
        if high - low <= AMOUNT_TOL {
            debug!(iteration, amount = %high, "contribution bracket collapsed");
            break;
        }
    }
    Ok(high)
}

/// Growth of $1 at the requested confidence: the ending multiple that
/// `confidence` of the windows meet or beat.
fn multiple_at_confidence(series: &FactorSeries, years: u32, confidence: Rate) -> RefiResult<Factor> {
    check_probability("confidence", confidence)?;
    let mut endings = simulate_lump_sum(series, Decimal::ONE, years)?;
    endings.sort();
    let n = endings.len();
    let idx = ((Decimal::ONE - confidence) * Decimal::from(n as u64))
        .floor()
        .to_usize()
        .unwrap_or(0)
        .min(n - 1);
    let multiple = endings[idx];
    if multiple <= Decimal::ZERO {
        return Err(RefiError::DivisionByZero {
            context: format!("ending multiple for series '{}'", series.name),
        });
    }
    Ok(multiple)
}

/// Single investment that reaches `goal` in `confidence` of the windows.
pub fn required_lump_sum(
    series: &FactorSeries,
    goal: Money,
    years: u32,
    confidence: Rate,
) -> RefiResult<Money> {
    check_goal(goal)?;
    Ok(goal / multiple_at_confidence(series, years, confidence)?)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

fn annual_columns(factors: &FactorTable, columns: &[String]) -> RefiResult<Vec<FactorSeries>> {
    factors.validate()?;
    let selected = factors.select(columns)?;
    if selected.is_empty() {
        return Err(RefiError::InsufficientData(
            "No factor columns supplied".into(),
        ));
    }
    selected.iter().map(|s| factors.annual(&s.name)).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionGoalInput {
    #[serde(default)]
    pub factors: FactorTable,
    /// Columns to solve for; every column when empty.
    #[serde(default)]
    pub columns: Vec<String>,
    pub goal: Money,
    pub years: u32,
    pub target_probability: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionPlan {
    pub column: String,
    pub required_contribution: Money,
    pub achieved_probability: Rate,
    pub windows: u32,
    pub median_ending_value: Money,
    pub min_ending_value: Money,
}

/// Required annual contribution per factor column.
pub fn plan_contribution(
    input: &ContributionGoalInput,
) -> RefiResult<ComputationOutput<Vec<ContributionPlan>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut plans = Vec::new();
    for series in annual_columns(&input.factors, &input.columns)? {
        let amount = required_contribution(&series, input.goal, input.years, input.target_probability)?;
        let endings = simulate_contributions(&series, amount, input.years)?;
        let achieved = success_probability(&endings, input.goal);
        if achieved + PROBABILITY_TOL < input.target_probability {
            warnings.push(format!(
                "'{}': target probability not reachable below {}; best estimate returned",
                series.name, CONTRIBUTION_HIGH
            ));
        }
        plans.push(ContributionPlan {
            column: series.name.clone(),
            required_contribution: amount,
            achieved_probability: achieved,
            windows: endings.len() as u32,
            median_ending_value: median(&endings),
            min_ending_value: endings.iter().copied().min().unwrap_or(Decimal::ZERO),
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Required Annual Contribution (bisection over rolling annual windows)",
        &serde_json::json!({
            "goal": input.goal.to_string(),
            "years": input.years,
            "target_probability": input.target_probability.to_string(),
            "basis": input.factors.basis,
        }),
        warnings,
        elapsed,
        plans,
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumpSumGoalInput {
    #[serde(default)]
    pub factors: FactorTable,
    #[serde(default)]
    pub columns: Vec<String>,
    pub goal: Money,
    pub years: u32,
    pub confidence: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumpSumPlan {
    pub column: String,
    pub required_lump_sum: Money,
    /// Growth of $1 met or beaten by `confidence` of the windows.
    pub ending_multiple: Factor,
    pub windows: u32,
}

/// Required single investment per factor column.
pub fn plan_lump_sum(input: &LumpSumGoalInput) -> RefiResult<ComputationOutput<Vec<LumpSumPlan>>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();
    check_goal(input.goal)?;

    let mut plans = Vec::new();
    for series in annual_columns(&input.factors, &input.columns)? {
        let multiple = multiple_at_confidence(&series, input.years, input.confidence)?;
        let windows = window_count(&series, input.years)? as u32;
        if windows < 12 {
            warnings.push(format!(
                "'{}': only {} historical windows available",
                series.name, windows
            ));
        }
        plans.push(LumpSumPlan {
            column: series.name.clone(),
            required_lump_sum: input.goal / multiple,
            ending_multiple: multiple,
            windows,
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Required Lump Sum at Confidence (rolling annual windows)",
        &serde_json::json!({
            "goal": input.goal.to_string(),
            "years": input.years,
            "confidence": input.confidence.to_string(),
            "basis": input.factors.basis,
        }),
        warnings,
        elapsed,
        plans,
    ))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSimulationInput {
    #[serde(default)]
    pub factors: FactorTable,
    #[serde(default)]
    pub columns: Vec<String>,
    pub initial_investment: Money,
    /// Added after each year except the last.
    #[serde(default)]
    pub annual_addition: Money,
    pub years: u32,
    pub goal: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalSimulation {
    pub column: String,
    pub windows: u32,
    pub average_ending_value: Money,
    pub median_ending_value: Money,
    pub min_ending_value: Money,
    pub max_ending_value: Money,
    pub success_probability: Rate,
}

/// Ending-value statistics of an initial investment plus annual additions.
pub fn simulate_goal(input: &GoalSimulationInput) -> RefiResult<ComputationOutput<Vec<GoalSimulation>>> {
    let start = Instant::now();
    check_goal(input.goal)?;
    if input.initial_investment < Decimal::ZERO || input.annual_addition < Decimal::ZERO {
        return Err(RefiError::input(
            "initial_investment",
            "Investments cannot be negative",
        ));
    }

    let mut results = Vec::new();
    for series in annual_columns(&input.factors, &input.columns)? {
        let endings = simulate_lump_with_contributions(
            &series,
            input.initial_investment,
            input.annual_addition,
            input.years,
        )?;
        let n = Decimal::from(endings.len() as u64);
        results.push(GoalSimulation {
            column: series.name.clone(),
            windows: endings.len() as u32,
            average_ending_value: endings.iter().copied().sum::<Decimal>() / n,
            median_ending_value: median(&endings),
            min_ending_value: endings.iter().copied().min().unwrap_or(Decimal::ZERO),
            max_ending_value: endings.iter().copied().max().unwrap_or(Decimal::ZERO),
            success_probability: success_probability(&endings, input.goal),
        });
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Goal Simulation (initial investment plus annual additions)",
        &serde_json::json!({
            "initial_investment": input.initial_investment.to_string(),
            "annual_addition": input.annual_addition.to_string(),
            "years": input.years,
            "goal": input.goal.to_string(),
        }),
        Vec::new(),
        elapsed,
        results,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factors::FactorBasis;

    fn flat(rows: usize) -> FactorSeries {
        FactorSeries::new("flat", vec![Decimal::ONE; rows])
    }

    #[test]
    fn test_lump_sum_equals_goal_without_growth() {
        let amount = required_lump_sum(&flat(120), dec!(250000), 5, dec!(0.9)).unwrap();
        assert_eq!(amount, dec!(250000));
    }

    #[test]
    fn test_lump_sum_uses_confidence_index() {
        // Four windows over one year: multiples 1, 2, 3, 4 (sorted).
        let s = FactorSeries::new("s", vec![dec!(3), dec!(1), dec!(4), dec!(2)]);
        // index floor(0.75 * 4) = 3 -> multiple 4
        assert_eq!(required_lump_sum(&s, dec!(100), 1, dec!(0.25)).unwrap(), dec!(25));
        // index floor(0.25 * 4) = 1 -> multiple 2
        assert_eq!(required_lump_sum(&s, dec!(100), 1, dec!(0.75)).unwrap(), dec!(50));
        // confidence 0 clamps to the best window
        assert_eq!(required_lump_sum(&s, dec!(100), 1, Decimal::ZERO).unwrap(), dec!(25));
    }

    #[test]
    fn test_required_contribution_without_growth() {
        // Ten flat years: the goal needs exactly goal / years per year.
        let amount = required_contribution(&flat(120), dec!(1000), 10, dec!(0.9)).unwrap();
        assert!((amount - dec!(100)).abs() < dec!(0.001));
        assert!(amount >= dec!(100));
    }

    #[test]
    fn test_required_contribution_meets_target_probability() {
        let mut factors = vec![dec!(1.08); 60];
        factors[5] = dec!(0.7);
        factors[20] = dec!(0.8);
        let s = FactorSeries::new("mixed", factors);
        let amount = required_contribution(&s, dec!(50000), 3, dec!(0.95)).unwrap();
        let endings = simulate_contributions(&s, amount, 3).unwrap();
        assert!(success_probability(&endings, dec!(50000)) + PROBABILITY_TOL >= dec!(0.95));
    }

    #[test]
    fn test_invalid_probability_rejected() {
        assert!(required_contribution(&flat(24), dec!(1000), 2, dec!(1.5)).is_err());
        assert!(required_lump_sum(&flat(24), dec!(1000), 2, dec!(-0.1)).is_err());
        assert!(required_lump_sum(&flat(24), Decimal::ZERO, 2, dec!(0.5)).is_err());
    }

    #[test]
    fn test_plan_lump_sum_per_column() {
        let input = LumpSumGoalInput {
            factors: FactorTable::new(
                FactorBasis::TrailingAnnual,
                vec![flat(36), FactorSeries::new("double", vec![dec!(2); 36])],
            ),
            columns: vec![],
            goal: dec!(1000),
            years: 2,
            confidence: dec!(0.9),
        };
        let out = plan_lump_sum(&input).unwrap();
        assert_eq!(out.result.len(), 2);
        assert_eq!(out.result[0].required_lump_sum, dec!(1000));
        assert_eq!(out.result[1].required_lump_sum, dec!(250));
        assert_eq!(out.result[1].windows, 24);
    }

    #[test]
    fn test_monthly_basis_is_compounded_to_annual() {
        let input = LumpSumGoalInput {
            factors: FactorTable::new(FactorBasis::Monthly, vec![flat(35)]),
            columns: vec!["FLAT".into()],
            goal: dec!(500),
            years: 2,
            confidence: dec!(0.5),
        };
        let out = plan_lump_sum(&input).unwrap();
        // 35 monthly rows -> 24 trailing-annual rows -> 12 two-year windows
        assert_eq!(out.result[0].windows, 12);
        assert_eq!(out.result[0].required_lump_sum, dec!(500));
    }

    #[test]
    fn test_simulate_goal_statistics() {
        let input = GoalSimulationInput {
            factors: FactorTable::new(FactorBasis::TrailingAnnual, vec![flat(24)]),
            columns: vec![],
            initial_investment: dec!(10000),
            annual_addition: dec!(10000),
            years: 2,
            goal: dec!(20000),
        };
        let out = simulate_goal(&input).unwrap();
        let sim = &out.result[0];
        assert_eq!(sim.windows, 12);
        assert_eq!(sim.average_ending_value, dec!(20000));
        assert_eq!(sim.success_probability, Decimal::ONE);
    }

    #[test]
    fn test_empty_table_is_insufficient() {
        let input = ContributionGoalInput {
            factors: FactorTable::default(),
            columns: vec![],
            goal: dec!(1000),
            years: 1,
            target_probability: dec!(0.5),
        };
        assert!(matches!(
            plan_contribution(&input).unwrap_err(),
            RefiError::InsufficientData(_)
        ));
    }
}
