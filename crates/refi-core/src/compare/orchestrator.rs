//! Side-by-side comparison of refinance scenarios.
//!
//! Every scenario is amortized against the same property and PMI policy.
//! The first (or named) scenario is the baseline. For each alternative the
//! monthly avoided cost (baseline outflow minus alternative outflow) is
//! invested in a side portfolio, seeded with the difference in cash paid at
//! closing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

use crate::amortization::{amortize, ExtraPrincipal, Schedule, ScheduleOptions};
use crate::error::RefiError;
use crate::factors::FactorTable;
use crate::invest::{
    grow_side_portfolio, rolling_outcomes, ConstantFactor, FactorSeries, FeeDrag, GrowthModel,
    OutcomeDistribution, ReturnFactorSource, TotalReturnGrowth,
};
use crate::loan::{LoanTerms, MAX_TERM_MONTHS};
use crate::pmi::{NoPmi, PmiPolicy, StandardPmi};
use crate::property::PropertyValuation;
use crate::types::*;
use crate::RefiResult;

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One named loan option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioInput {
    pub name: String,
    pub loan: LoanTerms,
    #[serde(default)]
    pub options: ScheduleOptions,
    /// Factor column the avoided cost is invested in; cash when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub scenarios: Vec<ScenarioInput>,
    /// Baseline scenario name; the first scenario when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,
    /// Months compared; the longest schedule when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizon_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyValuation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmi: Option<StandardPmi>,
    /// Alternatives with a lower payment keep paying the baseline payment,
    /// sending the difference to principal.
    #[serde(default)]
    pub keep_payment: bool,
    #[serde(default)]
    pub factors: FactorTable,
    /// Annual fee drag applied to every portfolio factor.
    #[serde(default)]
    pub fee_drag: Rate,
    /// Replay each invested alternative over every historical start month.
    #[serde(default)]
    pub rolling: bool,
    /// Return the full schedules alongside the summaries.
    #[serde(default)]
    pub include_schedules: bool,
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A scenario's terms and the schedule they produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub terms: LoanTerms,
    pub schedule: Schedule,
}

impl Scenario {
    pub fn new(name: impl Into<String>, terms: LoanTerms, schedule: Schedule) -> Self {
        Self {
            name: name.into(),
            terms,
            schedule,
        }
    }
}

/// Monthly avoided cost of one alternative and the portfolio it funds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlternativeTrack {
    pub scenario: String,
    /// Name of the factor source the portfolio grew with.
    pub source: String,
    /// Baseline cash at closing minus the alternative's; invested at period 0.
    pub initial_investment: Money,
    /// `deltas[k]` is the avoided cost for period `k + 1`.
    pub deltas: Vec<Money>,
    /// Portfolio balance at the end of each period.
    pub portfolio: Vec<Money>,
}

impl AlternativeTrack {
    pub fn final_value(&self) -> Money {
        self.portfolio
            .last()
            .copied()
            .unwrap_or(self.initial_investment)
    }

    pub fn cumulative_delta(&self) -> Money {
        self.deltas.iter().copied().sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSummary {
    pub name: String,
    pub is_baseline: bool,
    pub monthly_payment: Money,
    pub first_month_pmi: Money,
    pub total_interest: Money,
    pub total_pmi: Money,
    pub total_outflow: Money,
    /// Outflow over the comparison horizon only.
    pub horizon_outflow: Money,
    pub upfront_cash: Money,
    pub financed_fees: Money,
    pub balance_at_horizon: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_equity_at_horizon: Option<Money>,
    /// Home equity (or negative balance without a property) plus portfolio.
    pub net_worth_at_horizon: Money,
    pub final_portfolio_value: Money,
    pub payoff_month: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmi_cancellation_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolling: Option<OutcomeDistribution>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub baseline: String,
    pub horizon_months: u32,
    /// Scenario with the highest net worth at the horizon.
    pub best_scenario: String,
    pub summaries: Vec<ScenarioSummary>,
    pub alternatives: Vec<AlternativeTrack>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedules: Option<Vec<Scenario>>,
}

// ---------------------------------------------------------------------------
// Core comparison
// ---------------------------------------------------------------------------

/// Avoided-cost tracks for every scenario except `baseline`.
///
/// `sources[i]` supplies the portfolio factors for `scenarios[i]`; the
/// baseline's entry is never read. Periods past the end of a schedule carry
/// zero outflow.
pub fn compare(
    scenarios: &[Scenario],
    baseline: usize,
    horizon_months: u32,
    sources: &[&dyn ReturnFactorSource],
    model: &dyn GrowthModel,
) -> RefiResult<Vec<AlternativeTrack>> {
    if scenarios.len() < 2 {
        return Err(RefiError::ScenarioMismatch(format!(
            "At least two scenarios are required, got {}",
            scenarios.len()
        )));
    }
    if baseline >= scenarios.len() {
        return Err(RefiError::ScenarioMismatch(format!(
            "Baseline index {baseline} out of range"
        )));
    }
    if sources.len() != scenarios.len() {
        return Err(RefiError::ScenarioMismatch(format!(
            "{} factor sources supplied for {} scenarios",
            sources.len(),
            scenarios.len()
        )));
    }
    if horizon_months == 0 {
        return Err(RefiError::input(
            "horizon_months",
            "Horizon must be at least 1 month",
        ));
    }

    let base = &scenarios[baseline];
    let base_upfront = base.terms.upfront_cash();

    let mut tracks = Vec::with_capacity(scenarios.len() - 1);
    for (idx, alt) in scenarios.iter().enumerate() {
        if idx == baseline {
            continue;
        }
        let deltas: Vec<Money> = (1..=horizon_months)
            .map(|p| base.schedule.outflow(p) - alt.schedule.outflow(p))
            .collect();
        let initial_investment = base_upfront - alt.terms.upfront_cash();
        let portfolio = grow_side_portfolio(initial_investment, &deltas, sources[idx], model)?;

        debug!(
            scenario = %alt.name,
            source = sources[idx].name(),
            %initial_investment,
            final_value = %portfolio.last().copied().unwrap_or(initial_investment),
            "alternative compared"
        );

        tracks.push(AlternativeTrack {
            scenario: alt.name.clone(),
            source: sources[idx].name().to_string(),
            initial_investment,
            deltas,
            portfolio,
        });
    }
    Ok(tracks)
}

/// Check names and locate the baseline.
fn resolve_baseline(input: &ComparisonInput) -> RefiResult<usize> {
    if input.scenarios.len() < 2 {
        return Err(RefiError::ScenarioMismatch(format!(
            "At least two scenarios are required, got {}",
            input.scenarios.len()
        )));
    }

    let mut seen = HashSet::new();
    for s in &input.scenarios {
        let name = s.name.trim();
        if name.is_empty() {
            return Err(RefiError::ScenarioMismatch(
                "Every scenario needs a name".into(),
            ));
        }
        if !seen.insert(name) {
            return Err(RefiError::ScenarioMismatch(format!(
                "Duplicate scenario name '{name}'"
            )));
        }
    }

    match &input.baseline {
        None => Ok(0),
        Some(wanted) => input
            .scenarios
            .iter()
            .position(|s| s.name.trim() == wanted.trim())
            .ok_or_else(|| {
                RefiError::ScenarioMismatch(format!("Unknown baseline scenario '{wanted}'"))
            }),
    }
}

/// Amortize every scenario, applying `keep_payment` against the baseline.
pub fn build_scenarios(
    input: &ComparisonInput,
    baseline: usize,
    pmi: &dyn PmiPolicy,
    home_values: Option<&[Money]>,
    warnings: &mut Vec<String>,
) -> RefiResult<Vec<Scenario>> {
    let base_input = &input.scenarios[baseline];
    let base_schedule = amortize(&base_input.loan, &base_input.options, pmi, home_values)?;
    let base_payment = base_schedule.monthly_payment;

    let mut scenarios = Vec::with_capacity(input.scenarios.len());
    for (idx, s) in input.scenarios.iter().enumerate() {
        if idx == baseline {
            scenarios.push(Scenario::new(
                s.name.clone(),
                s.loan.clone(),
                base_schedule.clone(),
            ));
            continue;
        }

        let mut schedule = amortize(&s.loan, &s.options, pmi, home_values)?;
        if input.keep_payment && schedule.monthly_payment < base_payment {
            let top_up = base_payment - schedule.monthly_payment;
            let options = match &s.options.extra_principal {
                ExtraPrincipal::None => Some(ScheduleOptions {
                    extra_principal: ExtraPrincipal::Monthly(top_up),
                    ..s.options.clone()
                }),
                ExtraPrincipal::Monthly(extra) => Some(ScheduleOptions {
                    extra_principal: ExtraPrincipal::Monthly(*extra + top_up),
                    ..s.options.clone()
                }),
                ExtraPrincipal::Custom(_) => {
                    warnings.push(format!(
                        "Scenario '{}' has a custom extra-principal plan; keep_payment not applied",
                        s.name
                    ));
                    None
                }
            };
            if let Some(options) = options {
                schedule = amortize(&s.loan, &options, pmi, home_values)?;
            }
        }

        debug!(
            scenario = %s.name,
            payment = %schedule.monthly_payment,
            payoff_month = schedule.payoff_month,
            "scenario amortized"
        );
        scenarios.push(Scenario::new(s.name.clone(), s.loan.clone(), schedule));
    }
    Ok(scenarios)
}

fn portfolio_source<'a>(
    series: Option<&'a FactorSeries>,
    fee_drag: Rate,
) -> Box<dyn ReturnFactorSource + 'a> {
    match series {
        Some(series) => Box::new(FeeDrag::new(series, fee_drag)),
        None => Box::new(ConstantFactor::cash()),
    }
}

fn summarize(
    scenario: &Scenario,
    is_baseline: bool,
    track: Option<&AlternativeTrack>,
    horizon_months: u32,
    home_value: Option<Money>,
    rolling: Option<OutcomeDistribution>,
) -> ScenarioSummary {
    let schedule = &scenario.schedule;
    let balance = schedule.balance_after(horizon_months);
    let portfolio = track.map(|t| t.final_value()).unwrap_or(Decimal::ZERO);
    let equity = home_value.map(|hv| hv - balance);

    ScenarioSummary {
        name: scenario.name.clone(),
        is_baseline,
        monthly_payment: schedule.monthly_payment,
        first_month_pmi: schedule.pmi(1),
        total_interest: schedule.total_interest,
        total_pmi: schedule.total_pmi,
        total_outflow: schedule.total_outflow,
        horizon_outflow: schedule.sum_through(horizon_months, |r| r.outflow()),
        upfront_cash: scenario.terms.upfront_cash(),
        financed_fees: scenario.terms.financed_fees(),
        balance_at_horizon: balance,
        home_equity_at_horizon: equity,
        net_worth_at_horizon: equity.unwrap_or(-balance) + portfolio,
        final_portfolio_value: portfolio,
        payoff_month: schedule.payoff_month,
        pmi_cancellation_month: schedule.pmi_cancellation_month,
        rolling,
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Compare refinance scenarios over a common horizon.
pub fn compare_scenarios(
    input: &ComparisonInput,
) -> RefiResult<ComputationOutput<ComparisonResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let baseline = resolve_baseline(input)?;
    if let Some(property) = &input.property {
        property.validate()?;
    }
    if let Some(pmi) = &input.pmi {
        pmi.validate()?;
        if input.property.is_none() {
            warnings.push("PMI configured without a property value; no PMI charged".into());
        }
    }
    input.factors.validate()?;
    if input.fee_drag < Decimal::ZERO || input.fee_drag > Decimal::ONE {
        warnings.push(format!("Fee drag {} outside [0, 1]; clamped", input.fee_drag));
    }
    match input.horizon_months {
        Some(0) => {
            return Err(RefiError::input(
                "horizon_months",
                "Horizon must be at least 1 month",
            ));
        }
        Some(h) if h > MAX_TERM_MONTHS => {
            return Err(RefiError::input(
                "horizon_months",
                format!("Horizon cannot exceed {MAX_TERM_MONTHS} months"),
            ));
        }
        _ => {}
    }

    let longest_term = input
        .scenarios
        .iter()
        .map(|s| s.loan.term_months)
        .max()
        .unwrap_or(0);
    let path_len = longest_term.max(input.horizon_months.unwrap_or(0));
    let home_values = input.property.as_ref().map(|p| p.value_path(path_len));

    let scenarios = match &input.pmi {
        Some(pmi) => build_scenarios(input, baseline, pmi, home_values.as_deref(), &mut warnings)?,
        None => build_scenarios(input, baseline, &NoPmi, home_values.as_deref(), &mut warnings)?,
    };

    let longest = scenarios
        .iter()
        .map(|s| s.schedule.len())
        .max()
        .unwrap_or(0);
    let horizon = input.horizon_months.unwrap_or(longest);
    if horizon < longest {
        warnings.push(format!(
            "Horizon of {horizon} months truncates schedules running to month {longest}"
        ));
    }

    // Monthly portfolio factors per alternative; the baseline never invests.
    let mut series = Vec::with_capacity(scenarios.len());
    for (idx, s) in input.scenarios.iter().enumerate() {
        series.push(match &s.portfolio {
            Some(column) if idx != baseline => Some(input.factors.monthly(column)?),
            _ => None,
        });
    }
    let sources: Vec<_> = series
        .iter()
        .map(|s| portfolio_source(s.as_ref(), input.fee_drag))
        .collect();
    let source_refs: Vec<&dyn ReturnFactorSource> = sources.iter().map(|b| b.as_ref()).collect();

    let model = TotalReturnGrowth;
    let tracks = compare(&scenarios, baseline, horizon, &source_refs, &model)?;

    for track in &tracks {
        if track.portfolio.iter().any(|v| *v < Decimal::ZERO) {
            warnings.push(format!(
                "Scenario '{}' costs more than the baseline; its side portfolio goes negative",
                track.scenario
            ));
        }
    }

    let home_value = home_values
        .as_ref()
        .filter(|v| !v.is_empty())
        .map(|v| v[(horizon as usize).clamp(1, v.len()) - 1]);

    let mut summaries = Vec::with_capacity(scenarios.len());
    let mut alt_tracks = tracks.iter();
    for (idx, scenario) in scenarios.iter().enumerate() {
        let is_baseline = idx == baseline;
        let track = if is_baseline { None } else { alt_tracks.next() };

        let rolling = match (input.rolling, track, &series[idx]) {
            (true, Some(track), Some(series)) => {
                let dist = rolling_outcomes(
                    track.initial_investment,
                    &track.deltas,
                    series,
                    input.fee_drag,
                    &model,
                )?;
                if dist.windows < 12 {
                    warnings.push(format!(
                        "Scenario '{}': only {} historical windows available",
                        scenario.name, dist.windows
                    ));
                }
                Some(dist)
            }
            _ => None,
        };

        summaries.push(summarize(
            scenario,
            is_baseline,
            track,
            horizon,
            home_value,
            rolling,
        ));
    }

    let best_scenario = summaries
        .iter()
        .max_by(|a, b| a.net_worth_at_horizon.cmp(&b.net_worth_at_horizon))
        .map(|s| s.name.clone())
        .unwrap_or_default();

    debug!(
        scenarios = scenarios.len(),
        horizon,
        best = %best_scenario,
        "comparison complete"
    );

    let result = ComparisonResult {
        baseline: scenarios[baseline].name.clone(),
        horizon_months: horizon,
        best_scenario,
        summaries,
        alternatives: tracks,
        schedules: if input.include_schedules {
            Some(scenarios)
        } else {
            None
        },
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinance Scenario Comparison (avoided cost invested in side portfolio)",
        &serde_json::json!({
            "baseline": result.baseline,
            "horizon_months": horizon,
            "keep_payment": input.keep_payment,
            "fee_drag": input.fee_drag.to_string(),
            "property": input.property.is_some(),
            "pmi": input.pmi.is_some(),
            "factor_basis": input.factors.basis,
        }),
        warnings,
        elapsed,
        result,
    ))
}
