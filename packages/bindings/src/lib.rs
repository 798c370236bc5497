use napi::Result as NapiResult;
use napi_derive::napi;

use refi_core::amortization::AmortizationInput;
use refi_core::compare::ComparisonInput;
use refi_core::factors::FactorTable;
use refi_core::goals::{ContributionGoalInput, GoalSimulationInput, LumpSumGoalInput};
use refi_core::invest::SidePortfolioInput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Loans
// ---------------------------------------------------------------------------

#[napi]
pub fn build_schedule(input_json: String) -> NapiResult<String> {
    let input: AmortizationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::amortization::build_schedule(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_scenarios(input_json: String) -> NapiResult<String> {
    let input: ComparisonInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::compare::compare_scenarios(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Side portfolio and factors
// ---------------------------------------------------------------------------

#[napi]
pub fn grow_portfolio(input_json: String) -> NapiResult<String> {
    let input: SidePortfolioInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::invest::simulate_side_portfolio(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn summarize_factors(input_json: String) -> NapiResult<String> {
    let table: FactorTable = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    table.validate().map_err(to_napi_error)?;
    serde_json::to_string(&table.summaries()).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[napi]
pub fn required_contribution(input_json: String) -> NapiResult<String> {
    let input: ContributionGoalInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::goals::plan_contribution(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn required_lump_sum(input_json: String) -> NapiResult<String> {
    let input: LumpSumGoalInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::goals::plan_lump_sum(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_goal(input_json: String) -> NapiResult<String> {
    let input: GoalSimulationInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = refi_core::goals::simulate_goal(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
