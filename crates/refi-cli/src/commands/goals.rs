use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use refi_core::goals::{
    self, ContributionGoalInput, GoalSimulationInput, LumpSumGoalInput,
};

use super::FactorArgs;
use crate::input;

/// Arguments for the required annual contribution
#[derive(Args)]
pub struct GoalContributionArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub factor_args: FactorArgs,

    /// Factor columns to solve for (comma-separated; all when omitted)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Target ending value
    #[arg(long)]
    pub goal: Option<Decimal>,

    /// Years of saving
    #[arg(long)]
    pub years: Option<u32>,

    /// Required share of historical windows reaching the goal
    #[arg(long, default_value = "0.9")]
    pub target: Decimal,
}

pub fn run_goal_contribution(args: GoalContributionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut goal_input: ContributionGoalInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ContributionGoalInput {
            factors: Default::default(),
            columns: args.columns.clone(),
            goal: args.goal.ok_or("--goal is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            target_probability: args.target,
        }
    };
    if let Some(table) = args.factor_args.load()? {
        goal_input.factors = table;
    }

    let result = goals::plan_contribution(&goal_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for the required lump sum
#[derive(Args)]
pub struct GoalLumpSumArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub factor_args: FactorArgs,

    /// Factor columns to solve for (comma-separated; all when omitted)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Target ending value
    #[arg(long)]
    pub goal: Option<Decimal>,

    /// Years invested
    #[arg(long)]
    pub years: Option<u32>,

    /// Share of historical windows that must reach the goal
    #[arg(long, default_value = "0.9")]
    pub confidence: Decimal,
}

pub fn run_goal_lump_sum(args: GoalLumpSumArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut goal_input: LumpSumGoalInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        LumpSumGoalInput {
            factors: Default::default(),
            columns: args.columns.clone(),
            goal: args.goal.ok_or("--goal is required (or provide --input)")?,
            years: args.years.ok_or("--years is required (or provide --input)")?,
            confidence: args.confidence,
        }
    };
    if let Some(table) = args.factor_args.load()? {
        goal_input.factors = table;
    }

    let result = goals::plan_lump_sum(&goal_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for simulating an initial investment plus annual additions
#[derive(Args)]
pub struct GoalSimulateArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub factor_args: FactorArgs,

    /// Factor columns to simulate (comma-separated; all when omitted)
    #[arg(long, value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Amount invested at the start
    #[arg(long)]
    pub initial: Option<Decimal>,

    /// Amount added after each year (defaults to the initial amount)
    #[arg(long)]
    pub addition: Option<Decimal>,

    /// Years invested
    #[arg(long, default_value_t = 30)]
    pub years: u32,

    /// Ending value counted as success
    #[arg(long, default_value = "1000000")]
    pub goal: Decimal,
}

pub fn run_goal_simulate(args: GoalSimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut sim_input: GoalSimulationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let initial = args.initial.unwrap_or(dec!(10000));
        GoalSimulationInput {
            factors: Default::default(),
            columns: args.columns.clone(),
            initial_investment: initial,
            annual_addition: args.addition.unwrap_or(initial),
            years: args.years,
            goal: args.goal,
        }
    };
    if let Some(table) = args.factor_args.load()? {
        sim_input.factors = table;
    }

    let result = goals::simulate_goal(&sim_input)?;
    Ok(serde_json::to_value(result)?)
}
