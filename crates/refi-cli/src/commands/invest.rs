use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use refi_core::invest::{self, SidePortfolioInput};
use refi_core::loan::MAX_TERM_MONTHS;

use super::FactorArgs;
use crate::input;

/// Arguments for growing monthly contributions along a factor series
#[derive(Args)]
pub struct GrowArgs {
    /// Path to JSON or YAML input file
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub factor_args: FactorArgs,

    /// Factor column to grow along
    #[arg(long)]
    pub column: Option<String>,

    /// Amount added at the end of every month
    #[arg(long, allow_hyphen_values = true)]
    pub monthly: Option<Decimal>,

    /// Number of months
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u32).range(1..=MAX_TERM_MONTHS as i64))]
    pub months: u32,

    /// Starting balance
    #[arg(long)]
    pub initial: Option<Decimal>,

    /// Annual fee drag (0.002 = 20 bps)
    #[arg(long)]
    pub fee_drag: Option<Decimal>,

    /// Also report the spread over every historical start month
    #[arg(long)]
    pub rolling: bool,
}

pub fn run_grow(args: GrowArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let grow_input: SidePortfolioInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let table = args
            .factor_args
            .load()?
            .ok_or("--factors <file.csv> is required (or provide --input)")?;
        let column = args
            .column
            .as_deref()
            .ok_or("--column is required (or provide --input)")?;
        let monthly = args
            .monthly
            .ok_or("--monthly is required (or provide --input)")?;

        SidePortfolioInput {
            initial_balance: args.initial.unwrap_or(Decimal::ZERO),
            contributions: vec![monthly; args.months as usize],
            series: table.monthly(column)?,
            fee_drag: args.fee_drag.unwrap_or(Decimal::ZERO),
            rolling: args.rolling,
        }
    };

    let result = invest::simulate_side_portfolio(&grow_input)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for summarising a factor file
#[derive(Args)]
pub struct FactorSummaryArgs {
    #[command(flatten)]
    pub factor_args: FactorArgs,
}

pub fn run_factor_summary(args: FactorSummaryArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = args
        .factor_args
        .load()?
        .ok_or("--factors <file.csv> is required")?;
    Ok(serde_json::to_value(table.summaries())?)
}
