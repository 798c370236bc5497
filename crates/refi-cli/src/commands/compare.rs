use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use refi_core::amortization::ScheduleOptions;
use refi_core::compare::{self, ComparisonInput, ScenarioInput};
use refi_core::factors::FactorTable;
use refi_core::loan::LoanTerms;

use super::{FactorArgs, PmiArgs, PropertyArgs};
use crate::input;

/// Arguments for comparing the current loan with refinance options
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON or YAML input file with any number of scenarios
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub factor_args: FactorArgs,

    /// Remaining balance on the current loan
    #[arg(long)]
    pub balance: Option<Decimal>,

    /// Current annual rate as a decimal
    #[arg(long)]
    pub current_rate: Option<Decimal>,

    /// Months remaining on the current loan
    #[arg(long, default_value_t = 360)]
    pub current_term: u32,

    /// Actual monthly principal-and-interest payment on the current loan
    #[arg(long)]
    pub current_payment: Option<Decimal>,

    /// Refinance annual rate as a decimal
    #[arg(long)]
    pub refi_rate: Option<Decimal>,

    /// Refinance term in months
    #[arg(long, default_value_t = 360)]
    pub refi_term: u32,

    /// Refinance closing fees
    #[arg(long)]
    pub fees: Option<Decimal>,

    /// Refinance discount points as a fraction of the balance
    #[arg(long)]
    pub points: Option<Decimal>,

    /// Roll refinance fees and points into the new loan
    #[arg(long)]
    pub finance_fees: bool,

    /// Factor column the refinance savings are invested in
    #[arg(long)]
    pub portfolio: Option<String>,

    /// Baseline scenario name (defaults to the first)
    #[arg(long)]
    pub baseline: Option<String>,

    /// Months to compare (defaults to the longest schedule)
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Keep paying the baseline payment, sending savings to principal
    #[arg(long)]
    pub keep_payment: bool,

    /// Replay savings over every historical start month
    #[arg(long)]
    pub rolling: bool,

    /// Annual fee drag on investment factors (0.002 = 20 bps)
    #[arg(long)]
    pub fee_drag: Option<Decimal>,

    /// Include full schedules in the output
    #[arg(long)]
    pub include_schedules: bool,

    #[command(flatten)]
    pub property: PropertyArgs,

    #[command(flatten)]
    pub pmi: PmiArgs,
}

fn scenarios_from_flags(args: &CompareArgs) -> Result<Vec<ScenarioInput>, Box<dyn std::error::Error>> {
    let balance = args
        .balance
        .ok_or("--balance is required (or provide --input)")?;
    let current_rate = args
        .current_rate
        .ok_or("--current-rate is required (or provide --input)")?;
    let refi_rate = args
        .refi_rate
        .ok_or("--refi-rate is required (or provide --input)")?;

    let current = ScenarioInput {
        name: "current".into(),
        loan: LoanTerms::new(balance, current_rate, args.current_term),
        options: ScheduleOptions {
            payment_override: args.current_payment,
            ..ScheduleOptions::default()
        },
        portfolio: None,
    };
    let refi = ScenarioInput {
        name: "refi".into(),
        loan: LoanTerms::new(balance, refi_rate, args.refi_term).with_fees(
            args.fees.unwrap_or(Decimal::ZERO),
            args.points.unwrap_or(Decimal::ZERO),
            args.finance_fees,
        ),
        options: ScheduleOptions::default(),
        portfolio: args.portfolio.clone(),
    };
    Ok(vec![current, refi])
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut cmp_input: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        ComparisonInput {
            scenarios: scenarios_from_flags(&args)?,
            baseline: None,
            horizon_months: None,
            property: args.property.valuation(),
            pmi: args.pmi.policy(),
            keep_payment: false,
            factors: FactorTable::default(),
            fee_drag: Decimal::ZERO,
            rolling: false,
            include_schedules: false,
        }
    };

    // Flags refine whatever came from the file.
    if let Some(table) = args.factor_args.load()? {
        cmp_input.factors = table;
    }
    if args.baseline.is_some() {
        cmp_input.baseline = args.baseline.clone();
    }
    if args.horizon.is_some() {
        cmp_input.horizon_months = args.horizon;
    }
    if let Some(drag) = args.fee_drag {
        cmp_input.fee_drag = drag;
    }
    cmp_input.keep_payment |= args.keep_payment;
    cmp_input.rolling |= args.rolling;
    cmp_input.include_schedules |= args.include_schedules;

    let result = compare::compare_scenarios(&cmp_input)?;
    Ok(serde_json::to_value(result)?)
}
