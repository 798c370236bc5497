use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use refi_core::amortization::{self, AmortizationInput, ExtraPrincipal, ScheduleOptions};
use refi_core::loan::LoanTerms;

use super::{PmiArgs, PropertyArgs};
use crate::input;

/// Arguments for a single-loan amortization schedule
#[derive(Args)]
pub struct AmortizeArgs {
    /// Path to JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan amount
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a decimal (0.06 = 6%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Number of monthly payments
    #[arg(long, default_value_t = 360)]
    pub term_months: u32,

    /// Origination and closing fees
    #[arg(long)]
    pub fees: Option<Decimal>,

    /// Discount points as a fraction of the loan (0.01 = one point)
    #[arg(long)]
    pub points: Option<Decimal>,

    /// Roll fees and points into the loan balance
    #[arg(long)]
    pub finance_fees: bool,

    /// Extra principal paid every month
    #[arg(long)]
    pub extra: Option<Decimal>,

    /// Actual monthly principal-and-interest payment
    #[arg(long)]
    pub payment: Option<Decimal>,

    /// Date of the first payment (YYYY-MM-DD)
    #[arg(long)]
    pub first_payment: Option<NaiveDate>,

    #[command(flatten)]
    pub property: PropertyArgs,

    #[command(flatten)]
    pub pmi: PmiArgs,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amort_input: AmortizationInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let principal = args
            .principal
            .ok_or("--principal is required (or provide --input)")?;
        let rate = args.rate.ok_or("--rate is required (or provide --input)")?;

        let mut loan = LoanTerms::new(principal, rate, args.term_months).with_fees(
            args.fees.unwrap_or(Decimal::ZERO),
            args.points.unwrap_or(Decimal::ZERO),
            args.finance_fees,
        );
        loan.first_payment_date = args.first_payment;

        AmortizationInput {
            loan,
            options: ScheduleOptions {
                extra_principal: args
                    .extra
                    .map(ExtraPrincipal::Monthly)
                    .unwrap_or_default(),
                payment_override: args.payment,
            },
            property: args.property.valuation(),
            pmi: args.pmi.policy(),
        }
    };

    let result = amortization::build_schedule(&amort_input)?;
    Ok(serde_json::to_value(result)?)
}
