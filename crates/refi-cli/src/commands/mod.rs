pub mod amortization;
pub mod compare;
pub mod goals;
pub mod invest;

use clap::{Args, ValueEnum};
use rust_decimal::Decimal;

use refi_core::factors::{FactorBasis, FactorTable};
use refi_core::pmi::{CancellationRule, PmiBasis, StandardPmi};
use refi_core::property::PropertyValuation;

use crate::input;

/// What one row of a factor CSV represents
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BasisArg {
    /// Growth over one month
    Monthly,
    /// Growth over the twelve months starting at the row
    TrailingAnnual,
}

impl From<BasisArg> for FactorBasis {
    fn from(arg: BasisArg) -> Self {
        match arg {
            BasisArg::Monthly => FactorBasis::Monthly,
            BasisArg::TrailingAnnual => FactorBasis::TrailingAnnual,
        }
    }
}

/// Historical return factors
#[derive(Args)]
pub struct FactorArgs {
    /// CSV file of total-return factors, one column per portfolio
    #[arg(long)]
    pub factors: Option<String>,

    /// Row meaning of the factor CSV
    #[arg(long, value_enum, default_value = "trailing-annual")]
    pub basis: BasisArg,
}

impl FactorArgs {
    pub fn load(&self) -> Result<Option<FactorTable>, Box<dyn std::error::Error>> {
        match &self.factors {
            Some(path) => Ok(Some(input::factors::read_factor_csv(path, self.basis.into())?)),
            None => Ok(None),
        }
    }
}

/// Property value used for loan-to-value and equity
#[derive(Args)]
pub struct PropertyArgs {
    /// Current home value
    #[arg(long)]
    pub home_value: Option<Decimal>,

    /// Annual home appreciation as a decimal (0.03 = 3%)
    #[arg(long, allow_hyphen_values = true)]
    pub appreciation: Option<Decimal>,
}

impl PropertyArgs {
    pub fn valuation(&self) -> Option<PropertyValuation> {
        self.home_value.map(|value| {
            PropertyValuation::new(value, self.appreciation.unwrap_or(Decimal::ZERO))
        })
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PmiBasisArg {
    Original,
    Current,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CancelArg {
    /// Automatic termination at 78% LTV
    Ltv78,
    /// Borrower-requested cancellation at 80% LTV
    Ltv80,
    /// Insurance for the life of the loan
    FhaLife,
}

/// Private mortgage insurance
#[derive(Args)]
pub struct PmiArgs {
    /// Annual PMI rate as a decimal (0.005 = 0.5% per year)
    #[arg(long)]
    pub pmi_rate: Option<Decimal>,

    /// Balance the PMI rate applies to
    #[arg(long, value_enum, default_value = "original")]
    pub pmi_basis: PmiBasisArg,

    /// When PMI stops
    #[arg(long, value_enum, default_value = "ltv78")]
    pub pmi_cancel: CancelArg,
}

impl PmiArgs {
    pub fn policy(&self) -> Option<StandardPmi> {
        let basis = match self.pmi_basis {
            PmiBasisArg::Original => PmiBasis::Original,
            PmiBasisArg::Current => PmiBasis::Current,
        };
        let cancellation = match self.pmi_cancel {
            CancelArg::Ltv78 => CancellationRule::Ltv78,
            CancelArg::Ltv80 => CancellationRule::Ltv80,
            CancelArg::FhaLife => CancellationRule::FhaLife,
        };
        self.pmi_rate
            .map(|rate| StandardPmi::new(rate, basis, cancellation))
    }
}
