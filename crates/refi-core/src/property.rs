//! Home value projection used to derive loan-to-value for PMI.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::time_value::annual_to_monthly;
use crate::types::{Factor, Money, Rate};
use crate::RefiResult;

/// Property valuation assumptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyValuation {
    /// Value of the home at the start of the projection.
    pub initial_value: Money,
    /// Constant annual appreciation (0.03 = 3%), used whenever no explicit
    /// monthly factor is available.
    #[serde(default)]
    pub annual_appreciation: Rate,
    /// Optional month-over-month growth factors (1.002 = +0.2%). Entry `k`
    /// moves the value from month `k + 1` to month `k + 2`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub monthly_factors: Vec<Factor>,
}

impl PropertyValuation {
    pub fn new(initial_value: Money, annual_appreciation: Rate) -> Self {
        Self {
            initial_value,
            annual_appreciation,
            monthly_factors: Vec::new(),
        }
    }

    pub fn validate(&self) -> RefiResult<()> {
        if self.initial_value <= Decimal::ZERO {
            return Err(RefiError::input(
                "property.initial_value",
                "Home value must be positive",
            ));
        }
        if self.annual_appreciation <= -Decimal::ONE {
            return Err(RefiError::input(
                "property.annual_appreciation",
                "Appreciation must be greater than -100%",
            ));
        }
        Ok(())
    }

    /// Projected home value for months 1..=months. Month 1 is the initial value.
    pub fn value_path(&self, months: u32) -> Vec<Money> {
        let mut values = Vec::with_capacity(months as usize);
        if months == 0 {
            return values;
        }

        let fallback = if self.annual_appreciation.is_zero() {
            Decimal::ONE
        } else {
            annual_to_monthly(Decimal::ONE + self.annual_appreciation)
        };

        let mut value = self.initial_value;
        values.push(value);
        for idx in 1..months as usize {
            let factor = match self.monthly_factors.get(idx - 1) {
                Some(f) if *f > Decimal::ZERO => *f,
                _ => fallback,
            };
            value *= factor;
            values.push(value);
        }
        values
    }
}
