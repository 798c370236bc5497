use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::time_value;
use crate::types::{Money, Rate};
use crate::RefiResult;

/// Longest term accepted for a single loan (50 years).
pub const MAX_TERM_MONTHS: u32 = 600;

/// Terms of a fixed-rate, fully amortising loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    /// Amount borrowed before any financed closing costs.
    pub principal: Money,
    /// Annual nominal interest rate (0.06 = 6%).
    pub annual_rate: Rate,
    /// Number of monthly payments.
    pub term_months: u32,
    /// Flat origination and closing fees.
    #[serde(default)]
    pub origination_fees: Money,
    /// Discount points as a fraction of `principal` (0.01 = one point).
    #[serde(default)]
    pub points: Rate,
    /// Roll fees and points into the loan balance instead of paying cash.
    #[serde(default)]
    pub finance_fees: bool,
    /// Date of the first monthly payment, used to label schedule rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_payment_date: Option<NaiveDate>,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_months: u32) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
            origination_fees: Decimal::ZERO,
            points: Decimal::ZERO,
            finance_fees: false,
            first_payment_date: None,
        }
    }

    pub fn with_fees(mut self, origination_fees: Money, points: Rate, finance_fees: bool) -> Self {
        self.origination_fees = origination_fees;
        self.points = points;
        self.finance_fees = finance_fees;
        self
    }

    pub fn validate(&self) -> RefiResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(RefiError::loan_terms(
                "principal",
                "Principal must be positive",
            ));
        }
        if self.annual_rate < Decimal::ZERO {
            return Err(RefiError::loan_terms(
                "annual_rate",
                "Interest rate cannot be negative",
            ));
        }
        if self.annual_rate > Decimal::ONE {
            return Err(RefiError::loan_terms(
                "annual_rate",
                "Interest rate must be a decimal fraction (0.06 = 6%)",
            ));
        }
        if self.term_months == 0 {
            return Err(RefiError::loan_terms(
                "term_months",
                "Term must be at least 1 month",
            ));
        }
        if self.term_months > MAX_TERM_MONTHS {
            return Err(RefiError::loan_terms(
                "term_months",
                format!("Term cannot exceed {MAX_TERM_MONTHS} months"),
            ));
        }
        if self.origination_fees < Decimal::ZERO {
            return Err(RefiError::loan_terms(
                "origination_fees",
                "Fees cannot be negative",
            ));
        }
        if self.points < Decimal::ZERO || self.points > dec!(0.10) {
            return Err(RefiError::loan_terms(
                "points",
                "Points must be between 0 and 0.10 of principal",
            ));
        }
        Ok(())
    }

    pub fn monthly_rate(&self) -> Rate {
        time_value::monthly_rate(self.annual_rate)
    }

    pub fn points_amount(&self) -> Money {
        self.principal * self.points
    }

    /// Fees plus points due at closing.
    pub fn closing_costs(&self) -> Money {
        self.origination_fees + self.points_amount()
    }

    /// Starting balance of the loan after optionally rolling in closing costs.
    pub fn financed_principal(&self) -> Money {
        if self.finance_fees {
            self.principal + self.closing_costs()
        } else {
            self.principal
        }
    }

    /// Cash the borrower brings to closing.
    pub fn upfront_cash(&self) -> Money {
        if self.finance_fees {
            Decimal::ZERO
        } else {
            self.closing_costs()
        }
    }

    pub fn financed_fees(&self) -> Money {
        self.financed_principal() - self.principal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_financed_principal_includes_fees_and_points() {
        let terms = LoanTerms::new(dec!(200000), dec!(0.05), 360).with_fees(dec!(3000), dec!(0.01), true);
        assert_eq!(terms.points_amount(), dec!(2000));
        assert_eq!(terms.closing_costs(), dec!(5000));
        assert_eq!(terms.financed_principal(), dec!(205000));
        assert_eq!(terms.upfront_cash(), Decimal::ZERO);
        assert_eq!(terms.financed_fees(), dec!(5000));
    }

    #[test]
    fn test_cash_fees_stay_out_of_principal() {
        let terms = LoanTerms::new(dec!(200000), dec!(0.05), 360).with_fees(dec!(3000), dec!(0.01), false);
        assert_eq!(terms.financed_principal(), dec!(200000));
        assert_eq!(terms.upfront_cash(), dec!(5000));
        assert_eq!(terms.financed_fees(), Decimal::ZERO);
    }

    #[test]
    fn test_validation_rejects_bad_terms() {
        assert!(LoanTerms::new(Decimal::ZERO, dec!(0.05), 360).validate().is_err());
        assert!(LoanTerms::new(dec!(1000), dec!(-0.01), 360).validate().is_err());
        assert!(LoanTerms::new(dec!(1000), dec!(0.05), 0).validate().is_err());
        assert!(LoanTerms::new(dec!(1000), dec!(6), 360).validate().is_err());
        assert!(LoanTerms::new(dec!(1000), dec!(0.05), 360)
            .with_fees(dec!(-1), Decimal::ZERO, false)
            .validate()
            .is_err());
    }

    #[test]
    fn test_validation_error_kind() {
        let err = LoanTerms::new(dec!(1000), dec!(0.05), 0).validate().unwrap_err();
        assert!(matches!(err, RefiError::InvalidLoanTerms { ref field, .. } if field == "term_months"));
    }

    #[test]
    fn test_upper_caps() {
        let base = LoanTerms::new(dec!(1000), dec!(0.05), 360);
        assert!(base.clone().with_fees(Decimal::ZERO, dec!(0.10), false).validate().is_ok());
        let err = base
            .clone()
            .with_fees(Decimal::ZERO, dec!(0.11), false)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RefiError::InvalidLoanTerms { ref field, .. } if field == "points"));
        assert!(LoanTerms::new(dec!(1000), dec!(0.05), MAX_TERM_MONTHS).validate().is_ok());
        assert!(LoanTerms::new(dec!(1000), dec!(0.05), MAX_TERM_MONTHS + 1).validate().is_err());
    }

    #[test]
    fn test_zero_rate_is_valid() {
        assert!(LoanTerms::new(dec!(1000), Decimal::ZERO, 12).validate().is_ok());
    }
}
