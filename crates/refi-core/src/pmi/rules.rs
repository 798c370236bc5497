//! Private mortgage insurance policies.
//!
//! A policy maps the loan's current loan-to-value to a monthly premium. The
//! amortization engine only sees the [`PmiPolicy`] trait, so cancellation
//! thresholds live here and nowhere else.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::loan::LoanTerms;
use crate::types::{Money, Rate};
use crate::RefiResult;

/// Monthly PMI premium for a loan at a given loan-to-value.
pub trait PmiPolicy {
    /// Premium for one period. Must return zero once `loan_to_value` is at
    /// or below the policy's cancellation threshold.
    fn pmi_cost(&self, loan_to_value: Rate, current_balance: Money, terms: &LoanTerms) -> Money;
}

/// Loans without mortgage insurance.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPmi;

impl PmiPolicy for NoPmi {
    fn pmi_cost(&self, _loan_to_value: Rate, _current_balance: Money, _terms: &LoanTerms) -> Money {
        Decimal::ZERO
    }
}

/// Balance the premium rate is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PmiBasis {
    /// Starting loan balance (including any financed fees).
    #[default]
    Original,
    /// Outstanding balance for the period.
    Current,
}

/// When insurance stops being charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum CancellationRule {
    /// Automatic termination at 78% LTV.
    #[default]
    Ltv78,
    /// Borrower-requested cancellation at 80% LTV.
    Ltv80,
    /// FHA mortgage insurance for the life of the loan.
    FhaLife,
    /// Cancellation at a custom LTV threshold.
    AtLtv(Rate),
}

impl CancellationRule {
    pub fn threshold(&self) -> Option<Rate> {
        match self {
            CancellationRule::Ltv78 => Some(dec!(0.78)),
            CancellationRule::Ltv80 => Some(dec!(0.80)),
            CancellationRule::FhaLife => None,
            CancellationRule::AtLtv(t) => Some(*t),
        }
    }

    pub fn is_cancelled(&self, loan_to_value: Rate) -> bool {
        self.threshold().is_some_and(|t| loan_to_value <= t)
    }
}

/// Premium expressed as an annual rate on a basis balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardPmi {
    /// Annual premium rate (0.005 = 0.5% of the basis per year).
    pub annual_rate: Rate,
    #[serde(default)]
    pub basis: PmiBasis,
    #[serde(default)]
    pub cancellation: CancellationRule,
}

impl StandardPmi {
    pub fn new(annual_rate: Rate, basis: PmiBasis, cancellation: CancellationRule) -> Self {
        Self {
            annual_rate,
            basis,
            cancellation,
        }
    }

    pub fn validate(&self) -> RefiResult<()> {
        if self.annual_rate < Decimal::ZERO || self.annual_rate > dec!(0.05) {
            return Err(RefiError::input(
                "pmi.annual_rate",
                "PMI rate must be between 0 and 0.05",
            ));
        }
        if let CancellationRule::AtLtv(t) = self.cancellation {
            if t <= Decimal::ZERO || t > Decimal::ONE {
                return Err(RefiError::input(
                    "pmi.cancellation",
                    "Cancellation LTV must be in (0, 1]",
                ));
            }
        }
        Ok(())
    }
}

impl PmiPolicy for StandardPmi {
    fn pmi_cost(&self, loan_to_value: Rate, current_balance: Money, terms: &LoanTerms) -> Money {
        if self.cancellation.is_cancelled(loan_to_value) {
            return Decimal::ZERO;
        }
        let base = match self.basis {
            PmiBasis::Original => terms.financed_principal(),
            PmiBasis::Current => current_balance,
        };
        self.annual_rate / dec!(12) * base
    }
}

/// Stateful wrapper enforcing that a cancelled premium never comes back,
/// even if a falling home value pushes LTV back above the threshold.
pub struct PmiTracker<'a> {
    policy: &'a dyn PmiPolicy,
    active: bool,
    charged: bool,
    cancelled_at: Option<u32>,
}

impl<'a> PmiTracker<'a> {
    pub fn new(policy: &'a dyn PmiPolicy) -> Self {
        Self {
            policy,
            active: true,
            charged: false,
            cancelled_at: None,
        }
    }

    /// Premium for `period`; zero for every period after the policy first
    /// returns zero. A paid-off balance charges nothing without cancelling.
    pub fn charge(
        &mut self,
        period: u32,
        loan_to_value: Rate,
        current_balance: Money,
        terms: &LoanTerms,
    ) -> Money {
        if !self.active || current_balance.is_zero() {
            return Decimal::ZERO;
        }
        let cost = self
            .policy
            .pmi_cost(loan_to_value, current_balance, terms)
            .max(Decimal::ZERO);
        if cost.is_zero() {
            self.active = false;
            if self.charged {
                self.cancelled_at = Some(period);
            }
        } else {
            self.charged = true;
        }
        cost
    }

    /// First period without a premium after at least one charged period.
    pub fn cancelled_at(&self) -> Option<u32> {
        self.cancelled_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms() -> LoanTerms {
        LoanTerms::new(dec!(360000), dec!(0.06), 360)
    }

    #[test]
    fn test_original_basis_charge() {
        let pmi = StandardPmi::new(dec!(0.006), PmiBasis::Original, CancellationRule::Ltv78);
        let cost = pmi.pmi_cost(dec!(0.90), dec!(350000), &terms());
        // 0.6% / 12 on 360k
        assert_eq!(cost, dec!(180));
    }

    #[test]
    fn test_current_basis_charge() {
        let pmi = StandardPmi::new(dec!(0.006), PmiBasis::Current, CancellationRule::Ltv78);
        let cost = pmi.pmi_cost(dec!(0.90), dec!(300000), &terms());
        assert_eq!(cost, dec!(150));
    }

    #[test]
    fn test_cancels_at_threshold_inclusive() {
        let pmi = StandardPmi::new(dec!(0.006), PmiBasis::Original, CancellationRule::Ltv80);
        assert!(pmi.pmi_cost(dec!(0.8001), dec!(1), &terms()) > Decimal::ZERO);
        assert_eq!(pmi.pmi_cost(dec!(0.80), dec!(1), &terms()), Decimal::ZERO);
    }

    #[test]
    fn test_fha_life_never_cancels() {
        let pmi = StandardPmi::new(dec!(0.0055), PmiBasis::Current, CancellationRule::FhaLife);
        assert!(pmi.pmi_cost(dec!(0.10), dec!(50000), &terms()) > Decimal::ZERO);
    }

    #[test]
    fn test_custom_threshold() {
        let rule = CancellationRule::AtLtv(dec!(0.75));
        assert!(!rule.is_cancelled(dec!(0.76)));
        assert!(rule.is_cancelled(dec!(0.75)));
    }

    #[test]
    fn test_tracker_latches_off() {
        let pmi = StandardPmi::new(dec!(0.006), PmiBasis::Original, CancellationRule::Ltv78);
        let loan = terms();
        let mut tracker = PmiTracker::new(&pmi);
        assert!(tracker.charge(1, dec!(0.79), dec!(1), &loan) > Decimal::ZERO);
        assert_eq!(tracker.charge(2, dec!(0.78), dec!(1), &loan), Decimal::ZERO);
        // LTV bounces back above the threshold: still no premium
        assert_eq!(tracker.charge(3, dec!(0.85), dec!(1), &loan), Decimal::ZERO);
        assert_eq!(tracker.cancelled_at(), Some(2));
    }

    #[test]
    fn test_tracker_zero_balance_is_not_a_cancellation() {
        let pmi = StandardPmi::new(dec!(0.0055), PmiBasis::Current, CancellationRule::FhaLife);
        let loan = terms();
        let mut tracker = PmiTracker::new(&pmi);
        assert!(tracker.charge(1, dec!(0.90), dec!(180000), &loan) > Decimal::ZERO);
        assert_eq!(tracker.charge(2, Decimal::ZERO, Decimal::ZERO, &loan), Decimal::ZERO);
        assert_eq!(tracker.cancelled_at(), None);
    }

    #[test]
    fn test_tracker_never_charged_has_no_cancellation_month() {
        let mut tracker = PmiTracker::new(&NoPmi);
        assert_eq!(tracker.charge(1, dec!(0.95), dec!(1), &terms()), Decimal::ZERO);
        assert_eq!(tracker.cancelled_at(), None);
    }

    #[test]
    fn test_validation() {
        assert!(StandardPmi::new(dec!(-0.01), PmiBasis::Original, CancellationRule::Ltv78)
            .validate()
            .is_err());
        assert!(StandardPmi::new(dec!(0.005), PmiBasis::Original, CancellationRule::AtLtv(dec!(1.2)))
            .validate()
            .is_err());
        assert!(StandardPmi::new(dec!(0.005), PmiBasis::Original, CancellationRule::Ltv78)
            .validate()
            .is_ok());
    }
}
