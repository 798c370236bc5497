//! Fixed-payment amortization with optional extra principal, payment
//! override and PMI.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::error::RefiError;
use crate::loan::LoanTerms;
use crate::pmi::{NoPmi, PmiPolicy, PmiTracker, StandardPmi};
use crate::property::PropertyValuation;
use crate::time_value::level_payment;
use crate::types::*;
use crate::RefiResult;

/// Additional principal paid on top of the scheduled payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum ExtraPrincipal {
    #[default]
    None,
    /// Same extra amount every month.
    Monthly(Money),
    /// One amount per month starting at period 1; missing months pay nothing extra.
    Custom(Vec<Money>),
}

impl ExtraPrincipal {
    pub fn amount_for(&self, period: u32) -> Money {
        match self {
            ExtraPrincipal::None => Decimal::ZERO,
            ExtraPrincipal::Monthly(amount) => *amount,
            ExtraPrincipal::Custom(amounts) => period
                .checked_sub(1)
                .and_then(|idx| amounts.get(idx as usize))
                .copied()
                .unwrap_or(Decimal::ZERO),
        }
    }

    fn validate(&self) -> RefiResult<()> {
        let negative = match self {
            ExtraPrincipal::None => false,
            ExtraPrincipal::Monthly(amount) => *amount < Decimal::ZERO,
            ExtraPrincipal::Custom(amounts) => amounts.iter().any(|a| *a < Decimal::ZERO),
        };
        if negative {
            return Err(RefiError::loan_terms(
                "extra_principal",
                "Extra principal cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Knobs that change how a loan is paid without changing its terms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleOptions {
    #[serde(default)]
    pub extra_principal: ExtraPrincipal,
    /// Actual monthly principal-and-interest payment, when it differs from
    /// the level payment implied by the terms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_override: Option<Money>,
}

/// One month of the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationRow {
    pub period: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    pub beginning_balance: Money,
    /// Scheduled principal and interest for the month.
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    pub extra_principal: Money,
    pub ending_balance: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_value: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_to_value: Option<Rate>,
    pub pmi: Money,
}

impl AmortizationRow {
    /// Cash leaving the borrower's pocket this month.
    pub fn outflow(&self) -> Money {
        self.payment + self.extra_principal + self.pmi
    }
}

/// Complete month-by-month schedule for one loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub rows: Vec<AmortizationRow>,
    /// Level principal-and-interest payment used for every regular month.
    pub monthly_payment: Money,
    pub financed_principal: Money,
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_extra_principal: Money,
    pub total_pmi: Money,
    pub total_outflow: Money,
    /// Period in which the balance reached zero.
    pub payoff_month: u32,
    /// First month without PMI after it had been charged.
    pub pmi_cancellation_month: Option<u32>,
}

impl Schedule {
    pub fn len(&self) -> u32 {
        self.rows.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, period: u32) -> Option<&AmortizationRow> {
        period
            .checked_sub(1)
            .and_then(|idx| self.rows.get(idx as usize))
    }

    /// Outflow for `period`, zero once the loan is paid off.
    pub fn outflow(&self, period: u32) -> Money {
        self.row(period).map(|r| r.outflow()).unwrap_or(Decimal::ZERO)
    }

    pub fn pmi(&self, period: u32) -> Money {
        self.row(period).map(|r| r.pmi).unwrap_or(Decimal::ZERO)
    }

    /// Balance after `period`; the starting balance for period 0 and the
    /// final balance beyond the end of the schedule.
    pub fn balance_after(&self, period: u32) -> Money {
        if period == 0 {
            return self.financed_principal;
        }
        match self.row(period) {
            Some(r) => r.ending_balance,
            None => self
                .rows
                .last()
                .map(|r| r.ending_balance)
                .unwrap_or(self.financed_principal),
        }
    }

    /// Sum of a per-row quantity over the first `periods` months.
    pub fn sum_through(&self, periods: u32, f: impl Fn(&AmortizationRow) -> Money) -> Money {
        self.rows.iter().take(periods as usize).map(f).sum()
    }
}

/// Build the schedule for `terms`.
///
/// `home_values[k]` is the property value for period `k + 1`; the last value
/// is held if the slice is shorter than the schedule. Without home values
/// loan-to-value is unknown and PMI is never charged.
pub fn amortize(
    terms: &LoanTerms,
    options: &ScheduleOptions,
    pmi: &dyn PmiPolicy,
    home_values: Option<&[Money]>,
) -> RefiResult<Schedule> {
    terms.validate()?;
    options.extra_principal.validate()?;

    let principal = terms.financed_principal();
    let rate = terms.monthly_rate();
    let level = level_payment(principal, rate, terms.term_months)?;

    let payment = match options.payment_override {
        Some(p) if p <= Decimal::ZERO => {
            return Err(RefiError::loan_terms(
                "payment_override",
                "Payment must be positive",
            ));
        }
        Some(p) if p <= principal * rate => {
            return Err(RefiError::loan_terms(
                "payment_override",
                format!("Payment {p} does not cover first-month interest"),
            ));
        }
        Some(p) => p,
        None => level,
    };

    let home_values = home_values.filter(|v| !v.is_empty());
    let mut tracker = PmiTracker::new(pmi);

    let mut rows = Vec::with_capacity(terms.term_months as usize);
    let mut balance = principal;
    let mut total_interest = Decimal::ZERO;
    let mut total_principal = Decimal::ZERO;
    let mut total_extra = Decimal::ZERO;
    let mut total_pmi = Decimal::ZERO;

    for period in 1..=terms.term_months {
        let beginning = balance;
        let interest = beginning * rate;

        // Final period takes whatever is left so rounding drift never survives.
        let mut principal_part = payment - interest;
        if period == terms.term_months || principal_part > beginning {
            principal_part = beginning;
        }
        let scheduled = interest + principal_part;

        let after_scheduled = beginning - principal_part;
        let extra = options
            .extra_principal
            .amount_for(period)
            .min(after_scheduled);
        let ending = after_scheduled - extra;

        let home_value = home_values.map(|v| {
            let idx = (period as usize - 1).min(v.len() - 1);
            v[idx]
        });
        let loan_to_value = home_value
            .filter(|hv| *hv > Decimal::ZERO)
            .map(|hv| ending / hv);
        let pmi_charge = match loan_to_value {
            Some(ltv) => tracker.charge(period, ltv, ending, terms),
            None => Decimal::ZERO,
        };

        total_interest += interest;
        total_principal += principal_part + extra;
        total_extra += extra;
        total_pmi += pmi_charge;

        rows.push(AmortizationRow {
            period,
            payment_date: payment_date(terms.first_payment_date, period),
            beginning_balance: beginning,
            payment: scheduled,
            interest,
            principal: principal_part,
            extra_principal: extra,
            ending_balance: ending,
            home_value,
            loan_to_value,
            pmi: pmi_charge,
        });

        balance = ending;
        if balance.is_zero() {
            break;
        }
    }

    let payoff_month = rows.last().map(|r| r.period).unwrap_or(0);
    debug!(
        periods = rows.len(),
        %payment,
        %total_interest,
        payoff_month,
        "amortization schedule built"
    );

    Ok(Schedule {
        rows,
        monthly_payment: payment,
        financed_principal: principal,
        total_interest,
        total_principal,
        total_extra_principal: total_extra,
        total_pmi,
        total_outflow: total_interest + total_principal + total_pmi,
        payoff_month,
        pmi_cancellation_month: tracker.cancelled_at(),
    })
}

fn payment_date(first: Option<NaiveDate>, period: u32) -> Option<NaiveDate> {
    first.and_then(|d| d.checked_add_months(Months::new(period - 1)))
}

// ---------------------------------------------------------------------------
// Standalone schedule entry point
// ---------------------------------------------------------------------------

/// Input for a single-loan schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationInput {
    pub loan: LoanTerms,
    #[serde(default)]
    pub options: ScheduleOptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyValuation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmi: Option<StandardPmi>,
}

/// Build a month-by-month schedule for a single loan.
pub fn build_schedule(input: &AmortizationInput) -> RefiResult<ComputationOutput<Schedule>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if let Some(property) = &input.property {
        property.validate()?;
    }
    if let Some(pmi) = &input.pmi {
        pmi.validate()?;
        if input.property.is_none() {
            warnings.push("PMI configured without a property value; loan-to-value unknown, no PMI charged".into());
        }
    }

    let home_values = input
        .property
        .as_ref()
        .map(|p| p.value_path(input.loan.term_months));

    let schedule = match &input.pmi {
        Some(pmi) => amortize(&input.loan, &input.options, pmi, home_values.as_deref())?,
        None => amortize(&input.loan, &input.options, &NoPmi, home_values.as_deref())?,
    };

    if schedule.payoff_month < input.loan.term_months {
        warnings.push(format!(
            "Loan pays off early in month {} of {}",
            schedule.payoff_month, input.loan.term_months
        ));
    }
    if let Some(last) = schedule.rows.last() {
        if input.options.payment_override.is_some() && last.payment > schedule.monthly_payment {
            warnings.push(format!(
                "Payment override leaves a final balloon payment of {}",
                last.payment
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-Payment Amortization Schedule",
        &serde_json::json!({
            "principal": input.loan.financed_principal().to_string(),
            "annual_rate": input.loan.annual_rate.to_string(),
            "term_months": input.loan.term_months,
            "finance_fees": input.loan.finance_fees,
            "pmi": input.pmi.is_some(),
        }),
        warnings,
        elapsed,
        schedule,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pmi::{CancellationRule, PmiBasis};
    use rust_decimal_macros::dec;

    const CENT: Decimal = dec!(0.01);

    fn base_terms() -> LoanTerms {
        LoanTerms::new(dec!(300000), dec!(0.06), 360)
    }

    fn plain(terms: &LoanTerms) -> Schedule {
        amortize(terms, &ScheduleOptions::default(), &NoPmi, None).unwrap()
    }

    #[test]
    fn test_first_period_known_answer() {
        let sched = plain(&base_terms());
        let first = &sched.rows[0];
        assert_eq!(first.interest, dec!(1500));
        assert_eq!(first.principal, sched.monthly_payment - dec!(1500));
        assert!((sched.monthly_payment - dec!(1798.65)).abs() < CENT);
    }

    #[test]
    fn test_full_term_and_zero_final_balance() {
        let sched = plain(&base_terms());
        assert_eq!(sched.len(), 360);
        assert_eq!(sched.payoff_month, 360);
        assert_eq!(sched.rows.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_balances_chain() {
        let sched = plain(&base_terms());
        for pair in sched.rows.windows(2) {
            assert_eq!(pair[1].beginning_balance, pair[0].ending_balance);
        }
    }

    #[test]
    fn test_final_period_correction_is_small() {
        let sched = plain(&base_terms());
        let last = sched.rows.last().unwrap();
        assert!((last.payment - sched.monthly_payment).abs() < CENT);
    }

    #[test]
    fn test_zero_rate_constant_principal() {
        let terms = LoanTerms::new(dec!(120000), Decimal::ZERO, 360);
        let sched = plain(&terms);
        let expected = dec!(120000) / dec!(360);
        for row in &sched.rows {
            assert_eq!(row.interest, Decimal::ZERO);
            assert!((row.principal - expected).abs() < CENT);
        }
        assert_eq!(sched.total_interest, Decimal::ZERO);
        assert_eq!(sched.rows.last().unwrap().ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_single_month_term() {
        let terms = LoanTerms::new(dec!(1000), dec!(0.12), 1);
        let sched = plain(&terms);
        assert_eq!(sched.len(), 1);
        assert_eq!(sched.rows[0].interest, dec!(10));
        assert_eq!(sched.rows[0].principal, dec!(1000));
        assert_eq!(sched.rows[0].ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_totals_reconcile() {
        let sched = plain(&base_terms());
        assert!((sched.total_principal - dec!(300000)).abs() < CENT);
        let sum_payments: Decimal = sched.rows.iter().map(|r| r.payment).sum();
        assert!((sum_payments - sched.total_outflow).abs() < CENT);
    }

    #[test]
    fn test_financed_fees_raise_starting_balance() {
        let terms = base_terms().with_fees(dec!(4000), dec!(0.01), true);
        let sched = plain(&terms);
        assert_eq!(sched.rows[0].beginning_balance, dec!(307000));
        assert_eq!(sched.financed_principal, dec!(307000));
    }

    #[test]
    fn test_extra_principal_pays_off_early() {
        let options = ScheduleOptions {
            extra_principal: ExtraPrincipal::Monthly(dec!(500)),
            payment_override: None,
        };
        let sched = amortize(&base_terms(), &options, &NoPmi, None).unwrap();
        assert!(sched.payoff_month < 360);
        assert_eq!(sched.rows.last().unwrap().ending_balance, Decimal::ZERO);
        assert!(sched.total_interest < plain(&base_terms()).total_interest);
    }

    #[test]
    fn test_custom_extra_principal() {
        let options = ScheduleOptions {
            extra_principal: ExtraPrincipal::Custom(vec![dec!(0), dec!(10000)]),
            payment_override: None,
        };
        let sched = amortize(&base_terms(), &options, &NoPmi, None).unwrap();
        assert_eq!(sched.rows[0].extra_principal, Decimal::ZERO);
        assert_eq!(sched.rows[1].extra_principal, dec!(10000));
        assert_eq!(sched.rows[2].extra_principal, Decimal::ZERO);
    }

    #[test]
    fn test_payment_override_short_leaves_balloon() {
        let options = ScheduleOptions {
            extra_principal: ExtraPrincipal::None,
            payment_override: Some(dec!(1700)),
        };
        let sched = amortize(&base_terms(), &options, &NoPmi, None).unwrap();
        let last = sched.rows.last().unwrap();
        assert_eq!(sched.len(), 360);
        assert!(last.payment > dec!(1700));
        assert_eq!(last.ending_balance, Decimal::ZERO);
    }

    #[test]
    fn test_payment_override_must_cover_interest() {
        let options = ScheduleOptions {
            extra_principal: ExtraPrincipal::None,
            payment_override: Some(dec!(1400)),
        };
        let err = amortize(&base_terms(), &options, &NoPmi, None).unwrap_err();
        assert!(matches!(err, RefiError::InvalidLoanTerms { .. }));
    }

    #[test]
    fn test_invalid_terms_rejected() {
        let terms = LoanTerms::new(dec!(-5), dec!(0.06), 360);
        let err = amortize(&terms, &ScheduleOptions::default(), &NoPmi, None).unwrap_err();
        assert!(matches!(err, RefiError::InvalidLoanTerms { .. }));
    }

    #[test]
    fn test_pmi_cancels_and_stays_cancelled() {
        let terms = LoanTerms::new(dec!(360000), dec!(0.06), 360);
        let pmi = StandardPmi::new(dec!(0.006), PmiBasis::Original, CancellationRule::Ltv78);
        let home = PropertyValuation::new(dec!(400000), Decimal::ZERO).value_path(360);
        let sched = amortize(&terms, &ScheduleOptions::default(), &pmi, Some(&home)).unwrap();

        assert_eq!(sched.rows[0].pmi, dec!(180));
        let cancel = sched.pmi_cancellation_month.expect("PMI should cancel");
        for row in &sched.rows {
            if row.period < cancel {
                assert!(row.pmi > Decimal::ZERO);
                assert!(row.loan_to_value.unwrap() > dec!(0.78));
            } else {
                assert_eq!(row.pmi, Decimal::ZERO);
            }
        }
        assert!(sched.rows[cancel as usize - 1].loan_to_value.unwrap() <= dec!(0.78));
    }

    #[test]
    fn test_pmi_does_not_change_principal_paydown() {
        let terms = LoanTerms::new(dec!(360000), dec!(0.06), 360);
        let pmi = StandardPmi::new(dec!(0.006), PmiBasis::Original, CancellationRule::Ltv78);
        let home = PropertyValuation::new(dec!(400000), Decimal::ZERO).value_path(360);
        let with_pmi = amortize(&terms, &ScheduleOptions::default(), &pmi, Some(&home)).unwrap();
        let without = plain(&terms);
        for (a, b) in with_pmi.rows.iter().zip(without.rows.iter()) {
            assert_eq!(a.ending_balance, b.ending_balance);
        }
        assert!(with_pmi.total_outflow > without.total_outflow);
    }

    #[test]
    fn test_payment_dates_advance_monthly() {
        let mut terms = LoanTerms::new(dec!(10000), dec!(0.05), 3);
        terms.first_payment_date = NaiveDate::from_ymd_opt(2024, 1, 31);
        let sched = plain(&terms);
        assert_eq!(sched.rows[1].payment_date, NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(sched.rows[2].payment_date, NaiveDate::from_ymd_opt(2024, 3, 31));
    }

    #[test]
    fn test_build_schedule_envelope_and_warning() {
        let input = AmortizationInput {
            loan: base_terms(),
            options: ScheduleOptions::default(),
            property: None,
            pmi: Some(StandardPmi::new(dec!(0.005), PmiBasis::Original, CancellationRule::Ltv78)),
        };
        let out = build_schedule(&input).unwrap();
        assert_eq!(out.result.total_pmi, Decimal::ZERO);
        assert!(!out.warnings.is_empty());
        assert_eq!(out.methodology, "Fixed-Payment Amortization Schedule");
    }
}
