//! Invariants that must hold for every valid loan.

use proptest::prelude::*;
use refi_core::amortization::{amortize, ScheduleOptions};
use refi_core::compare::{compare_scenarios, ComparisonInput, ScenarioInput};
use refi_core::factors::FactorTable;
use refi_core::loan::LoanTerms;
use refi_core::pmi::{CancellationRule, NoPmi, PmiBasis, StandardPmi};
use refi_core::property::PropertyValuation;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// =============================================================================
// Generators
// =============================================================================

/// Principal 1,000..2,000,000, rate 0..15% in basis points, term 1..480 months.
fn arb_terms() -> impl Strategy<Value = LoanTerms> {
    (1_000u32..2_000_000, 0u32..1_500, 1u32..=480).prop_map(|(principal, bps, term)| {
        LoanTerms::new(
            Decimal::from(principal),
            Decimal::from(bps) / dec!(10000),
            term,
        )
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_final_balance_is_zero(terms in arb_terms()) {
        let sched = amortize(&terms, &ScheduleOptions::default(), &NoPmi, None).unwrap();
        prop_assert_eq!(sched.rows.len() as u32, terms.term_months);
        let last = sched.rows.last().unwrap();
        prop_assert!(last.ending_balance.abs() <= dec!(0.01));
    }

    #[test]
    fn prop_balances_chain(terms in arb_terms()) {
        let sched = amortize(&terms, &ScheduleOptions::default(), &NoPmi, None).unwrap();
        for pair in sched.rows.windows(2) {
            prop_assert_eq!(pair[1].beginning_balance, pair[0].ending_balance);
        }
    }

    #[test]
    fn prop_zero_rate_principal_is_constant(principal in 1_000u32..2_000_000, term in 1u32..=480) {
        let terms = LoanTerms::new(Decimal::from(principal), Decimal::ZERO, term);
        let sched = amortize(&terms, &ScheduleOptions::default(), &NoPmi, None).unwrap();
        let expected = terms.principal / Decimal::from(term);
        for row in &sched.rows {
            prop_assert!((row.principal - expected).abs() <= dec!(0.01));
        }
    }

    #[test]
    fn prop_pmi_never_returns(
        terms in arb_terms(),
        value_pct in 101u32..150,
        appreciation_bps in -300i32..600,
    ) {
        let home = PropertyValuation::new(
            terms.principal * Decimal::from(value_pct) / dec!(100),
            Decimal::from(appreciation_bps) / dec!(10000),
        );
        let path = home.value_path(terms.term_months);
        let pmi = StandardPmi::new(dec!(0.006), PmiBasis::Original, CancellationRule::Ltv78);
        let sched = amortize(&terms, &ScheduleOptions::default(), &pmi, Some(&path)).unwrap();
        if let Some(first_zero) = sched.rows.iter().position(|r| r.pmi.is_zero()) {
            prop_assert!(sched.rows[first_zero..].iter().all(|r| r.pmi.is_zero()));
        }
    }

    #[test]
    fn prop_self_comparison_is_neutral(terms in arb_terms()) {
        let scenario = |name: &str| ScenarioInput {
            name: name.into(),
            loan: terms.clone(),
            options: ScheduleOptions::default(),
            portfolio: None,
        };
        let input = ComparisonInput {
            scenarios: vec![scenario("a"), scenario("b")],
            baseline: None,
            horizon_months: None,
            property: None,
            pmi: None,
            keep_payment: false,
            factors: FactorTable::default(),
            fee_drag: Decimal::ZERO,
            rolling: false,
            include_schedules: false,
        };
        let out = compare_scenarios(&input).unwrap();
        let track = &out.result.alternatives[0];
        prop_assert!(track.deltas.iter().all(|d| d.is_zero()));
        prop_assert_eq!(track.final_value(), Decimal::ZERO);
    }
}
