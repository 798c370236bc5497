use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Factor, Money};

/// How a running balance evolves over one period.
pub trait GrowthModel {
    /// New balance after applying `return_factor` and then the period's cash flow.
    fn apply_monthly_factor(&self, current_balance: Money, return_factor: Factor, cash_flow: Money) -> Money;
}

/// `balance × factor + cash_flow`: the contribution lands at period end and
/// earns nothing until the next period.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalReturnGrowth;

impl GrowthModel for TotalReturnGrowth {
    fn apply_monthly_factor(&self, current_balance: Money, return_factor: Factor, cash_flow: Money) -> Money {
        current_balance * return_factor + cash_flow
    }
}

/// Running side-portfolio balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    balance: Money,
    contributed: Money,
    periods: u32,
}

impl PortfolioState {
    pub fn new(initial_balance: Money) -> Self {
        Self {
            balance: initial_balance,
            contributed: initial_balance,
            periods: 0,
        }
    }

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Net cash put in (lump sum plus every contribution, withdrawals negative).
    pub fn contributed(&self) -> Money {
        self.contributed
    }

    pub fn periods(&self) -> u32 {
        self.periods
    }

    /// Investment gain over net contributions.
    pub fn growth(&self) -> Money {
        self.balance - self.contributed
    }

    /// Advance one period through `model`; returns the new balance.
    pub fn step(&mut self, model: &dyn GrowthModel, return_factor: Factor, cash_flow: Money) -> Money {
        self.balance = model.apply_monthly_factor(self.balance, return_factor, cash_flow);
        self.contributed += cash_flow;
        self.periods += 1;
        self.balance
    }
}

impl Default for PortfolioState {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_total_return_growth() {
        let next = TotalReturnGrowth.apply_monthly_factor(dec!(1000), dec!(1.006), dec!(100));
        assert_eq!(next, dec!(1106));
    }

    #[test]
    fn test_state_tracks_contributions_and_growth() {
        let mut state = PortfolioState::new(dec!(1000));
        state.step(&TotalReturnGrowth, dec!(1.01), dec!(50));
        state.step(&TotalReturnGrowth, dec!(1.00), dec!(-20));
        assert_eq!(state.balance(), dec!(1040));
        assert_eq!(state.contributed(), dec!(1030));
        assert_eq!(state.growth(), dec!(10));
        assert_eq!(state.periods(), 2);
    }

    #[test]
    fn test_zero_state_with_zero_flows_stays_zero() {
        let mut state = PortfolioState::default();
        for _ in 0..12 {
            state.step(&TotalReturnGrowth, dec!(1.02), Decimal::ZERO);
        }
        assert_eq!(state.balance(), Decimal::ZERO);
    }
}
