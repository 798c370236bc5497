//! Where monthly total-return factors come from.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::time_value::nth_root;
use crate::types::{Factor, Rate};
use crate::RefiResult;

/// Supplies one total-return factor per period (1-based).
pub trait ReturnFactorSource {
    fn name(&self) -> &str;

    /// Factor for `period`, or `None` when the source has no data for it.
    fn factor(&self, period: u32) -> Option<Factor>;
}

impl<T: ReturnFactorSource + ?Sized> ReturnFactorSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn factor(&self, period: u32) -> Option<Factor> {
        (**self).factor(period)
    }
}

/// Factor for `period` or `IncompleteFactorData`.
pub fn require_factor(source: &dyn ReturnFactorSource, period: u32) -> RefiResult<Factor> {
    source
        .factor(period)
        .ok_or_else(|| RefiError::IncompleteFactorData {
            series: source.name().to_string(),
            period,
        })
}

/// A named series of monthly total-return factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorSeries {
    pub name: String,
    /// Month of the first factor, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_month: Option<NaiveDate>,
    pub factors: Vec<Factor>,
}

impl FactorSeries {
    pub fn new(name: impl Into<String>, factors: Vec<Factor>) -> Self {
        Self {
            name: name.into(),
            start_month: None,
            factors,
        }
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn validate(&self) -> RefiResult<()> {
        if let Some(idx) = self.factors.iter().position(|f| *f <= Decimal::ZERO) {
            return Err(RefiError::input(
                "factors",
                format!(
                    "Series '{}' has a non-positive factor at row {}",
                    self.name,
                    idx + 1
                ),
            ));
        }
        Ok(())
    }

    /// View of the series starting at row `offset` (0-based).
    pub fn window(&self, offset: usize) -> SeriesWindow<'_> {
        SeriesWindow {
            series: self,
            offset,
        }
    }

    /// Calendar month of row `offset`, when the series start is known.
    pub fn month_at(&self, offset: usize) -> Option<NaiveDate> {
        self.start_month
            .and_then(|d| d.checked_add_months(Months::new(offset as u32)))
    }
}

impl ReturnFactorSource for FactorSeries {
    fn name(&self) -> &str {
        &self.name
    }

    fn factor(&self, period: u32) -> Option<Factor> {
        period
            .checked_sub(1)
            .and_then(|idx| self.factors.get(idx as usize))
            .copied()
    }
}

/// A series replayed from a later starting row.
#[derive(Debug, Clone, Copy)]
pub struct SeriesWindow<'a> {
    series: &'a FactorSeries,
    offset: usize,
}

impl ReturnFactorSource for SeriesWindow<'_> {
    fn name(&self) -> &str {
        &self.series.name
    }

    fn factor(&self, period: u32) -> Option<Factor> {
        period
            .checked_sub(1)
            .and_then(|idx| self.series.factors.get(self.offset + idx as usize))
            .copied()
    }
}

/// The same factor every period. `ConstantFactor::cash()` holds money idle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantFactor {
    pub name: String,
    pub factor: Factor,
}

impl ConstantFactor {
    pub fn new(name: impl Into<String>, factor: Factor) -> Self {
        Self {
            name: name.into(),
            factor,
        }
    }

    pub fn cash() -> Self {
        Self::new("cash", Decimal::ONE)
    }
}

impl ReturnFactorSource for ConstantFactor {
    fn name(&self) -> &str {
        &self.name
    }

    fn factor(&self, _period: u32) -> Option<Factor> {
        Some(self.factor)
    }
}

/// Reduces every factor of `inner` by an annual fee drag.
pub struct FeeDrag<S> {
    inner: S,
    monthly_multiplier: Factor,
}

impl<S: ReturnFactorSource> FeeDrag<S> {
    /// `annual_drag` is clamped to [0, 1].
    pub fn new(inner: S, annual_drag: Rate) -> Self {
        let drag = annual_drag.max(Decimal::ZERO).min(Decimal::ONE);
        let monthly_multiplier = nth_root(Decimal::ONE - drag, 12);
        Self {
            inner,
            monthly_multiplier,
        }
    }

    pub fn monthly_multiplier(&self) -> Factor {
        self.monthly_multiplier
    }
}

impl<S: ReturnFactorSource> ReturnFactorSource for FeeDrag<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn factor(&self, period: u32) -> Option<Factor> {
        self.inner.factor(period).map(|f| f * self.monthly_multiplier)
    }
}
