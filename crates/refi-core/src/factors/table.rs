//! Named tables of total-return factors.
//!
//! Historical data arrives either as monthly total-return factors or as
//! trailing twelve-month factors observed every month. Everything downstream
//! works in monthly factors, so trailing-annual tables are converted row by
//! row to their monthly equivalent.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::RefiError;
use crate::invest::FactorSeries;
use crate::time_value::annual_to_monthly;
use crate::types::{Factor, Rate};
use crate::RefiResult;

/// What one row of a factor column represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FactorBasis {
    /// Growth over a single month.
    #[default]
    Monthly,
    /// Growth over the twelve months starting at the row's month.
    TrailingAnnual,
}

/// Lower snake case with runs of punctuation collapsed ("LBM 100E" → "lbm_100e").
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

/// Geometric mean of the positive factors; 1 when there are none.
pub fn geometric_mean(factors: &[Factor]) -> Factor {
    let logs: Vec<Decimal> = factors
        .iter()
        .filter(|f| **f > Decimal::ZERO)
        .map(|f| f.ln())
        .collect();
    if logs.is_empty() {
        return Decimal::ONE;
    }
    let mean = logs.iter().copied().sum::<Decimal>() / Decimal::from(logs.len() as u64);
    mean.exp()
}

/// Monthly growth factors from a monthly-observed series of trailing
/// twelve-month factors: each row becomes its twelfth root.
pub fn annualized_from_rolling(series: &FactorSeries) -> FactorSeries {
    FactorSeries {
        name: series.name.clone(),
        start_month: series.start_month,
        factors: series.factors.iter().map(|f| annual_to_monthly(*f)).collect(),
    }
}

/// Trailing twelve-month factors from monthly factors: row `r` is the
/// product of rows `r..r + 12`. Shorter than the input by eleven rows.
pub fn rolling_annual(series: &FactorSeries) -> FactorSeries {
    FactorSeries {
        name: series.name.clone(),
        start_month: series.start_month,
        factors: series
            .factors
            .windows(12)
            .map(|w| w.iter().copied().product())
            .collect(),
    }
}

/// Convert a series to monthly factors according to `basis`.
pub fn to_monthly_series(series: &FactorSeries, basis: FactorBasis) -> FactorSeries {
    match basis {
        FactorBasis::Monthly => series.clone(),
        FactorBasis::TrailingAnnual => annualized_from_rolling(series),
    }
}

/// Descriptive statistics for one factor column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactorSummary {
    pub name: String,
    pub observations: u32,
    pub geometric_mean: Factor,
    /// Compound annual return implied by the geometric mean.
    pub annualized_return: Rate,
    pub min: Factor,
    pub max: Factor,
}

/// A set of named factor columns sharing one basis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactorTable {
    #[serde(default)]
    pub basis: FactorBasis,
    pub columns: Vec<FactorSeries>,
}

impl FactorTable {
    pub fn new(basis: FactorBasis, columns: Vec<FactorSeries>) -> Self {
        Self { basis, columns }
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|s| s.name.as_str()).collect()
    }

    /// Column lookup, tolerant of case and punctuation differences.
    pub fn get(&self, name: &str) -> Option<&FactorSeries> {
        let key = normalize_name(name);
        self.columns.iter().find(|s| normalize_name(&s.name) == key)
    }

    pub fn validate(&self) -> RefiResult<()> {
        for (idx, s) in self.columns.iter().enumerate() {
            s.validate()?;
            if self.columns[..idx]
                .iter()
                .any(|other| normalize_name(&other.name) == normalize_name(&s.name))
            {
                return Err(RefiError::input(
                    "factors",
                    format!("Duplicate factor series '{}'", s.name),
                ));
            }
        }
        Ok(())
    }

    fn column(&self, name: &str) -> RefiResult<&FactorSeries> {
        self.get(name).ok_or_else(|| {
            RefiError::input(
                "portfolio",
                format!(
                    "Unknown factor series '{}' (available: {})",
                    name,
                    self.names().join(", ")
                ),
            )
        })
    }

    /// Monthly factors for column `name`.
    pub fn monthly(&self, name: &str) -> RefiResult<FactorSeries> {
        Ok(to_monthly_series(self.column(name)?, self.basis))
    }

    /// Trailing twelve-month factors for column `name`.
    pub fn annual(&self, name: &str) -> RefiResult<FactorSeries> {
        let series = self.column(name)?;
        Ok(match self.basis {
            FactorBasis::Monthly => rolling_annual(series),
            FactorBasis::TrailingAnnual => series.clone(),
        })
    }

    /// The named columns, or every column when `names` is empty.
    pub fn select(&self, names: &[String]) -> RefiResult<Vec<&FactorSeries>> {
        if names.is_empty() {
            return Ok(self.columns.iter().collect());
        }
        names.iter().map(|n| self.column(n)).collect()
    }

    pub fn summaries(&self) -> Vec<FactorSummary> {
        self.columns
            .iter()
            .map(|s| {
                let gm = geometric_mean(&s.factors);
                let annual = match self.basis {
                    FactorBasis::Monthly => gm.powu(12),
                    FactorBasis::TrailingAnnual => gm,
                };
                FactorSummary {
                    name: s.name.clone(),
                    observations: s.len() as u32,
                    geometric_mean: gm,
                    annualized_return: annual - Decimal::ONE,
                    min: s.factors.iter().copied().min().unwrap_or(Decimal::ONE),
                    max: s.factors.iter().copied().max().unwrap_or(Decimal::ONE),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table(basis: FactorBasis) -> FactorTable {
        FactorTable::new(
            basis,
            vec![
                FactorSeries::new("LBM 100E", vec![dec!(1.21), dec!(1.21)]),
                FactorSeries::new("lbm_100f", vec![dec!(1.04), dec!(1.04)]),
            ],
        )
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  LBM 100E "), "lbm_100e");
        assert_eq!(normalize_name("Begin -- Month"), "begin_month");
        assert_eq!(normalize_name("__x__"), "x");
    }

    #[test]
    fn test_lookup_is_normalized() {
        let t = table(FactorBasis::Monthly);
        assert!(t.get("lbm_100e").is_some());
        assert!(t.get("LBM-100F").is_some());
        assert!(t.get("global_100e").is_none());
    }

    #[test]
    fn test_unknown_series_lists_available() {
        let err = table(FactorBasis::Monthly).monthly("nope").unwrap_err();
        assert!(err.to_string().contains("LBM 100E"));
    }

    #[test]
    fn test_geometric_mean() {
        let gm = geometric_mean(&[dec!(1.1), dec!(1.1), dec!(1.1)]);
        assert!((gm - dec!(1.1)).abs() < dec!(0.0000001));
        let gm = geometric_mean(&[dec!(2), dec!(0.5)]);
        assert!((gm - Decimal::ONE).abs() < dec!(0.0000001));
        assert_eq!(geometric_mean(&[]), Decimal::ONE);
    }

    #[test]
    fn test_trailing_annual_converts_to_monthly() {
        let monthly = table(FactorBasis::TrailingAnnual).monthly("lbm_100e").unwrap();
        // 1.21^(1/12) compounded twice per year
        let two_months = monthly.factors[0] * monthly.factors[1];
        assert!((two_months.powu(6) - dec!(1.21)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_rolling_annual_compounds_twelve_months() {
        let monthly = FactorSeries::new("m", vec![dec!(1.01); 14]);
        let annual = rolling_annual(&monthly);
        assert_eq!(annual.len(), 3);
        assert_eq!(annual.factors[0], dec!(1.01).powu(12));
        let t = FactorTable::new(FactorBasis::Monthly, vec![monthly]);
        assert_eq!(t.annual("m").unwrap().len(), 3);
    }

    #[test]
    fn test_select_all_or_named() {
        let t = table(FactorBasis::Monthly);
        assert_eq!(t.select(&[]).unwrap().len(), 2);
        assert_eq!(t.select(&["LBM 100F".to_string()]).unwrap()[0].name, "lbm_100f");
        assert!(t.select(&["missing".to_string()]).is_err());
    }

    #[test]
    fn test_duplicate_series_rejected() {
        let t = FactorTable::new(
            FactorBasis::Monthly,
            vec![
                FactorSeries::new("A b", vec![dec!(1)]),
                FactorSeries::new("a_b", vec![dec!(1)]),
            ],
        );
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_summaries() {
        let summaries = table(FactorBasis::TrailingAnnual).summaries();
        assert_eq!(summaries.len(), 2);
        assert!((summaries[0].annualized_return - dec!(0.21)).abs() < dec!(0.0000001));
        assert_eq!(summaries[1].observations, 2);
    }
}
