pub mod table;

pub use crate::time_value::annual_to_monthly;
pub use table::{
    annualized_from_rolling, geometric_mean, normalize_name, rolling_annual, to_monthly_series,
    FactorBasis, FactorSummary, FactorTable,
};
