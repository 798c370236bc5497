pub mod growth;
pub mod side_portfolio;
pub mod source;

pub use growth::{GrowthModel, PortfolioState, TotalReturnGrowth};
pub use side_portfolio::{
    grow_side_portfolio, rolling_outcomes, simulate_side_portfolio, OutcomeDistribution,
    SidePortfolioInput, SidePortfolioOutput,
};
pub use source::{require_factor, ConstantFactor, FactorSeries, FeeDrag, ReturnFactorSource, SeriesWindow};
