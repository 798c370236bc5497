//! Goal planning over historical annual return factors.
//!
//! Each window starts at a different monthly row and steps twelve rows per
//! year, so every historical start month is replayed once.

pub mod planner;
pub mod windows;

pub use planner::{
    plan_contribution, plan_lump_sum, required_contribution, required_lump_sum, simulate_goal,
    ContributionGoalInput, ContributionPlan, GoalSimulation, GoalSimulationInput, LumpSumGoalInput,
    LumpSumPlan,
};
pub use windows::{
    simulate_contributions, simulate_lump_sum, simulate_lump_with_contributions,
    success_probability, window_count, ROWS_PER_YEAR,
};
