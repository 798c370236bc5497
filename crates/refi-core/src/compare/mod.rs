pub mod orchestrator;

pub use orchestrator::{
    build_scenarios, compare, compare_scenarios, AlternativeTrack, ComparisonInput,
    ComparisonResult, Scenario, ScenarioInput, ScenarioSummary,
};
