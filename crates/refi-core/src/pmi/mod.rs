pub mod rules;

pub use rules::{CancellationRule, NoPmi, PmiBasis, PmiPolicy, PmiTracker, StandardPmi};
