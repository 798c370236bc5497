pub mod schedule;

pub use schedule::{
    amortize, build_schedule, AmortizationInput, AmortizationRow, ExtraPrincipal, Schedule,
    ScheduleOptions,
};
