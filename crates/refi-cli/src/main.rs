mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::amortization::AmortizeArgs;
use commands::compare::CompareArgs;
use commands::goals::{GoalContributionArgs, GoalLumpSumArgs, GoalSimulateArgs};
use commands::invest::{FactorSummaryArgs, GrowArgs};

/// Mortgage refinance comparison
#[derive(Parser)]
#[command(
    name = "refi",
    version,
    about = "Compare mortgage refinance options in decimal precision",
    long_about = "A CLI for comparing a current mortgage against refinance options. \
                  Builds amortization schedules with PMI and fee financing, invests \
                  monthly savings along historical return factors, and solves \
                  savings goals over rolling historical windows."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log computation steps to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a month-by-month amortization schedule
    Amortize(AmortizeArgs),
    /// Compare the current loan with refinance scenarios
    Compare(CompareArgs),
    /// Grow monthly contributions along a factor series
    Grow(GrowArgs),
    /// Summarise the columns of a factor file
    Factors(FactorSummaryArgs),
    /// Required annual contribution to reach a goal
    GoalContribution(GoalContributionArgs),
    /// Required lump sum to reach a goal
    GoalLumpSum(GoalLumpSumArgs),
    /// Ending values of an initial investment plus annual additions
    GoalSimulate(GoalSimulateArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::amortization::run_amortize(args),
        Commands::Compare(args) => commands::compare::run_compare(args),
        Commands::Grow(args) => commands::invest::run_grow(args),
        Commands::Factors(args) => commands::invest::run_factor_summary(args),
        Commands::GoalContribution(args) => commands::goals::run_goal_contribution(args),
        Commands::GoalLumpSum(args) => commands::goals::run_goal_lump_sum(args),
        Commands::GoalSimulate(args) => commands::goals::run_goal_simulate(args),
        Commands::Version => {
            println!("refi {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_months_bounded() {
        assert!(Cli::try_parse_from(["refi", "grow", "--months", "4000000000"]).is_err());
        assert!(Cli::try_parse_from(["refi", "grow", "--months", "0"]).is_err());
        assert!(Cli::try_parse_from(["refi", "grow", "--months", "600"]).is_ok());
    }

    #[test]
    fn test_compare_flags_parse() {
        let cli = Cli::try_parse_from([
            "refi", "compare", "--balance", "250000", "--current-rate", "0.07",
            "--refi-rate", "0.06", "--horizon", "120",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Compare(_)));
    }
}
