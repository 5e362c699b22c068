//! Command-line argument parsing for repbudget
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::host::TransactionReasons;

/// repbudget - quarterly program budget driven by reputation
#[derive(Parser, Debug)]
#[command(name = "repbudget")]
#[command(version)]
#[command(about = "Quarterly program budget: base allowance plus converted reputation", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a simulated career and print every payout
    Simulate {
        /// Calendar years to simulate
        #[arg(long, default_value_t = 3)]
        years: u32,

        /// Persist the result under this save name (resumes it if it exists)
        #[arg(long)]
        save: Option<String>,

        /// Reputation per completed contract (overrides config)
        #[arg(long)]
        contract_rep: Option<f64>,

        /// Days between contracts (overrides config, 0 disables)
        #[arg(long)]
        contract_every: Option<f64>,
    },

    /// Show a save's budget state and the next payout
    Status {
        /// Save name
        #[arg(long)]
        save: String,
    },

    /// Report a reputation change to a save
    Accrue {
        /// Save name
        #[arg(long)]
        save: String,

        /// Reputation delta (may be negative)
        #[arg(long, allow_hyphen_values = true, value_parser = parse_finite)]
        delta: f64,

        /// Transaction category of the change
        #[arg(long, value_enum, default_value_t = ReasonArg::Contracts)]
        reason: ReasonArg,
    },

    /// Move a save's clock forward and pay everything due
    Tick {
        /// Save name
        #[arg(long)]
        save: String,

        /// Target date (YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)
        #[arg(long)]
        at: String,
    },

    /// Print upcoming due dates and the base budget curve
    Schedule {
        /// Number of periods to print
        #[arg(long, default_value_t = 12)]
        periods: u32,

        /// First due date (defaults to the epoch)
        #[arg(long)]
        start: Option<String>,
    },

    /// List saves, or delete one
    Saves {
        /// Delete this save instead of listing
        #[arg(long)]
        delete: Option<String>,
    },

    /// Display current configuration
    Config,
}

/// Parse a number that must be finite
fn parse_finite(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("'{}' is not a finite number", s))
    }
}

/// Transaction category accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReasonArg {
    /// Contract reward (banked)
    Contracts,
    /// Contract penalty (banked)
    Penalty,
    /// Progression milestone (not banked)
    Progression,
    /// Anything else (not banked)
    Other,
}

impl ReasonArg {
    /// Map to the host transaction mask
    pub fn reasons(&self) -> TransactionReasons {
        match self {
            ReasonArg::Contracts => TransactionReasons::CONTRACT_REWARD,
            ReasonArg::Penalty => TransactionReasons::CONTRACT_PENALTY,
            ReasonArg::Progression => TransactionReasons::PROGRESSION,
            ReasonArg::Other => TransactionReasons::STRATEGIES,
        }
    }
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }
}

impl Verbosity {
    /// Log filter for this level; `None` means use the configured default
    pub fn log_filter(&self) -> Option<&'static str> {
        match self {
            Verbosity::Quiet => Some("error"),
            Verbosity::Normal => None,
            Verbosity::Verbose => Some("info"),
            Verbosity::VeryVerbose => Some("debug"),
        }
    }

    /// Check if should print payouts and summaries
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }

    /// Check if should show detailed events
    pub fn show_events(&self) -> bool {
        matches!(self, Verbosity::Verbose | Verbosity::VeryVerbose)
    }
}
