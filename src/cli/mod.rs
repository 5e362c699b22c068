//! CLI module for repbudget
//!
//! Handles command-line argument parsing.

pub mod args;

pub use args::{Args, Commands, ReasonArg, Verbosity};
