//! Command-line argument definitions for the swatch CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the token files to check, configuration
//! file selection, and logging verbosity.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command-line arguments for the swatch design token compiler
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile token files and report every problem found
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Token documents to compile, in merge order
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Keep going after the first error and report all of them
    #[arg(long)]
    pub continue_on_error: bool,

    /// Write the normalized token document (JSON) to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
