// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Command-Line Interface
//!
//! Bootstrap-layer CLI handling, scaled down from the teacher's two-stage
//! `clap` parse + security-validation pipeline (`cli::parser` /
//! `cli::validator`) and its multi-command `Commands` enum to the one
//! subcommand this crate actually exposes: `octave run`. Parsing and
//! validation stay two distinct steps — `Cli` is exactly what `clap`
//! produces, `ValidatedCli` is what `main` actually trusts — so a malformed
//! invocation (negative concurrency, an empty glob, an unresolvable bucket
//! scheme) fails before a single lease is acquired.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "octave", about = "Run the octave batch file-processing pipeline", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the pipeline, cycling the source bucket until cancelled.
    Run(RunArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Source bucket URL, e.g. `file:///var/data/incoming`.
    #[arg(long)]
    pub src: String,

    /// Destination bucket URL, e.g. `file:///var/data/processed`.
    #[arg(long)]
    pub dst: String,

    /// Glob pattern applied to the source bucket each cycle.
    #[arg(long, default_value = "**")]
    pub glob: String,

    /// Maximum number of files processed concurrently. Defaults to the
    /// number of available CPUs when omitted.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Seconds to sleep between cycles that found nothing left to process.
    #[arg(long)]
    pub pause_secs: Option<u64>,

    /// Directory the sink stages output files under before upload. Defaults
    /// to the OS temp directory.
    #[arg(long)]
    pub temp_dir: Option<PathBuf>,
}

/// A `Cli` that has passed security/range validation and is safe to act on.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub src: String,
    pub dst: String,
    pub glob: String,
    pub concurrency: Option<usize>,
    pub pause: Option<Duration>,
    pub temp_dir: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("--src must not be empty")]
    EmptySrc,
    #[error("--dst must not be empty")]
    EmptyDst,
    #[error("--glob must not be empty")]
    EmptyGlob,
    #[error("--concurrency must be at least 1, got {0}")]
    ZeroConcurrency(usize),
    #[error("unresolvable bucket url: {0}")]
    BadUrl(#[from] octave_pipeline_domain::OctaveError),
}

/// Parses `std::env::args` via `clap` (exiting the process on `--help`/
/// `--version`/a parse error, as `clap` does by default), then validates
/// the result.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let Cli { command: Command::Run(args) } = Cli::parse();
    validate(args)
}

/// Validates an already-parsed [`RunArgs`]. Split out from
/// [`parse_and_validate`] so tests can exercise validation without going
/// through `clap::Parser`.
pub fn validate(args: RunArgs) -> Result<ValidatedCli, ParseError> {
    if args.src.trim().is_empty() {
        return Err(ParseError::EmptySrc);
    }
    if args.dst.trim().is_empty() {
        return Err(ParseError::EmptyDst);
    }
    if args.glob.trim().is_empty() {
        return Err(ParseError::EmptyGlob);
    }
    if let Some(0) = args.concurrency {
        return Err(ParseError::ZeroConcurrency(0));
    }

    // open_url does no I/O; this just rejects an unresolvable scheme before
    // the pipeline is ever constructed.
    octave_pipeline::infrastructure::buckets::open_url(&args.src)?;
    octave_pipeline::infrastructure::buckets::open_url(&args.dst)?;

    Ok(ValidatedCli {
        src: args.src,
        dst: args.dst,
        glob: args.glob,
        concurrency: args.concurrency,
        pause: args.pause_secs.map(Duration::from_secs),
        temp_dir: args.temp_dir,
    })
}
