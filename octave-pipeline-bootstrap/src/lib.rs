// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Module
//!
//! Sits outside the pipeline crate's own layering (domain ports, engine,
//! infrastructure adapters) and provides the process-level concerns the
//! engine itself has no opinion about:
//!
//! - **CLI parsing** — [`cli`], secure argument parsing via `clap`.
//! - **Signal handling** — [`shutdown`], `SIGINT`/`SIGTERM` wired to the
//!   pipeline's own [`CancellationToken`](octave_pipeline::CancellationToken).
//! - **Logging** — [`logger`], a `tracing` subscriber installed once at
//!   process entry.
//! - **Exit codes** — [`exit_code`], mapping a fatal pipeline error onto a
//!   `sysexits.h`-style process exit code.
//!
//! `main.rs` is the only caller of this crate; everything here is public so
//! the binary (and tests) can exercise each piece independently.

pub mod cli;
pub mod exit_code;
pub mod logger;
pub mod shutdown;

pub use cli::{parse_and_validate, Cli, ParseError, ValidatedCli};
pub use exit_code::{map_error_to_exit_code, result_to_exit_code, ExitCode};
pub use shutdown::install_signal_handler;
