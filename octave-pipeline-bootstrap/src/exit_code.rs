// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Process Exit Codes
//!
//! Maps a pipeline run's `Result` onto a Unix `sysexits.h`-style exit code,
//! the way the teacher crate's bootstrap layer documents doing (its
//! `ExitCode`/`map_error_to_exit_code`/`result_to_exit_code` trio). A fatal
//! `run()` error is a configuration/data problem from the operator's point
//! of view, not a generic crash, so it gets its own code rather than a bare
//! `1`.

use octave_pipeline_domain::OctaveError;

/// Exit codes this binary can return, following the `sysexits.h` convention
/// the teacher's bootstrap doc comments reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Everything ran to completion (or was cancelled) without a fatal error.
    Ok = 0,
    /// CLI arguments failed validation before the pipeline ever started.
    Usage = 64,
    /// Malformed input data (e.g. a file with no resolvable codec).
    DataErr = 65,
    /// A configuration problem (unresolvable bucket URL, bad registry).
    Config = 78,
    /// Any other fatal pipeline error (bucket/lease/I-O failure).
    Software = 70,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

/// Maps a fatal [`OctaveError`] returned by `Pipeline::run` to an
/// [`ExitCode`]. Only called on the `Err` path — cancellation is `Ok(())`
/// and always maps to [`ExitCode::Ok`].
pub fn map_error_to_exit_code(err: &OctaveError) -> ExitCode {
    match unwrap_in_file(err) {
        OctaveError::NoCoder(_) | OctaveError::Decode(_) | OctaveError::Encode(_) | OctaveError::Compression(_) => {
            ExitCode::DataErr
        }
        OctaveError::Config(_) => ExitCode::Config,
        _ => ExitCode::Software,
    }
}

fn unwrap_in_file(err: &OctaveError) -> &OctaveError {
    match err {
        OctaveError::InFile { source, .. } => unwrap_in_file(source),
        other => other,
    }
}

/// Converts a pipeline run's result into the process exit code this
/// binary's `main` should return.
pub fn result_to_exit_code(result: Result<(), OctaveError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::Ok,
        Err(err) => map_error_to_exit_code(&err),
    }
}
