// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single hierarchical error type for the pipeline domain, in the spirit of
//! the teacher crate's `PipelineError`: one enum, one category per kind of
//! failure, `thiserror` for the boilerplate. Two variants are not really
//! "errors" in the ordinary sense — `EndOfStream` and the lease skip
//! sentinels — but are modeled as error variants because that is how the
//! spec's own interfaces signal them (a distinguished error return).

use thiserror::Error;

/// Errors that can occur anywhere in the pipeline domain or engine.
#[derive(Error, Debug, Clone)]
pub enum OctaveError {
    /// Returned by a `Decoder` once the underlying stream is exhausted.
    /// Not a failure — the worker and emitter treat this as a normal
    /// end-of-sequence signal, the analogue of Go's `io.EOF`.
    #[error("end of stream")]
    EndOfStream,

    /// No codec could be resolved for a filename.
    #[error("unable to detect coder for {0:?}")]
    NoCoder(String),

    /// The lease is already held by another worker. A skip signal, not a
    /// failure: the file is silently bypassed this cycle.
    #[error("lease already acquired")]
    LeaseAcquired,

    /// The lease has already been marked done by a previous run. A skip
    /// signal: the file is silently bypassed.
    #[error("lease already done")]
    LeaseDone,

    /// The pipeline (or the enclosing sink/worker) was cancelled. Swallowed
    /// during cleanup paths rather than surfaced as a real failure.
    #[error("cancelled")]
    Cancelled,

    #[error("bucket error: {0}")]
    Bucket(String),

    #[error("lease error: {0}")]
    Lease(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("compression error: {0}")]
    Compression(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{filename}: {source}")]
    InFile {
        filename: String,
        #[source]
        source: Box<OctaveError>,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl OctaveError {
    /// Wraps an error with the filename it occurred while processing,
    /// matching spec's "every returned error is annotated with the
    /// filename" requirement for the file worker (C6).
    pub fn in_file(self, filename: impl Into<String>) -> Self {
        OctaveError::InFile {
            filename: filename.into(),
            source: Box::new(self),
        }
    }

    /// True for the three signals the cycle driver treats as "skip this
    /// file, don't fail the cycle": an already-acquired or already-done
    /// lease. A predicate returning `false` is handled separately by the
    /// cycle driver and never constructs an error at all.
    pub fn is_skip(&self) -> bool {
        matches!(self, OctaveError::LeaseAcquired | OctaveError::LeaseDone)
    }

    /// True for cancellation-derived errors, which close/discard paths
    /// must swallow rather than report as the "real" failure reason.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, OctaveError::Cancelled)
    }
}

impl From<std::io::Error> for OctaveError {
    fn from(err: std::io::Error) -> Self {
        OctaveError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for OctaveError {
    fn from(err: serde_json::Error) -> Self {
        OctaveError::Decode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_with_filename() {
        let err = OctaveError::NoCoder("readme.txt".into()).in_file("readme.txt");
        assert_eq!(err.to_string(), "readme.txt: unable to detect coder for \"readme.txt\"");
    }

    #[test]
    fn skip_signals_are_recognized() {
        assert!(OctaveError::LeaseAcquired.is_skip());
        assert!(OctaveError::LeaseDone.is_skip());
        assert!(!OctaveError::NoCoder("x".into()).is_skip());
    }

    #[test]
    fn cancellation_is_recognized() {
        assert!(OctaveError::Cancelled.is_cancelled());
        assert!(!OctaveError::Io("x".into()).is_cancelled());
    }
}
