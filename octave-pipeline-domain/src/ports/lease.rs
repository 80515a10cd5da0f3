// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Lease Port
//!
//! The distributed mutex keyed by filename that guarantees at-most-once
//! processing across a fleet of workers. Out of scope per the spec as a
//! *concrete* system (a production lock service) — this module only
//! defines the contract, modeled on the Go source's `accord.Client`.
//!
//! `acquire` surfaces "already acquired by another worker" and "already
//! done" as [`OctaveError::LeaseAcquired`]/[`OctaveError::LeaseDone`]
//! rather than a distinct `Result` arm, since the worker's handling of
//! both is identical: stop, return success, don't touch the file.

use crate::error::OctaveError;
use async_trait::async_trait;
use std::collections::HashMap;

/// A held lease on a single filename. Exactly one of `done`/`discard` is
/// called per acquisition; both are idempotent no-ops once called.
#[async_trait]
pub trait LeaseHandle: Send {
    /// Marks the lease permanently done (acknowledges successful
    /// processing). Must only be called after the sink has been committed
    /// to the destination.
    async fn done(&mut self, metadata: Option<HashMap<String, String>>) -> Result<(), OctaveError>;

    /// Releases the lease without acknowledging it; the file will be
    /// retried on a future cycle.
    async fn discard(&mut self) -> Result<(), OctaveError>;
}

/// Must be safe for concurrent use by multiple workers.
#[async_trait]
pub trait LeaseClient: Send + Sync {
    /// Acquires a lease on `name`. Returns
    /// `Err(OctaveError::LeaseAcquired)` if another worker currently holds
    /// it, or `Err(OctaveError::LeaseDone)` if it has already been marked
    /// done; both are skip signals, not failures.
    async fn acquire(
        &self,
        name: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<Box<dyn LeaseHandle>, OctaveError>;
}
