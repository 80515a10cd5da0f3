// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Bucket Port
//!
//! An object-store namespace: list names by glob, open one for reading,
//! create one for writing. Out of scope per the spec as a *concrete*
//! system (S3, GCS, ...) — this module only defines the contract. Reading
//! and writing are modeled as ordinary blocking `Read`/`Write` streams
//! (matching Go's `io.ReadCloser`/`io.WriteCloser`): only *acquiring* the
//! stream is async, since that's the part that talks to the remote store.
//! The codec/compression stack layered on top is therefore fully
//! synchronous, and the worker (C6) offloads it to a blocking task.

use crate::error::OctaveError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::{Read, Write};

/// Iterates over names matching a glob pattern within a bucket.
#[async_trait]
pub trait GlobIterator: Send {
    /// Advances to the next name. Returns `false` once exhausted or on
    /// error — callers must check [`GlobIterator::error`] afterwards.
    async fn next(&mut self) -> bool;

    /// The current name. Only meaningful after `next()` returned `true`.
    fn name(&self) -> &str;

    /// The first error encountered during iteration, if any.
    fn error(&self) -> Option<&OctaveError>;

    async fn close(&mut self) -> Result<(), OctaveError>;
}

/// An object-store namespace supporting list-by-glob, open-by-name,
/// create-by-name. Must be safe for concurrent use by multiple workers.
#[async_trait]
pub trait Bucket: Send + Sync {
    async fn glob(&self, pattern: &str) -> Result<Box<dyn GlobIterator>, OctaveError>;

    async fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, OctaveError>;

    async fn create(
        &self,
        name: &str,
        metadata: Option<HashMap<String, String>>,
    ) -> Result<Box<dyn Write + Send>, OctaveError>;

    async fn close(&self) -> Result<(), OctaveError>;
}
