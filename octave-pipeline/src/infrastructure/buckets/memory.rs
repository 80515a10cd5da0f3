// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # In-Memory Bucket
//!
//! A [`Bucket`] over `Arc<Mutex<HashMap<String, Vec<u8>>>>`, the Rust
//! analogue of the Go test suite's `bfs.InMem`. Exists purely so the engine
//! test suite (cycle driver, sink, worker) has a concrete, dependency-free
//! bucket to drive end-to-end without touching the filesystem or network.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::vec::IntoIter;

use async_trait::async_trait;
use octave_pipeline_domain::{Bucket, GlobIterator, OctaveError};

#[derive(Clone, Default)]
pub struct MemoryBucket {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the bucket with an object, as a test fixture would.
    pub fn seed(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.lock().unwrap().insert(name.into(), bytes.into());
    }

    /// Reads back an object written via [`Bucket::create`], for assertions.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }

    /// All object names currently present, for assertions.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.files.lock().unwrap().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl Bucket for MemoryBucket {
    async fn glob(&self, pattern: &str) -> Result<Box<dyn GlobIterator>, OctaveError> {
        let glob_pattern = glob::Pattern::new(pattern).map_err(|err| OctaveError::Bucket(err.to_string()))?;
        let mut names: Vec<String> =
            self.files.lock().unwrap().keys().filter(|name| glob_pattern.matches(name)).cloned().collect();
        names.sort();
        Ok(Box::new(MemoryGlobIterator { names: names.into_iter(), current: None }))
    }

    async fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, OctaveError> {
        let data =
            self.files.lock().unwrap().get(name).cloned().ok_or_else(|| OctaveError::Bucket(format!("no such object: {name}")))?;
        Ok(Box::new(std::io::Cursor::new(data)))
    }

    async fn create(
        &self,
        name: &str,
        _metadata: Option<HashMap<String, String>>,
    ) -> Result<Box<dyn Write + Send>, OctaveError> {
        Ok(Box::new(MemoryWriter { name: name.to_string(), buf: Vec::new(), files: self.files.clone() }))
    }

    async fn close(&self) -> Result<(), OctaveError> {
        Ok(())
    }
}

/// Buffers writes and commits them into the bucket's map on drop, mirroring
/// how a real object-store writer only becomes visible once the upload
/// finishes.
struct MemoryWriter {
    name: String,
    buf: Vec<u8>,
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Write for MemoryWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for MemoryWriter {
    fn drop(&mut self) {
        self.files.lock().unwrap().insert(std::mem::take(&mut self.name), std::mem::take(&mut self.buf));
    }
}

struct MemoryGlobIterator {
    names: IntoIter<String>,
    current: Option<String>,
}

#[async_trait]
impl GlobIterator for MemoryGlobIterator {
    async fn next(&mut self) -> bool {
        self.current = self.names.next();
        self.current.is_some()
    }

    fn name(&self) -> &str {
        self.current.as_deref().unwrap_or("")
    }

    fn error(&self) -> Option<&OctaveError> {
        None
    }

    async fn close(&mut self) -> Result<(), OctaveError> {
        Ok(())
    }
}
