// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Shared Layer Handles
//!
//! The layered read/write stacks in the sink (C5) and the file worker (C6)
//! need the same shape of reference Go gets for free: `f`, `c := gzip.NewWriter(f)`
//! and `e := json.NewEncoder(c)` are three independently addressable
//! variables even though `c` writes through `f` and `e` writes through `c`.
//! In Rust, handing a layer ownership of the thing it wraps means the outer
//! caller can no longer reach the inner layer to close it on its own. These
//! thin `Arc<Mutex<_>>` handles give every layer of the stack its own
//! reference to the same underlying object, so `SinkFile`/the worker can
//! call close on each layer independently, in the order the spec requires,
//! without fighting the borrow checker over single ownership.
//!
//! None of this is performance-sensitive: a sink file is touched by exactly
//! one worker task, so the mutex is never contended.

use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use octave_pipeline_domain::{OctaveError, ReadClose, WriteClose};

fn lock<'a, T>(mutex: &'a Mutex<T>) -> MutexGuard<'a, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A handle onto a raw writer (the sink's temp file) that can be cloned and
/// handed to the compression layer while the sink keeps its own handle for
/// the final, independent close.
///
/// Implemented by hand rather than `#[derive(Clone)]`: the derive would add
/// a `W: Clone` bound that `std::fs::File` (the only `W` this is used with)
/// doesn't satisfy, even though cloning the handle only clones the `Arc`.
pub(crate) struct SharedRaw<W>(Arc<Mutex<W>>);

impl<W> Clone for SharedRaw<W> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<W> SharedRaw<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self(Arc::new(Mutex::new(inner)))
    }
}

impl<W: Write> Write for SharedRaw<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.0).flush()
    }
}

impl<R: Read> Read for SharedRaw<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        lock(&self.0).read(buf)
    }
}

/// A handle onto the compression layer, shared between the `SinkFile` (for
/// its own `close()` call) and the encoder it hands the writer to.
#[derive(Clone)]
pub(crate) struct SharedWriteClose(Arc<Mutex<Box<dyn WriteClose>>>);

impl SharedWriteClose {
    pub(crate) fn new(inner: Box<dyn WriteClose>) -> Self {
        Self(Arc::new(Mutex::new(inner)))
    }

    pub(crate) fn close(&self) -> Result<(), OctaveError> {
        lock(&self.0).close()
    }
}

impl Write for SharedWriteClose {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        lock(&self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        lock(&self.0).flush()
    }
}

/// A handle onto the decompression layer, shared between the worker (for
/// its own `close()` call) and the decoder it hands the reader to.
#[derive(Clone)]
pub(crate) struct SharedReadClose(Arc<Mutex<Box<dyn ReadClose>>>);

impl SharedReadClose {
    pub(crate) fn new(inner: Box<dyn ReadClose>) -> Self {
        Self(Arc::new(Mutex::new(inner)))
    }

    pub(crate) fn close(&self) -> Result<(), OctaveError> {
        lock(&self.0).close()
    }
}

impl Read for SharedReadClose {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        lock(&self.0).read(buf)
    }
}

/// Runs `f`, swallowing any [`OctaveError::Cancelled`] it returns, mirroring
/// the spec's "cancellation-caused errors are ignored" close-path policy
/// (spec.md §5). Returns the first real error encountered, if any.
pub(crate) fn first_real_error(
    slot: &mut Option<OctaveError>,
    result: Result<(), OctaveError>,
) {
    if let Err(err) = result {
        if !err.is_cancelled() && slot.is_none() {
            *slot = Some(err);
        }
    }
}
