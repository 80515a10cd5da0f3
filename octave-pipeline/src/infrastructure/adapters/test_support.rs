// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Test-only helper shared by the codec/compression adapter unit tests: an
//! owned, cloneable in-memory buffer so a test can hand a `Box<dyn Write +
//! Send>` to an encoder while keeping a handle to read the bytes back.

#![cfg(test)]

use std::io::Write;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
pub(crate) struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    pub(crate) fn into_vec(self) -> Vec<u8> {
        Arc::try_unwrap(self.0).expect("no other clones outstanding").into_inner().unwrap()
    }
}

impl Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
