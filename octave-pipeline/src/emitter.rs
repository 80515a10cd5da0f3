// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Emitter (C4)
//!
//! Thin read-side adapter handed to the user transform: a decoder paired
//! with the source filename it was opened from. The emitter never closes
//! the decoder — the worker owns that lifecycle, since the emitter may be
//! dropped mid-transform on error without ever reaching end-of-stream.

use octave_pipeline_domain::{Decoder, DecoderExt, OctaveError};
use serde::de::DeserializeOwned;

/// Pairs a `Decoder` with the name of the file it is reading, so the user
/// transform can tell which source file a record came from.
pub struct Emitter<'a> {
    decoder: &'a mut dyn Decoder,
    name: String,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(decoder: &'a mut dyn Decoder, name: impl Into<String>) -> Self {
        Self { decoder, name: name.into() }
    }

    /// The source filename this emitter's records are decoded from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Decodes the next record. Returns [`OctaveError::EndOfStream`] once
    /// the underlying stream is exhausted.
    pub fn decode<T: DeserializeOwned>(&mut self) -> Result<T, OctaveError> {
        self.decoder.decode::<T>()
    }
}
