// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Codec Port
//!
//! A `Coder` is a factory pair: wrap a reader with a `Decoder`, wrap a
//! writer with an `Encoder`. A `Decoder` produces a lazy, finite sequence
//! of records, signalling end-of-stream via [`OctaveError::EndOfStream`]
//! rather than `Option`/`Result` nesting — this mirrors the Go source's use
//! of `io.EOF` and keeps the trait dyn-compatible.
//!
//! Because the record type is chosen by the caller per decode/encode call
//! (the Go source just takes `interface{}`), the base traits work over
//! `erased_serde` trait objects so `Box<dyn Decoder>`/`Box<dyn Encoder>` can
//! live in a registry. [`DecoderExt`]/[`EncoderExt`] supply the ergonomic
//! generic methods consumers actually call.

use crate::error::OctaveError;
use erased_serde::{Deserializer as ErasedDeserializer, Serialize as ErasedSerialize};
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

/// Decodes a stream into a lazy sequence of records.
///
/// Owns no resources beyond the reader it was given; `close()` must flush
/// but never close that reader — ownership of the underlying stream stays
/// with the caller (the sink/worker layer).
pub trait Decoder: Send {
    /// Decodes the next record, feeding it to `visit` as an erased
    /// deserializer. Returns [`OctaveError::EndOfStream`] once the stream
    /// is exhausted.
    fn decode_erased(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn ErasedDeserializer) -> Result<(), erased_serde::Error>,
    ) -> Result<(), OctaveError>;

    /// Flushes and releases decoder-owned state. Never closes the
    /// underlying reader.
    fn close(&mut self) -> Result<(), OctaveError>;
}

/// Ergonomic, generic decode on top of the object-safe [`Decoder`] trait.
pub trait DecoderExt: Decoder {
    fn decode<T: DeserializeOwned>(&mut self) -> Result<T, OctaveError> {
        let mut slot: Option<T> = None;
        self.decode_erased(&mut |deser| {
            slot = Some(erased_serde::deserialize(deser)?);
            Ok(())
        })?;
        slot.ok_or_else(|| OctaveError::Decode("decoder produced no value".into()))
    }
}
impl<D: Decoder + ?Sized> DecoderExt for D {}

/// Encodes records to a stream.
///
/// Owns no resources beyond the writer it was given; `close()` must flush
/// trailers but never close that writer.
pub trait Encoder: Send {
    fn encode_erased(&mut self, value: &dyn ErasedSerialize) -> Result<(), OctaveError>;

    fn close(&mut self) -> Result<(), OctaveError>;
}

/// Ergonomic, generic encode on top of the object-safe [`Encoder`] trait.
pub trait EncoderExt: Encoder {
    fn encode<T: serde::Serialize>(&mut self, value: &T) -> Result<(), OctaveError> {
        self.encode_erased(value)
    }
}
impl<E: Encoder + ?Sized> EncoderExt for E {}

/// Factory pair selected by filename suffix (see the codec registry).
pub trait Coder: Send + Sync {
    /// Wraps a decoder around a reader.
    fn new_decoder(&self, reader: Box<dyn Read + Send>) -> Result<Box<dyn Decoder>, OctaveError>;

    /// Wraps an encoder around a writer.
    fn new_encoder(&self, writer: Box<dyn Write + Send>) -> Result<Box<dyn Encoder>, OctaveError>;
}
