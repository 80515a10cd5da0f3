// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # JSON Codec Adapter
//!
//! The default codec registered for `.json` and `.ndjson`: one JSON value
//! per record, newline-delimited on the write side so concatenating staged
//! shards (or tailing them) stays sane. Built on `serde_json` +
//! `erased_serde` so the object-safe [`Decoder`]/[`Encoder`] traits can
//! still hand callers a concretely-typed value via [`DecoderExt`]/[`EncoderExt`].

use std::io::{BufRead, BufReader, Read, Write};

use erased_serde::{Deserializer as ErasedDeserializer, Serialize as ErasedSerialize};
use octave_pipeline_domain::{Coder, Decoder, Encoder, OctaveError};

/// `{.json, .ndjson} -> JsonCoder` is the spec's default codec mapping.
pub struct JsonCoder;

impl Coder for JsonCoder {
    fn new_decoder(&self, reader: Box<dyn Read + Send>) -> Result<Box<dyn Decoder>, OctaveError> {
        Ok(Box::new(JsonDecoder { reader: BufReader::new(reader) }))
    }

    fn new_encoder(&self, writer: Box<dyn Write + Send>) -> Result<Box<dyn Encoder>, OctaveError> {
        Ok(Box::new(JsonEncoder { writer }))
    }
}

struct JsonDecoder {
    reader: BufReader<Box<dyn Read + Send>>,
}

impl Decoder for JsonDecoder {
    fn decode_erased(
        &mut self,
        visit: &mut dyn FnMut(&mut dyn ErasedDeserializer) -> Result<(), erased_serde::Error>,
    ) -> Result<(), OctaveError> {
        // ndjson may separate records with blank lines; skip leading
        // whitespace so a trailing newline doesn't look like another record.
        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Err(OctaveError::EndOfStream);
            }
            if buf[0].is_ascii_whitespace() {
                self.reader.consume(1);
                continue;
            }
            break;
        }

        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        let mut erased = <dyn ErasedDeserializer>::erase(&mut de);
        visit(&mut erased).map_err(|e| OctaveError::Decode(e.to_string()))
    }

    fn close(&mut self) -> Result<(), OctaveError> {
        // Nothing to flush; the reader stays open for the caller.
        Ok(())
    }
}

struct JsonEncoder {
    writer: Box<dyn Write + Send>,
}

impl Encoder for JsonEncoder {
    fn encode_erased(&mut self, value: &dyn ErasedSerialize) -> Result<(), OctaveError> {
        let mut ser = serde_json::Serializer::new(&mut self.writer);
        let mut erased = <dyn erased_serde::Serializer>::erase(&mut ser);
        value.erased_serialize(&mut erased).map_err(|e| OctaveError::Encode(e.to_string()))?;
        self.writer.write_all(b"\n").map_err(OctaveError::from)
    }

    fn close(&mut self) -> Result<(), OctaveError> {
        self.writer.flush().map_err(OctaveError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::test_support::SharedBuf;
    use octave_pipeline_domain::{DecoderExt, EncoderExt};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rec {
        s: String,
        n: u32,
    }

    #[test]
    fn round_trips_multiple_records() {
        let coder = JsonCoder;
        let shared = SharedBuf::default();
        {
            let mut encoder = coder.new_encoder(Box::new(shared.clone())).unwrap();
            encoder.encode(&Rec { s: "a".into(), n: 1 }).unwrap();
            encoder.encode(&Rec { s: "b".into(), n: 2 }).unwrap();
            encoder.close().unwrap();
        }
        let buf = shared.into_vec();

        let mut decoder = coder.new_decoder(Box::new(std::io::Cursor::new(buf))).unwrap();
        let first: Rec = decoder.decode().unwrap();
        let second: Rec = decoder.decode().unwrap();
        assert_eq!(first, Rec { s: "a".into(), n: 1 });
        assert_eq!(second, Rec { s: "b".into(), n: 2 });
        assert!(matches!(decoder.decode::<Rec>(), Err(OctaveError::EndOfStream)));
    }
}
