// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Gzip Compression Adapter
//!
//! The default compression registered for `.gz`, built on `flate2`. Also
//! hosts [`NoopCompression`], the pass-through used whenever a filename has
//! no recognized compression suffix.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzLevel;
use octave_pipeline_domain::{Compression, OctaveError, ReadClose, WriteClose};

pub struct GzipCompression;

impl Compression for GzipCompression {
    fn new_reader(&self, reader: Box<dyn Read + Send>) -> Result<Box<dyn ReadClose>, OctaveError> {
        Ok(Box::new(GzipReader(GzDecoder::new(reader))))
    }

    fn new_writer(&self, writer: Box<dyn Write + Send>) -> Result<Box<dyn WriteClose>, OctaveError> {
        Ok(Box::new(GzipWriter(GzEncoder::new(writer, GzLevel::default()))))
    }
}

struct GzipReader(GzDecoder<Box<dyn Read + Send>>);

impl Read for GzipReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl ReadClose for GzipReader {
    fn close(&mut self) -> Result<(), OctaveError> {
        // Draining to EOF validates the trailing CRC/size footer without
        // taking ownership of (and thus closing) the underlying reader.
        let mut sink = [0u8; 4096];
        loop {
            match self.0.read(&mut sink) {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(err) => return Err(OctaveError::from(err)),
            }
        }
    }
}

struct GzipWriter(GzEncoder<Box<dyn Write + Send>>);

impl Write for GzipWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl WriteClose for GzipWriter {
    fn close(&mut self) -> Result<(), OctaveError> {
        // Flushes the gzip trailer without consuming the encoder, so the
        // underlying writer stays owned by the caller (the sink).
        self.0.try_finish().map_err(OctaveError::from)
    }
}

/// The no-op compression substituted whenever a filename has no registered
/// compression suffix: bytes pass through unchanged.
pub struct NoopCompression;

impl Compression for NoopCompression {
    fn new_reader(&self, reader: Box<dyn Read + Send>) -> Result<Box<dyn ReadClose>, OctaveError> {
        Ok(Box::new(PassthroughReader(reader)))
    }

    fn new_writer(&self, writer: Box<dyn Write + Send>) -> Result<Box<dyn WriteClose>, OctaveError> {
        Ok(Box::new(PassthroughWriter(writer)))
    }
}

struct PassthroughReader(Box<dyn Read + Send>);

impl Read for PassthroughReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.0.read(buf)
    }
}

impl ReadClose for PassthroughReader {
    fn close(&mut self) -> Result<(), OctaveError> {
        Ok(())
    }
}

struct PassthroughWriter(Box<dyn Write + Send>);

impl Write for PassthroughWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

impl WriteClose for PassthroughWriter {
    fn close(&mut self) -> Result<(), OctaveError> {
        self.0.flush().map_err(OctaveError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::test_support::SharedBuf;
    use std::io::Read as _;

    #[test]
    fn gzip_round_trips_bytes() {
        let compression = GzipCompression;
        let shared = SharedBuf::default();
        {
            let mut writer = compression.new_writer(Box::new(shared.clone())).unwrap();
            writer.write_all(b"hello octave").unwrap();
            writer.close().unwrap();
        }
        let compressed = shared.into_vec();
        assert_ne!(compressed.as_slice(), b"hello octave");

        let mut reader = compression.new_reader(Box::new(std::io::Cursor::new(compressed))).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        reader.close().unwrap();
        assert_eq!(out, "hello octave");
    }

    #[test]
    fn noop_compression_passes_bytes_through() {
        let compression = NoopCompression;
        let shared = SharedBuf::default();
        {
            let mut writer = compression.new_writer(Box::new(shared.clone())).unwrap();
            writer.write_all(b"raw").unwrap();
            writer.close().unwrap();
        }
        assert_eq!(shared.into_vec(), b"raw");
    }
}
