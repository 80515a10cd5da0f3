// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Sink (C5)
//!
//! The write-side, multi-file staging area handed to the user transform.
//! Every output name gets its own temp file wrapped in a three-layer write
//! stack (raw file → compression → encoder), built lazily on first
//! reference and reused thereafter. `commit` closes every staged file
//! (flushing codec and compression trailers) before uploading each one to
//! the destination bucket through a bounded, reusable buffer; `discard`
//! skips the upload phase entirely. Either way the temp directory is always
//! removed and the file map always emptied, and a sink that has been
//! committed or discarded rejects further `encode` calls.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use octave_pipeline_domain::{Bucket, Coder, Compression, Encoder, EncoderExt, OctaveError};

use crate::options::{Options, TEMP_DIR_PREFIX};
use crate::shutdown::CancellationToken;
use crate::streams::{first_real_error, SharedRaw, SharedWriteClose};

/// Bytes moved per `std::io::copy`-style chunk during upload (spec.md
/// §4.4's "bounded reusable buffer").
const UPLOAD_BUFFER_SIZE: usize = 32 * 1024;

/// Ephemeral, per-source-file scratchpad: a private temp directory plus a
/// mapping from logical output name to its staged write stack.
pub struct Sink {
    temp_dir: Option<tempfile::TempDir>,
    files: HashMap<String, SinkFile>,
    token: CancellationToken,
    options: Arc<Options>,
}

impl Sink {
    /// Creates a fresh sink rooted at a new temp directory under
    /// `options.temp_dir` (or the OS default), prefixed `octave-`.
    /// `token` is normally a child of the pipeline's own cancellation token
    /// (see [`CancellationToken::child`]), so a pipeline-wide cancellation
    /// also cancels every in-flight sink's upload phase.
    pub fn new(options: Arc<Options>, token: CancellationToken) -> Result<Sink, OctaveError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_DIR_PREFIX);
        let temp_dir = match &options.temp_dir {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(OctaveError::from)?;

        Ok(Sink { temp_dir: Some(temp_dir), files: HashMap::new(), token, options })
    }

    /// Encodes `value` into the output named `name`, creating its write
    /// stack on first reference. Must not be called concurrently on the
    /// same sink — a sink is owned by exactly one worker task.
    pub fn encode<T: serde::Serialize>(&mut self, name: &str, value: &T) -> Result<(), OctaveError> {
        let temp_dir = self
            .temp_dir
            .as_ref()
            .ok_or_else(|| OctaveError::Internal(format!("sink already closed, cannot encode {name:?}")))?;

        if !self.files.contains_key(name) {
            let coder = self.options.resolve_coder(name).ok_or_else(|| OctaveError::NoCoder(name.to_string()))?;
            let compression = self.options.resolve_compression(name);
            let path = temp_dir.path().join(name);
            let file = SinkFile::new(&path, coder, compression)?;
            self.files.insert(name.to_string(), file);
        }

        self.files.get_mut(name).expect("just inserted above").encode(value)
    }

    /// Closes every staged file, then — unless the sink's token is
    /// cancelled or no destination is given — uploads each one to `dst`
    /// under its logical name. Always removes the temp directory and
    /// empties the file map, even on error.
    pub async fn commit(&mut self, dst: Option<&dyn Bucket>) -> Result<(), OctaveError> {
        let names: Vec<String> = self.files.keys().cloned().collect();
        let mut first_err = None;
        for name in &names {
            if let Some(file) = self.files.get_mut(name) {
                first_real_error(&mut first_err, file.close());
            }
        }

        let mut upload_result = Ok(());
        if !self.token.is_cancelled() {
            if let (Some(dst), Some(temp_dir)) = (dst, self.temp_dir.as_ref()) {
                let root = temp_dir.path().to_path_buf();
                upload_result = upload_staged_files(dst, &root, &names, self.options.base_metadata()).await;
            }
        }

        if let Some(temp_dir) = self.temp_dir.take() {
            let _ = temp_dir.close();
        }
        self.files.clear();

        match first_err {
            Some(err) => Err(err),
            None => upload_result,
        }
    }

    /// Cancels the sink's token and delegates to `commit(None)`: files are
    /// still closed and the temp directory still removed, but nothing is
    /// uploaded.
    pub async fn discard(&mut self) -> Result<(), OctaveError> {
        self.token.cancel();
        self.commit(None).await
    }
}

async fn upload_staged_files(
    dst: &dyn Bucket,
    root: &Path,
    names: &[String],
    metadata: HashMap<String, String>,
) -> Result<(), OctaveError> {
    for name in names {
        let path = root.join(name);
        let writer = dst.create(name, Some(metadata.clone())).await?;
        tokio::task::spawn_blocking(move || copy_file_into(&path, writer))
            .await
            .map_err(|err| OctaveError::Internal(err.to_string()))??;
    }
    Ok(())
}

fn copy_file_into(path: &Path, mut writer: Box<dyn Write + Send>) -> Result<(), OctaveError> {
    let mut reader = std::fs::File::open(path)?;
    let mut buf = [0u8; UPLOAD_BUFFER_SIZE];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        writer.write_all(&buf[..read])?;
    }
    writer.flush()?;
    Ok(())
}

/// The three-layer write stack for one staged output file: raw temp file →
/// compression → encoder. Closed strictly encoder → compression → raw.
struct SinkFile {
    raw: SharedRaw<std::fs::File>,
    compression: SharedWriteClose,
    encoder: Box<dyn Encoder>,
}

impl SinkFile {
    fn new(path: &Path, coder: Arc<dyn Coder>, compression: Arc<dyn Compression>) -> Result<Self, OctaveError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = SharedRaw::new(std::fs::File::create(path)?);
        let compressed_writer = compression.new_writer(Box::new(raw.clone()))?;
        let compression = SharedWriteClose::new(compressed_writer);
        let encoder = coder.new_encoder(Box::new(compression.clone()))?;
        Ok(Self { raw, compression, encoder })
    }

    fn encode<T: serde::Serialize>(&mut self, value: &T) -> Result<(), OctaveError> {
        self.encoder.encode(value)
    }

    fn close(&mut self) -> Result<(), OctaveError> {
        let mut first_err = None;
        first_real_error(&mut first_err, self.encoder.close());
        first_real_error(&mut first_err, self.compression.close());
        first_real_error(&mut first_err, self.raw.flush().map_err(OctaveError::from));
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::buckets::memory::MemoryBucket;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Rec {
        s: String,
        n: u32,
    }

    fn opts() -> Arc<Options> {
        Arc::new(Options::normalize(None))
    }

    #[tokio::test]
    async fn encode_then_commit_uploads_every_staged_file() {
        let dst = MemoryBucket::new();
        let mut sink = Sink::new(opts(), CancellationToken::new()).unwrap();

        sink.encode("a.ndjson", &Rec { s: "x".into(), n: 1 }).unwrap();
        sink.encode("a.ndjson", &Rec { s: "y".into(), n: 2 }).unwrap();
        sink.encode("b.json.gz", &Rec { s: "z".into(), n: 3 }).unwrap();

        sink.commit(Some(&dst)).await.unwrap();

        assert_eq!(dst.names(), vec!["a.ndjson".to_string(), "b.json.gz".to_string()]);
        let staged = dst.get("a.ndjson").unwrap();
        assert!(String::from_utf8_lossy(&staged).contains("\"x\""));
    }

    #[tokio::test]
    async fn discard_skips_upload_and_cleans_up() {
        let dst = MemoryBucket::new();
        let mut sink = Sink::new(opts(), CancellationToken::new()).unwrap();
        sink.encode("a.ndjson", &Rec { s: "x".into(), n: 1 }).unwrap();

        sink.discard().await.unwrap();

        assert!(dst.is_empty());
    }

    #[tokio::test]
    async fn encode_after_commit_fails() {
        let mut sink = Sink::new(opts(), CancellationToken::new()).unwrap();
        sink.encode("a.ndjson", &Rec { s: "x".into(), n: 1 }).unwrap();
        sink.commit(None).await.unwrap();

        let err = sink.encode("a.ndjson", &Rec { s: "y".into(), n: 2 }).unwrap_err();
        assert!(matches!(err, OctaveError::Internal(_)));
    }

    #[tokio::test]
    async fn unknown_output_suffix_fails_with_no_coder() {
        let mut sink = Sink::new(opts(), CancellationToken::new()).unwrap();
        let err = sink.encode("a.bin", &Rec { s: "x".into(), n: 1 }).unwrap_err();
        assert!(matches!(err, OctaveError::NoCoder(_)));
    }

    #[tokio::test]
    async fn reuses_the_same_write_stack_for_repeat_encodes() {
        let dst = MemoryBucket::new();
        let mut sink = Sink::new(opts(), CancellationToken::new()).unwrap();
        for i in 0..5 {
            sink.encode("all.ndjson", &Rec { s: format!("rec{i}"), n: i }).unwrap();
        }
        sink.commit(Some(&dst)).await.unwrap();

        let staged = String::from_utf8(dst.get("all.ndjson").unwrap()).unwrap();
        assert_eq!(staged.lines().count(), 5);
    }
}
