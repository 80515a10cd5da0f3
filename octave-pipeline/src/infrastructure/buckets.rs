// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Reference [`Bucket`](octave_pipeline_domain::Bucket) implementations: a
//! local-filesystem bucket for a runnable end-to-end demo, and an in-memory
//! bucket used throughout the engine's own test suite in place of a real
//! object store.

use std::sync::Arc;

use octave_pipeline_domain::{Bucket, OctaveError};

pub mod local_fs;
pub mod memory;

/// Resolves a bucket URL to a concrete [`Bucket`], the minimal analogue of
/// `gocloud.dev/blob.OpenBucket`'s scheme registry. Only `file://` is
/// wired to a real adapter; every other scheme is a configuration error,
/// surfaced at [`crate::pipeline::Pipeline::create`] time rather than once
/// the pipeline is already running.
pub fn open_url(url: &str) -> Result<Arc<dyn Bucket>, OctaveError> {
    match url.split_once("://") {
        Some(("file", path)) => Ok(Arc::new(local_fs::LocalFsBucket::new(path))),
        Some((scheme, _)) => Err(OctaveError::Config(format!("unsupported bucket scheme: {scheme:?}"))),
        None => Err(OctaveError::Config(format!("not a bucket url: {url:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_file_url() {
        assert!(open_url("file:///tmp/data").is_ok());
    }

    #[test]
    fn rejects_an_unknown_scheme() {
        let err = open_url("s3://bucket/key").unwrap_err();
        assert!(matches!(err, OctaveError::Config(_)));
    }

    #[test]
    fn rejects_a_malformed_url() {
        let err = open_url("not-a-url").unwrap_err();
        assert!(matches!(err, OctaveError::Config(_)));
    }
}
