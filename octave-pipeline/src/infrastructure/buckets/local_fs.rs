// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Local-Filesystem Bucket
//!
//! A [`Bucket`] rooted at a directory on disk. Lets the pipeline run
//! end-to-end (demo/CLI consumers) without a real object-store dependency.
//! Directory walking and file I/O are blocking, so every call is offloaded
//! to [`tokio::task::spawn_blocking`].

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::vec::IntoIter;

use async_trait::async_trait;
use octave_pipeline_domain::{Bucket, GlobIterator, OctaveError};

/// A bucket backed by a directory on the local filesystem. Names are paths
/// relative to `root`, always using `/` as the separator regardless of host
/// platform.
pub struct LocalFsBucket {
    root: PathBuf,
}

impl LocalFsBucket {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Bucket for LocalFsBucket {
    async fn glob(&self, pattern: &str) -> Result<Box<dyn GlobIterator>, OctaveError> {
        let root = self.root.clone();
        let pattern = pattern.to_string();
        let names = tokio::task::spawn_blocking(move || -> Result<Vec<String>, OctaveError> {
            let full_pattern = root.join(&pattern);
            let full_pattern =
                full_pattern.to_str().ok_or_else(|| OctaveError::Bucket("non-utf8 glob pattern".into()))?;
            let mut names = Vec::new();
            for entry in glob::glob(full_pattern).map_err(|err| OctaveError::Bucket(err.to_string()))? {
                let path = entry.map_err(|err| OctaveError::Bucket(err.to_string()))?;
                if path.is_file() {
                    let rel = path.strip_prefix(&root).unwrap_or(&path);
                    names.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
            names.sort();
            Ok(names)
        })
        .await
        .map_err(|err| OctaveError::Internal(err.to_string()))??;

        Ok(Box::new(LocalFsGlobIterator { names: names.into_iter(), current: None }))
    }

    async fn open(&self, name: &str) -> Result<Box<dyn Read + Send>, OctaveError> {
        let path = self.root.join(name);
        let file = tokio::task::spawn_blocking(move || std::fs::File::open(path))
            .await
            .map_err(|err| OctaveError::Internal(err.to_string()))?
            .map_err(OctaveError::from)?;
        Ok(Box::new(file))
    }

    async fn create(
        &self,
        name: &str,
        _metadata: Option<HashMap<String, String>>,
    ) -> Result<Box<dyn Write + Send>, OctaveError> {
        let path = self.root.join(name);
        let file = tokio::task::spawn_blocking(move || {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(&path)
        })
        .await
        .map_err(|err| OctaveError::Internal(err.to_string()))?
        .map_err(OctaveError::from)?;
        Ok(Box::new(file))
    }

    async fn close(&self) -> Result<(), OctaveError> {
        Ok(())
    }
}

struct LocalFsGlobIterator {
    names: IntoIter<String>,
    current: Option<String>,
}

#[async_trait]
impl GlobIterator for LocalFsGlobIterator {
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
