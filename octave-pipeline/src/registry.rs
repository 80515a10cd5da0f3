// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Codec and Compression Registries (C1, C2)
//!
//! Both registries map a filename suffix (including the leading dot) to a
//! factory, and both resolve compound extensions the same way: strip the
//! final dot-suffix of the basename and retry until a registered suffix is
//! found or the name runs out of dots. `data.ndjson.gz` therefore resolves
//! compression on `.gz` and, independently, codec on `.ndjson` once `.gz`
//! has been stripped away — unknown intermediate suffixes like `.schema` in
//! `test.ndjson.schema.gz` are simply skipped over.

use std::collections::HashMap;
use std::sync::Arc;

use octave_pipeline_domain::{Coder, Compression};

fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Strips dot-suffixes off `name`'s basename one at a time, calling `probe`
/// on each suffix (`.gz`, then `.ndjson`, ...) until `probe` returns
/// `Some`, or the name has no more dots to strip.
fn strip_suffixes<T>(name: &str, mut probe: impl FnMut(&str) -> Option<T>) -> Option<T> {
    let mut rest = basename(name);
    loop {
        let dot = rest.rfind('.')?;
        if dot == 0 {
            // A leading dot with nothing before it (".gitignore") is not a
            // suffix token; there is nothing left to strip.
            return None;
        }
        let suffix = &rest[dot..];
        if let Some(found) = probe(suffix) {
            return Some(found);
        }
        rest = &rest[..dot];
    }
}

/// Suffix → codec factory. Two defaults are registered out of the box:
/// `.json` and `.ndjson` both map to the JSON codec.
#[derive(Clone)]
pub struct CodecRegistry {
    by_suffix: HashMap<String, Arc<dyn Coder>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self { by_suffix: HashMap::new() }
    }

    pub fn with_default() -> Self {
        let mut registry = Self::new();
        let json = Arc::new(crate::infrastructure::adapters::json_codec::JsonCoder) as Arc<dyn Coder>;
        registry.insert(".json", json.clone());
        registry.insert(".ndjson", json);
        registry
    }

    pub fn insert(&mut self, suffix: impl Into<String>, coder: Arc<dyn Coder>) {
        self.by_suffix.insert(suffix.into(), coder);
    }

    /// Resolves a codec for `name`, or `None` if no registered suffix
    /// matches — the caller (the worker) turns that into `ErrNoCoder`.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Coder>> {
        strip_suffixes(name, |suffix| self.by_suffix.get(suffix).cloned())
    }

    pub fn is_empty(&self) -> bool {
        self.by_suffix.is_empty()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Suffix → compression factory. `.gz` maps to gzip by default. Unlike the
/// codec registry, a lookup miss here is not an error: the caller falls
/// back to a no-op, pass-through compression.
#[derive(Clone)]
pub struct CompressionRegistry {
    by_suffix: HashMap<String, Arc<dyn Compression>>,
}

impl CompressionRegistry {
    pub fn new() -> Self {
        Self { by_suffix: HashMap::new() }
    }

    pub fn with_default() -> Self {
        let mut registry = Self::new();
        registry.insert(".gz", Arc::new(crate::infrastructure::adapters::gzip_compression::GzipCompression));
        registry
    }

    pub fn insert(&mut self, suffix: impl Into<String>, compression: Arc<dyn Compression>) {
        self.by_suffix.insert(suffix.into(), compression);
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Compression>> {
        strip_suffixes(name, |suffix| self.by_suffix.get(suffix).cloned())
    }

    /// Same as [`CompressionRegistry::lookup`], but substitutes the no-op
    /// pass-through compression on a miss so callers never have to special
    /// case "this file isn't compressed".
    pub fn lookup_or_passthrough(&self, name: &str) -> Arc<dyn Compression> {
        self.lookup(name)
            .unwrap_or_else(|| Arc::new(crate::infrastructure::adapters::gzip_compression::NoopCompression))
    }

    pub fn is_empty(&self) -> bool {
        self.by_suffix.is_empty()
    }
}

impl Default for CompressionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
