// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Options Normalization (C3)
//!
//! `Options` is the pipeline's configuration surface. It is deliberately a
//! plain struct rather than a builder: every field has a sensible zero value
//! and `normalize()` fills in defaults for whichever fields were left unset,
//! producing a fresh, defaulted copy and never mutating its input.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use octave_pipeline_domain::{Coder, Compression};

use crate::metrics::PipelineMetrics;
use crate::registry::{CodecRegistry, CompressionRegistry};

/// Default number of cycles between a fresh glob of the source bucket.
pub const DEFAULT_CYCLE_PAUSE: Duration = Duration::from_secs(5);

/// Default glob pattern: matches every name in the bucket.
pub const DEFAULT_GLOB: &str = "**";

/// Prefix used for the sink's scratch temp directories.
pub const TEMP_DIR_PREFIX: &str = "octave-";

/// A before-cycle hook. Returning an error aborts the whole pipeline run.
pub type BeforeCycleHook = Arc<dyn Fn() -> Result<(), octave_pipeline_domain::OctaveError> + Send + Sync>;

/// A per-file predicate. `Ok(false)` skips the file; `Err` aborts the cycle.
pub type FilePredicate = Arc<dyn Fn(&str) -> Result<bool, octave_pipeline_domain::OctaveError> + Send + Sync>;

/// Per-file codec override, consulted before the registry. Returning `None`
/// falls back to registry lookup.
pub type CoderFactory = Arc<dyn Fn(&str) -> Option<Arc<dyn Coder>> + Send + Sync>;

/// Per-file compression override, consulted before the registry. Returning
/// `None` falls back to registry lookup (then to pass-through).
pub type CompressionFactory = Arc<dyn Fn(&str) -> Option<Arc<dyn Compression>> + Send + Sync>;

/// Validated pipeline configuration. Immutable after [`Options::normalize`].
#[derive(Clone)]
pub struct Options {
    /// Maximum number of files processed concurrently. `0` means "use the
    /// default" (CPU count) once normalized.
    pub concurrency: usize,

    /// Directory under which the sink creates its scratch temp directories.
    /// `None` uses the OS default (`std::env::temp_dir()`).
    pub temp_dir: Option<PathBuf>,

    /// Glob pattern applied to the source bucket each cycle.
    pub glob: String,

    /// Suffix → codec factory lookup, consulted after per-file overrides.
    pub codecs: CodecRegistry,

    /// Suffix → compression factory lookup, consulted after per-file
    /// overrides.
    pub compressions: CompressionRegistry,

    /// How long the cycle driver sleeps between cycles that found nothing
    /// left un-acked, or after a clean cycle.
    pub cycle_pause: Duration,

    /// Runs before each cycle's glob. A non-`Ok(())` result aborts `run`.
    pub before_cycle: Option<BeforeCycleHook>,

    /// Filters names yielded by the glob iterator before a lease is
    /// attempted. Defaults to accept-all.
    pub file_predicate: Option<FilePredicate>,

    /// Per-file codec override, consulted before [`Options::codecs`].
    pub coder_for: Option<CoderFactory>,

    /// Per-file compression override, consulted before
    /// [`Options::compressions`].
    pub compression_for: Option<CompressionFactory>,

    /// Prefix used when the pipeline opens a `tracing` span per cycle/file.
    pub span_name: String,

    /// Metrics sink. Defaults to a no-op recorder so instrumentation stays
    /// opt-in.
    pub metrics: Arc<PipelineMetrics>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            concurrency: 0,
            temp_dir: None,
            glob: String::new(),
            codecs: CodecRegistry::new(),
            compressions: CompressionRegistry::new(),
            cycle_pause: Duration::ZERO,
            before_cycle: None,
            file_predicate: None,
            coder_for: None,
            compression_for: None,
            span_name: String::new(),
            metrics: Arc::new(PipelineMetrics::noop()),
        }
    }
}

impl Options {
    /// Produces a fresh, fully-defaulted copy of `opt` (or of
    /// [`Options::default`] if `opt` is `None`), leaving the input untouched.
    ///
    /// Defaulting rules (spec.md §4.2): zero/negative concurrency → CPU
    /// count (or 1 if undetectable); empty glob → `"**"`; zero pause → 5s;
    /// empty registries → `{.json, .ndjson} -> json` / `{.gz} -> gzip`;
    /// missing hooks → accept-all / identity.
    pub fn normalize(opt: Option<&Options>) -> Options {
        let base = opt.cloned().unwrap_or_default();

        let concurrency = if base.concurrency == 0 {
            std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
        } else {
            base.concurrency
        };

        let glob = if base.glob.trim().is_empty() { DEFAULT_GLOB.to_string() } else { base.glob };

        let cycle_pause = if base.cycle_pause.is_zero() { DEFAULT_CYCLE_PAUSE } else { base.cycle_pause };

        let codecs = if base.codecs.is_empty() { CodecRegistry::with_default() } else { base.codecs };

        let compressions =
            if base.compressions.is_empty() { CompressionRegistry::with_default() } else { base.compressions };

        let span_name = if base.span_name.trim().is_empty() { "octave".to_string() } else { base.span_name };

        Options {
            concurrency,
            temp_dir: base.temp_dir,
            glob,
            codecs,
            compressions,
            cycle_pause,
            before_cycle: base.before_cycle,
            file_predicate: base.file_predicate,
            coder_for: base.coder_for,
            compression_for: base.compression_for,
            span_name,
            metrics: base.metrics,
        }
    }

    /// Resolves the codec for `name`: per-file override first, then the
    /// registry. `None` means no codec could be resolved (`ErrNoCoder`).
    pub fn resolve_coder(&self, name: &str) -> Option<Arc<dyn Coder>> {
        if let Some(factory) = &self.coder_for {
            if let Some(coder) = factory(name) {
                return Some(coder);
            }
        }
        self.codecs.lookup(name)
    }

    /// Resolves the compression for `name`: per-file override first, then
    /// the registry, then pass-through.
    pub fn resolve_compression(&self, name: &str) -> Arc<dyn Compression> {
        if let Some(factory) = &self.compression_for {
            if let Some(compression) = factory(name) {
                return compression;
            }
        }
        self.compressions.lookup_or_passthrough(name)
    }

    /// Invokes the file predicate, defaulting to accept-all.
    pub fn accepts(&self, name: &str) -> Result<bool, octave_pipeline_domain::OctaveError> {
        match &self.file_predicate {
            Some(predicate) => predicate(name),
            None => Ok(true),
        }
    }

    /// Invokes the before-cycle hook, defaulting to a no-op success.
    pub fn run_before_cycle(&self) -> Result<(), octave_pipeline_domain::OctaveError> {
        match &self.before_cycle {
            Some(hook) => hook(),
            None => Ok(()),
        }
    }

    /// Lease/upload metadata tag carrying the bucket-neutral span name,
    /// handed through to buckets/leases that want provenance on what wrote
    /// an object.
    pub fn base_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert("producer".to_string(), self.span_name.clone());
        metadata
    }
}
