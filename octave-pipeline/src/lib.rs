// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # octave-pipeline
//!
//! A distributed batch file-processing pipeline: scan a source bucket by
//! glob, acquire a per-file distributed lease, stream-decompress and decode
//! each file, hand records to a caller-supplied transform, stage the
//! transform's output into one or more named files via a multi-file sink,
//! and on success atomically commit the sink to a destination bucket and
//! acknowledge the lease. Cycles repeat with backpressure and bounded
//! parallelism.
//!
//! ## Components
//!
//! - [`registry`] — filename-suffix lookup for codecs ([`registry::CodecRegistry`])
//!   and compression ([`registry::CompressionRegistry`]), with compound
//!   extensions (`data.ndjson.gz`) resolved by stripping one dot-suffix at a
//!   time.
//! - [`options`] — [`options::Options`], the pipeline's validated
//!   configuration surface, and its [`options::Options::normalize`]
//!   defaulting.
//! - [`emitter`] — [`emitter::Emitter`], the read-side adapter handed to the
//!   user transform.
//! - [`sink`] — [`sink::Sink`], the write-side, multi-file staging area with
//!   atomic commit/discard semantics.
//! - [`worker`] — the per-file pipeline: lease → open → decompress → decode
//!   → transform → commit → ack.
//! - [`cycle`] — one glob-and-dispatch pass over the source bucket.
//! - [`pipeline`] — [`pipeline::Pipeline`], the public façade tying
//!   everything together.
//! - [`metrics`] — in-process counters for cycles, files, and bytes.
//! - [`infrastructure`] — reference [`Bucket`]/[`LeaseClient`]/codec/
//!   compression adapters (local filesystem, in-memory, JSON, gzip) so the
//!   engine is runnable and testable without a real object store.
//!
//! The external collaborators — object storage, the distributed lease
//! service, concrete codecs, and compression — are modeled as traits in
//! [`octave_pipeline_domain`] and re-exported here for convenience.
//!
//! ## Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use octave_pipeline::{Options, Pipeline};
//! use octave_pipeline::infrastructure::buckets::memory::MemoryBucket;
//! use octave_pipeline::infrastructure::lease::memory::MemoryLeaseClient;
//!
//! # async fn run() -> Result<(), octave_pipeline_domain::OctaveError> {
//! let source = Arc::new(MemoryBucket::new());
//! let dest = Arc::new(MemoryBucket::new());
//! let lease = Arc::new(MemoryLeaseClient::new());
//!
//! let pipeline = Pipeline::new(source, dest, lease, Some(Options::normalize(None)));
//!
//! let transform = Arc::new(|emitter: &mut octave_pipeline::Emitter<'_>, sink: &mut octave_pipeline::Sink| loop {
//!     match emitter.decode::<serde_json::Value>() {
//!         Ok(record) => sink.encode("out.ndjson", &record)?,
//!         Err(octave_pipeline_domain::OctaveError::EndOfStream) => return Ok(()),
//!         Err(err) => return Err(err),
//!     }
//! });
//!
//! pipeline.cancellation_token().cancel(); // stop after the in-flight cycle
//! pipeline.run(transform).await
//! # }
//! ```

mod shutdown;

pub mod cycle;
pub mod emitter;
pub mod infrastructure;
pub mod metrics;
pub mod options;
pub mod pipeline;
pub mod registry;
pub mod sink;
pub mod worker;

pub use emitter::Emitter;
pub use metrics::{MetricsSnapshot, PipelineMetrics};
pub use options::{BeforeCycleHook, CoderFactory, CompressionFactory, FilePredicate, Options};
pub use pipeline::Pipeline;
pub use registry::{CodecRegistry, CompressionRegistry};
pub use shutdown::CancellationToken;
pub use sink::Sink;
pub use worker::Transform;

pub use octave_pipeline_domain::{
    Bucket, Coder, Compression, Decoder, DecoderExt, Encoder, EncoderExt, GlobIterator, LeaseClient, LeaseHandle,
    OctaveError, ReadClose, WriteClose,
};
