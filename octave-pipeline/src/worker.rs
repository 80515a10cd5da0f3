// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # File Worker (C6)
//!
//! Processes exactly one source file end to end: resolve codec/compression
//! → acquire a lease → open → decompress → decode → invoke the user
//! transform once with an emitter/sink pair → commit the sink → ack the
//! lease. The ordering invariant from spec.md §4.5 is load-bearing: the
//! lease is marked done **only after** the sink has been successfully
//! committed to the destination, so a crash between commit and ack is safe
//! — the file is simply retried.
//!
//! The async bucket/lease I/O (open, acquire, commit, ack) runs directly on
//! the async runtime; the synchronous decode → transform → encode body is
//! handed to [`tokio::task::spawn_blocking`], mirroring the teacher's
//! pattern for bridging sync, potentially CPU/file-bound domain logic into
//! an async pipeline without blocking the reactor.

use std::sync::Arc;

use octave_pipeline_domain::{Bucket, LeaseClient, OctaveError};

use crate::emitter::Emitter;
use crate::options::Options;
use crate::shutdown::CancellationToken;
use crate::sink::Sink;
use crate::streams::SharedReadClose;

/// The user-supplied callback invoked once per source file with a read-side
/// [`Emitter`] and a write-side [`Sink`]. The transform is responsible for
/// looping `emitter.decode()` until [`OctaveError::EndOfStream`] itself;
/// the worker calls it exactly once per file.
pub type Transform = Arc<dyn for<'a> Fn(&mut Emitter<'a>, &mut Sink) -> Result<(), OctaveError> + Send + Sync>;

/// Processes `name`: the full lease → open → decompress → decode →
/// transform → commit → ack pipeline for a single source file.
///
/// Returns `Ok(())` both when the file was processed successfully and when
/// it was skipped (no codec predicate rejection is handled upstream by the
/// cycle driver; an already-acquired or already-done lease is a skip
/// signal here). Every other error is wrapped with `name` before returning.
pub async fn process_file(
    name: &str,
    source: Arc<dyn Bucket>,
    dest: Arc<dyn Bucket>,
    lease_client: Arc<dyn LeaseClient>,
    options: Arc<Options>,
    transform: Transform,
    token: CancellationToken,
) -> Result<(), OctaveError> {
    let coder = options.resolve_coder(name).ok_or_else(|| OctaveError::NoCoder(name.to_string()))?;
    let compression = options.resolve_compression(name);

    let mut lease = match lease_client.acquire(name, Some(options.base_metadata())).await {
        Ok(handle) => handle,
        Err(err) if err.is_skip() => {
            options.metrics.record_skipped();
            return Ok(());
        }
        Err(err) => return Err(err.in_file(name)),
    };

    let result = run_pipeline(name, source, dest, options.clone(), coder, compression, transform, token).await;

    match &result {
        Ok(()) => {
            if let Err(err) = lease.done(None).await {
                options.metrics.record_failed();
                return Err(err.in_file(name));
            }
            options.metrics.record_processed();
        }
        Err(_) => {
            let _ = lease.discard().await;
            options.metrics.record_failed();
        }
    }
    result
}

#[allow(clippy::too_many_arguments)]
async fn run_pipeline(
    name: &str,
    source: Arc<dyn Bucket>,
    dest: Arc<dyn Bucket>,
    options: Arc<Options>,
    coder: Arc<dyn octave_pipeline_domain::Coder>,
    compression: Arc<dyn octave_pipeline_domain::Compression>,
    transform: Transform,
    token: CancellationToken,
) -> Result<(), OctaveError> {
    let reader = source.open(name).await.map_err(|err| err.in_file(name))?;
    let sink = Sink::new(options.clone(), token.child()).map_err(|err| err.in_file(name))?;

    let name_owned = name.to_string();
    let (transform_result, mut sink) = tokio::task::spawn_blocking(move || {
        decode_and_transform(&name_owned, reader, sink, coder, compression, transform)
    })
    .await
    .map_err(|err| OctaveError::Internal(err.to_string()).in_file(name))?;

    match transform_result {
        Ok(()) => sink.commit(Some(dest.as_ref())).await.map_err(|err| err.in_file(name)),
        Err(err) => {
            let _ = sink.discard().await;
            Err(err)
        }
    }
}

/// Runs entirely off the async runtime: builds the decompression/decode
/// layers, invokes `transform` exactly once, then closes the read-side
/// layers regardless of the transform's outcome.
fn decode_and_transform(
    name: &str,
    reader: Box<dyn std::io::Read + Send>,
    mut sink: Sink,
    coder: Arc<dyn octave_pipeline_domain::Coder>,
    compression: Arc<dyn octave_pipeline_domain::Compression>,
    transform: Transform,
) -> (Result<(), OctaveError>, Sink) {
    let decompressed = match compression.new_reader(reader) {
        Ok(r) => r,
        Err(err) => return (Err(err.in_file(name)), sink),
    };
    let shared_read = SharedReadClose::new(decompressed);

    let mut decoder = match coder.new_decoder(Box::new(shared_read.clone())) {
        Ok(d) => d,
        Err(err) => {
            let _ = shared_read.close();
            return (Err(err.in_file(name)), sink);
        }
    };

    let mut result = {
        let mut emitter = Emitter::new(decoder.as_mut(), name);
        transform(&mut emitter, &mut sink)
    };

    if let Err(err) = decoder.close() {
        if !err.is_cancelled() && result.is_ok() {
            result = Err(err);
        }
    }
    if let Err(err) = shared_read.close() {
        if !err.is_cancelled() && result.is_ok() {
            result = Err(err);
        }
    }

    (result.map_err(|err| err.in_file(name)), sink)
}
