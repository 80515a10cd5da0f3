// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Cycle Driver (C7)
//!
//! One cycle: run the before-cycle hook, glob the source bucket, filter
//! each yielded name through the file predicate, then dispatch a worker
//! task per accepted name under a weighted semaphore that caps live
//! concurrency at `options.concurrency`. Dispatch itself is single
//! threaded and sequential; the workers it launches run in parallel. The
//! first worker error cancels a cycle-local token (derived from the
//! pipeline token) so the remaining live workers observe cancellation and
//! wind down, mirroring an errgroup's "first error wins, everyone else
//! gets the derived context's cancellation" behavior.

use std::sync::Arc;

use octave_pipeline_domain::{Bucket, LeaseClient, OctaveError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, instrument, warn};

use crate::options::Options;
use crate::shutdown::CancellationToken;
use crate::worker::{self, Transform};

/// Runs exactly one cycle. Returns `Ok(())` on a clean pass (including one
/// where every worker was skipped), or the first fatal error encountered:
/// the before-cycle hook, the glob iterator, the file predicate, semaphore
/// acquisition, or any worker.
#[instrument(skip_all, name = "cycle", fields(span = %options.span_name))]
pub async fn run_cycle(
    source: Arc<dyn Bucket>,
    dest: Arc<dyn Bucket>,
    lease_client: Arc<dyn LeaseClient>,
    options: Arc<Options>,
    transform: Transform,
    token: CancellationToken,
) -> Result<(), OctaveError> {
    options.run_before_cycle()?;

    let mut iterator = source.glob(&options.glob).await?;
    let semaphore = Arc::new(Semaphore::new(options.concurrency));
    let cycle_token = token.child();
    let mut workers: JoinSet<Result<(), OctaveError>> = JoinSet::new();
    let mut first_error: Option<OctaveError> = None;

    while !cycle_token.is_cancelled() {
        if !iterator.next().await {
            break;
        }
        let name = iterator.name().to_string();

        match options.accepts(&name) {
            Ok(true) => {}
            Ok(false) => {
                debug!(name, "skipped by file predicate");
                continue;
            }
            Err(err) => {
                first_error.get_or_insert(err);
                cycle_token.cancel();
                break;
            }
        }

        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
            _ = cycle_token.cancelled() => break,
        };

        options.metrics.worker_started();
        let worker_options = options.clone();
        let worker_source = source.clone();
        let worker_dest = dest.clone();
        let worker_lease = lease_client.clone();
        let worker_transform = transform.clone();
        let worker_token = cycle_token.clone();

        workers.spawn(async move {
            let _permit = permit;
            let result = worker::process_file(
                &name,
                worker_source,
                worker_dest,
                worker_lease,
                worker_options.clone(),
                worker_transform,
                worker_token,
            )
            .await;
            worker_options.metrics.worker_finished();
            if let Err(err) = &result {
                error!(name, error = %err, "worker failed");
            }
            result
        });
    }

    if let Some(err) = iterator.error() {
        first_error.get_or_insert_with(|| err.clone());
    }
    if let Err(err) = iterator.close().await {
        if !err.is_cancelled() {
            first_error.get_or_insert(err);
        }
    }

    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                if !err.is_cancelled() {
                    cycle_token.cancel();
                    first_error.get_or_insert(err);
                }
            }
            Err(join_err) => {
                warn!(error = %join_err, "worker task panicked");
                first_error.get_or_insert(OctaveError::Internal(join_err.to_string()));
            }
        }
    }

    options.metrics.record_cycle();
    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
