// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Façade (C8)
//!
//! The public entry point: holds the source/destination buckets, the lease
//! client, normalized options, and the pipeline-wide cancellation token.
//! `create` resolves bucket URLs and takes ownership of the resulting
//! buckets (closing them itself on teardown); `new` accepts already-open
//! buckets the caller keeps owning. `run` drives repeated cycles until
//! cancellation or a fatal error; `close` cancels, waits a bounded grace
//! period for the in-flight cycle's workers to wind down, then closes any
//! owned buckets.

use std::sync::Arc;
use std::time::Duration;

use octave_pipeline_domain::{Bucket, LeaseClient, OctaveError};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::cycle::run_cycle;
use crate::infrastructure::buckets::open_url;
use crate::options::Options;
use crate::shutdown::CancellationToken;
use crate::worker::Transform;

/// Grace period `close()` waits for the in-flight cycle to observe
/// cancellation before closing owned buckets out from under it.
const DEFAULT_CLOSE_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// The running pipeline. Cheap to clone-free: there is exactly one per
/// `run()` call, and `close()` is the only way to stop it early.
pub struct Pipeline {
    source: Arc<dyn Bucket>,
    dest: Arc<dyn Bucket>,
    lease_client: Arc<dyn LeaseClient>,
    options: Arc<Options>,
    token: CancellationToken,
    owns_buckets: bool,
    close_grace_period: Duration,
    run_lock: Mutex<()>,
}

impl Pipeline {
    /// Resolves `src_url`/`dst_url` to buckets and takes ownership of them:
    /// `close()` will close both. If either resolution fails, whichever
    /// bucket was already opened is closed before the error is returned.
    pub async fn create(
        src_url: &str,
        dst_url: &str,
        lease_client: Arc<dyn LeaseClient>,
        options: Option<Options>,
    ) -> Result<Pipeline, OctaveError> {
        let source = open_url(src_url)?;
        let dest = match open_url(dst_url) {
            Ok(dest) => dest,
            Err(err) => {
                let _ = source.close().await;
                return Err(err);
            }
        };

        Ok(Self::new_inner(source, dest, lease_client, options, true))
    }

    /// Builds a pipeline over already-open buckets. The caller retains
    /// ownership: `close()` never calls `Bucket::close` on them.
    pub fn new(
        source: Arc<dyn Bucket>,
        dest: Arc<dyn Bucket>,
        lease_client: Arc<dyn LeaseClient>,
        options: Option<Options>,
    ) -> Pipeline {
        Self::new_inner(source, dest, lease_client, options, false)
    }

    fn new_inner(
        source: Arc<dyn Bucket>,
        dest: Arc<dyn Bucket>,
        lease_client: Arc<dyn LeaseClient>,
        options: Option<Options>,
        owns_buckets: bool,
    ) -> Pipeline {
        Pipeline {
            source,
            dest,
            lease_client,
            options: Arc::new(Options::normalize(options.as_ref())),
            token: CancellationToken::new(),
            owns_buckets,
            close_grace_period: DEFAULT_CLOSE_GRACE_PERIOD,
            run_lock: Mutex::new(()),
        }
    }

    /// Returns a handle that, when cancelled, unblocks `run` and causes
    /// in-flight I/O that honors cancellation to fail.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// A snapshot of the pipeline's in-process metrics.
    pub fn metrics(&self) -> crate::metrics::MetricsSnapshot {
        self.options.metrics.snapshot()
    }

    /// Runs cycles with `transform` until the pipeline is cancelled
    /// (returns `Ok(())`) or a cycle returns a fatal error (returned
    /// wrapped, without running any further cycles). Only one `run` call
    /// may be in flight at a time; a second concurrent call waits for the
    /// first to finish rather than racing it.
    pub async fn run(&self, transform: Transform) -> Result<(), OctaveError> {
        let _guard = self.run_lock.lock().await;

        while !self.token.is_cancelled() {
            run_cycle(
                self.source.clone(),
                self.dest.clone(),
                self.lease_client.clone(),
                self.options.clone(),
                transform.clone(),
                self.token.clone(),
            )
            .await?;

            if self.token.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.options.cycle_pause) => {}
                _ = self.token.cancelled() => break,
            }
        }
        Ok(())
    }

    /// Cancels the pipeline, waits up to the close grace period for any
    /// `run` call in flight to observe cancellation and return, then
    /// closes owned buckets. Returns the first bucket-close error, if any.
    /// Idempotent: a second `close()` call is a cheap no-op past the first.
    pub async fn close(&self) -> Result<(), OctaveError> {
        self.token.cancel();

        let drained = tokio::time::timeout(self.close_grace_period, self.run_lock.lock()).await;
        if drained.is_err() {
            warn!("close() grace period elapsed with a cycle still in flight");
        } else {
            info!("pipeline run loop drained cleanly");
        }

        if !self.owns_buckets {
            return Ok(());
        }

        let mut first_err = None;
        if let Err(err) = self.source.close().await {
            first_err.get_or_insert(err);
        }
        if let Err(err) = self.dest.close().await {
            first_err.get_or_insert(err);
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::Emitter;
    use crate::infrastructure::buckets::memory::MemoryBucket;
    use crate::infrastructure::lease::memory::MemoryLeaseClient;
    use crate::sink::Sink;
    use octave_pipeline_domain::OctaveError as Err_;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Rec {
        #[serde(rename = "S")]
        s: String,
    }

    fn echo_transform() -> Transform {
        Arc::new(|emitter: &mut Emitter<'_>, sink: &mut Sink| loop {
            match emitter.decode::<Rec>() {
                Ok(rec) => sink.encode("out.ndjson", &rec)?,
                Err(Err_::EndOfStream) => return Ok(()),
                Err(err) => return Err(err),
            }
        })
    }

    #[tokio::test]
    async fn run_exits_cleanly_once_cancelled_before_any_cycle() {
        let source = Arc::new(MemoryBucket::new());
        let dest = Arc::new(MemoryBucket::new());
        let lease = Arc::new(MemoryLeaseClient::new());
        let pipeline = Pipeline::new(source, dest, lease, None);

        pipeline.cancellation_token().cancel();
        pipeline.run(echo_transform()).await.unwrap();
    }

    #[tokio::test]
    async fn a_borrowed_pipeline_never_closes_its_buckets() {
        let source = Arc::new(MemoryBucket::new());
        let dest = Arc::new(MemoryBucket::new());
        let lease = Arc::new(MemoryLeaseClient::new());
        let pipeline = Pipeline::new(source.clone(), dest, lease, None);

        pipeline.close().await.unwrap();
        // Still usable: close() didn't touch a borrowed bucket.
        assert!(source.glob("**").await.is_ok());
    }

    #[tokio::test]
    async fn create_rejects_an_unresolvable_source_url() {
        let lease = Arc::new(MemoryLeaseClient::new());
        let err = Pipeline::create("s3://bucket", "file:///tmp/out", lease, None).await.unwrap_err();
        assert!(matches!(err, Err_::Config(_)));
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let source = Arc::new(MemoryBucket::new());
        let dest = Arc::new(MemoryBucket::new());
        let lease = Arc::new(MemoryLeaseClient::new());
        let pipeline = Pipeline::new(source, dest, lease, None);

        pipeline.close().await.unwrap();
        pipeline.close().await.unwrap();
    }
}
