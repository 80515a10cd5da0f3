// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! End-to-end coverage driven through the public [`Pipeline`] façade,
//! rather than the individual components (those get their own focused
//! coverage colocated with each module).

use std::io::Write as _;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use octave_pipeline::infrastructure::adapters::gzip_compression::GzipCompression;
use octave_pipeline::infrastructure::buckets::memory::MemoryBucket;
use octave_pipeline::infrastructure::lease::memory::MemoryLeaseClient;
use octave_pipeline::{Bucket, Compression, Emitter, LeaseClient, OctaveError, Options, Pipeline, Sink, Transform};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Rec {
    #[serde(rename = "S")]
    s: String,
    #[serde(rename = "N")]
    n: u32,
}

/// An owned, cloneable in-memory buffer so a test can hand a `Box<dyn Write
/// + Send>` to the gzip writer while keeping a handle to read the bytes
/// back afterward.
#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl SharedBuf {
    fn into_vec(self) -> Vec<u8> {
        Arc::try_unwrap(self.0).expect("no other clones outstanding").into_inner().unwrap()
    }
}

impl std::io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let shared = SharedBuf::default();
    {
        let mut writer = GzipCompression.new_writer(Box::new(shared.clone())).unwrap();
        writer.write_all(bytes).unwrap();
        writer.close().unwrap();
    }
    shared.into_vec()
}

fn ndjson(records: &[Rec]) -> Vec<u8> {
    let mut out = Vec::new();
    for rec in records {
        serde_json::to_writer(&mut out, rec).unwrap();
        out.push(b'\n');
    }
    out
}

/// Runs `pipeline` until `done` reports true or `timeout` elapses, then
/// cancels and drains it. Used because `run()` loops cycles indefinitely.
async fn run_until(pipeline: Arc<Pipeline>, done: impl Fn() -> bool, timeout: Duration) {
    let runner = pipeline.clone();
    let transform_done = tokio::spawn(async move { runner.run(echo_by_name_transform()).await });
    let deadline = Instant::now() + timeout;
    while !done() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    pipeline.close().await.unwrap();
    transform_done.await.unwrap().unwrap();
}

fn echo_by_name_transform() -> Transform {
    Arc::new(|emitter: &mut Emitter<'_>, sink: &mut Sink| loop {
        match emitter.decode::<Rec>() {
            Ok(rec) if rec.n == 5 => continue,
            Ok(rec) => {
                let prefix = emitter.name().split('.').next().unwrap_or(emitter.name());
                let out = format!("{prefix}{}.ndjson", rec.s);
                sink.encode(&out, &rec)?;
            }
            Err(OctaveError::EndOfStream) => return Ok(()),
            Err(err) => return Err(err),
        }
    })
}

/// Mixed extensions, a multi-record transform that conditionally drops
/// records and fans out to several output names.
#[tokio::test]
async fn mixed_extensions_fan_out_to_several_output_files() {
    let source = Arc::new(MemoryBucket::new());
    source.seed(
        "data-1.ndjson",
        ndjson(&[
            Rec { s: "a".into(), n: 1 },
            Rec { s: "b".into(), n: 5 },
            Rec { s: "c".into(), n: 2 },
        ]),
    );
    source.seed("data-2.json.gz", gzip(&ndjson(&[Rec { s: "d".into(), n: 3 }, Rec { s: "e".into(), n: 5 }])));

    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());
    let pipeline = Arc::new(Pipeline::new(
        source.clone() as Arc<dyn Bucket>,
        dest.clone() as Arc<dyn Bucket>,
        lease.clone() as Arc<dyn LeaseClient>,
        None,
    ));

    run_until(pipeline, || dest.names().len() >= 3, Duration::from_secs(5)).await;

    assert_eq!(dest.names(), vec!["data-1a.ndjson".to_string(), "data-1c.ndjson".to_string(), "data-2d.ndjson".to_string()]);
    assert!(matches!(lease.acquire("data-1.ndjson", None).await, Err(OctaveError::LeaseDone)));
    assert!(matches!(lease.acquire("data-2.json.gz", None).await, Err(OctaveError::LeaseDone)));
}

/// A file with no recognizable codec suffix is a fatal, per-cycle error:
/// the predicate, not the registry, decides whether such a file is even
/// attempted.
#[tokio::test]
async fn a_file_with_no_codec_fails_the_cycle() {
    let source = Arc::new(MemoryBucket::new());
    source.seed("readme.txt", b"not a record stream".to_vec());
    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());
    let pipeline = Pipeline::new(
        source as Arc<dyn Bucket>,
        dest.clone() as Arc<dyn Bucket>,
        lease as Arc<dyn LeaseClient>,
        None,
    );

    let err = pipeline.run(echo_by_name_transform()).await.unwrap_err();
    assert!(matches!(err, OctaveError::InFile { source, .. } if matches!(*source, OctaveError::NoCoder(_))));
    assert!(dest.is_empty());
}

/// A transform that writes several output files and then fails leaves the
/// destination untouched and the lease un-acked.
#[tokio::test]
async fn a_failing_transform_discards_everything_it_staged() {
    let source = Arc::new(MemoryBucket::new());
    source.seed("in.ndjson", ndjson(&[Rec { s: "a".into(), n: 1 }]));
    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());
    let pipeline = Pipeline::new(
        source as Arc<dyn Bucket>,
        dest.clone() as Arc<dyn Bucket>,
        lease.clone() as Arc<dyn LeaseClient>,
        None,
    );

    let failing: Transform = Arc::new(|emitter, sink| {
        let rec: Rec = emitter.decode()?;
        sink.encode("one.ndjson", &rec)?;
        sink.encode("two.ndjson", &rec)?;
        Err(OctaveError::Internal("transform gave up".into()))
    });

    let err = pipeline.run(failing).await.unwrap_err();
    assert!(matches!(err, OctaveError::InFile { .. }));
    assert!(dest.is_empty());
    // Not done: retryable on a future cycle.
    assert!(lease.acquire("in.ndjson", None).await.is_ok());
}

/// Concurrency is bounded and parallel, not serial — ten ~100ms files with
/// concurrency=2 take at least 500ms but the dispatcher never lets more
/// than two run at once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_is_capped_and_genuinely_parallel() {
    let source = Arc::new(MemoryBucket::new());
    for i in 0..10 {
        source.seed(format!("f{i}.ndjson"), ndjson(&[Rec { s: "x".into(), n: i }]));
    }
    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());

    let active = Arc::new(AtomicUsize::new(0));
    let max_active = Arc::new(AtomicUsize::new(0));
    let active_for_transform = active.clone();
    let max_active_for_transform = max_active.clone();

    let mut options = Options::normalize(None);
    options.concurrency = 2;
    let pipeline = Pipeline::new(
        source as Arc<dyn Bucket>,
        dest as Arc<dyn Bucket>,
        lease as Arc<dyn LeaseClient>,
        Some(options),
    );

    let slow: Transform = Arc::new(move |emitter, sink| {
        let now = active_for_transform.fetch_add(1, Ordering::SeqCst) + 1;
        max_active_for_transform.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(100));
        let rec: Rec = emitter.decode()?;
        sink.encode("out.ndjson", &rec)?;
        active_for_transform.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    });

    let start = Instant::now();
    pipeline.run(slow).await.unwrap();
    let elapsed = start.elapsed();

    assert!(max_active.load(Ordering::SeqCst) <= 2, "max concurrent workers exceeded the cap");
    assert!(elapsed >= Duration::from_millis(480), "ran faster than the concurrency cap should allow: {elapsed:?}");
}

/// The cycle driver honors `cycle_pause` between cycles that found nothing
/// left to do, unless cancelled first.
#[tokio::test]
async fn pause_between_cycles_is_honored() {
    let source = Arc::new(MemoryBucket::new());
    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());

    let last_cycle_at = Arc::new(AtomicI64::new(-1));
    let gaps_ms = Arc::new(std::sync::Mutex::new(Vec::<i64>::new()));
    let start = Instant::now();

    let mut options = Options::normalize(None);
    options.cycle_pause = Duration::from_millis(80);
    let hook_last = last_cycle_at.clone();
    let hook_gaps = gaps_ms.clone();
    options.before_cycle = Some(Arc::new(move || {
        let now = start.elapsed().as_millis() as i64;
        let prev = hook_last.swap(now, Ordering::SeqCst);
        if prev >= 0 {
            hook_gaps.lock().unwrap().push(now - prev);
        }
        Ok(())
    }));

    let pipeline = Arc::new(Pipeline::new(
        source as Arc<dyn Bucket>,
        dest as Arc<dyn Bucket>,
        lease as Arc<dyn LeaseClient>,
        Some(options),
    ));

    run_until(pipeline, || gaps_ms.lock().unwrap().len() >= 2, Duration::from_secs(5)).await;

    let gaps = gaps_ms.lock().unwrap().clone();
    assert!(gaps.len() >= 2);
    for gap in gaps {
        assert!(gap >= 70, "cycle began only {gap}ms after the previous one, pause was not honored");
    }
}

/// Empty source bucket: cycle completes successfully, destination empty.
#[tokio::test]
async fn empty_source_bucket_completes_cleanly() {
    let source = Arc::new(MemoryBucket::new());
    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());
    let pipeline = Pipeline::new(
        source as Arc<dyn Bucket>,
        dest.clone() as Arc<dyn Bucket>,
        lease as Arc<dyn LeaseClient>,
        None,
    );

    pipeline.cancellation_token().cancel();
    pipeline.run(echo_by_name_transform()).await.unwrap();
    assert!(dest.is_empty());
}

/// Predicate rejects every file: no leases are acquired, destination stays
/// empty.
#[tokio::test]
async fn predicate_rejecting_everything_touches_no_leases() {
    let source = Arc::new(MemoryBucket::new());
    source.seed("a.ndjson", ndjson(&[Rec { s: "a".into(), n: 1 }]));
    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());

    let mut options = Options::normalize(None);
    options.file_predicate = Some(Arc::new(|_name| Ok(false)));

    let pipeline = Pipeline::new(
        source as Arc<dyn Bucket>,
        dest.clone() as Arc<dyn Bucket>,
        lease.clone() as Arc<dyn LeaseClient>,
        Some(options),
    );

    pipeline.cancellation_token().cancel();
    pipeline.run(echo_by_name_transform()).await.unwrap();

    assert!(dest.is_empty());
    assert!(lease.acquire("a.ndjson", None).await.is_ok());
}

/// Malformed bytes surface as a decode error wrapped with the source
/// filename, rather than panicking or being silently skipped.
#[tokio::test]
async fn non_json_bytes_surface_as_a_decode_error() {
    let source = Arc::new(MemoryBucket::new());
    source.seed("bad.ndjson", b"{not json".to_vec());
    let dest = Arc::new(MemoryBucket::new());
    let lease = Arc::new(MemoryLeaseClient::new());
    let pipeline = Pipeline::new(
        source as Arc<dyn Bucket>,
        dest.clone() as Arc<dyn Bucket>,
        lease as Arc<dyn LeaseClient>,
        None,
    );

    let decode_only: Transform = Arc::new(|emitter, _sink| {
        emitter.decode::<Value>()?;
        Ok(())
    });

    let err = pipeline.run(decode_only).await.unwrap_err();
    assert!(matches!(err, OctaveError::InFile { .. }));
    assert!(dest.is_empty());
}
