// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Pipeline Metrics (C11, expansion)
//!
//! A minimal analogue of the teacher crate's `MetricsService`: in-process
//! atomic counters/gauges for cycles, files, and bytes. No Prometheus
//! dependency is required of the core — a consumer who wants to export
//! these can read the snapshot and feed whatever registry they use.

use std::sync::atomic::{AtomicU64, Ordering};

/// In-process counters and gauges tracking pipeline activity. Safe to share
/// across every worker task via `Arc`.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    cycles_run: AtomicU64,
    files_processed: AtomicU64,
    files_skipped: AtomicU64,
    files_failed: AtomicU64,
    active_workers: AtomicU64,
    bytes_staged: AtomicU64,
}

/// Point-in-time snapshot of [`PipelineMetrics`], cheap to copy and log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub cycles_run: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub active_workers: u64,
    pub bytes_staged: u64,
}

impl PipelineMetrics {
    /// A recorder that nobody reads: cheap to construct as the default so
    /// instrumentation stays opt-in.
    pub fn noop() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self) {
        self.cycles_run.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_processed(&self) {
        self.files_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.files_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn worker_started(&self) {
        self.active_workers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn worker_finished(&self) {
        self.active_workers.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_bytes_staged(&self, bytes: u64) {
        self.bytes_staged.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            cycles_run: self.cycles_run.load(Ordering::Relaxed),
            files_processed: self.files_processed.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_failed: self.files_failed.load(Ordering::Relaxed),
            active_workers: self.active_workers.load(Ordering::Relaxed),
            bytes_staged: self.bytes_staged.load(Ordering::Relaxed),
        }
    }
}
