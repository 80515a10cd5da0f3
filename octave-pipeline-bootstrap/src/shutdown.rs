// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Signal-Driven Shutdown
//!
//! Wires OS signals (`SIGINT`/`Ctrl+C` everywhere, `SIGTERM` on Unix) into a
//! [`Pipeline`](octave_pipeline::Pipeline)'s own
//! [`CancellationToken`](octave_pipeline::CancellationToken), the bootstrap
//! analogue of the teacher crate's `shutdown::ShutdownCoordinator`. The
//! pipeline already owns the cancellation/grace-period machinery (spec.md
//! §4.7/§5); this module's only job is to translate "the operator pressed
//! Ctrl+C" into a call to `token.cancel()`.

use octave_pipeline::CancellationToken;

/// Spawns a background task that cancels `token` the first time the process
/// receives `SIGINT` or (on Unix) `SIGTERM`. Returns immediately; the
/// spawned task runs for the lifetime of the tokio runtime.
pub fn install_signal_handler(token: CancellationToken) {
    tokio::spawn(wait_for_shutdown_signal(token));
}

async fn wait_for_shutdown_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(sig) => sig,
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler, Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
                token.cancel();
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT, shutting down"),
            _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("received Ctrl+C, shutting down");
    }

    token.cancel();
}
