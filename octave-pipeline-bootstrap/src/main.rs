// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # `octave` Binary
//!
//! Composition root: parses and validates CLI arguments, installs logging
//! and signal handling, builds a [`Pipeline`] over the requested bucket
//! URLs, and drives it with a record-level passthrough transform — each
//! input record is decoded as a bare `serde_json::Value` and re-encoded
//! under the same output name. Operators who need a real transformation
//! (schema mapping, filtering, enrichment) link `octave-pipeline` directly
//! and supply their own [`Transform`](octave_pipeline::Transform); this
//! binary exists so the pipeline is runnable and observable out of the box.

use std::process::ExitCode;
use std::sync::Arc;

use octave_pipeline::{Emitter, Options, Pipeline, Sink, Transform};
use octave_pipeline_domain::OctaveError;
use octave_pipeline_bootstrap::{exit_code, install_signal_handler, parse_and_validate, ValidatedCli};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_and_validate() {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("argument error: {err}");
            return ExitCode::from(exit_code::ExitCode::Usage);
        }
    };

    if let Err(err) = octave_pipeline_bootstrap::logger::init_tracing() {
        eprintln!("warning: failed to install tracing subscriber: {err}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::from(exit_code::ExitCode::Ok),
        Err(err) => {
            tracing::error!(error = %err, "pipeline exited with a fatal error");
            ExitCode::from(exit_code::map_error_to_exit_code(&err))
        }
    }
}

async fn run(cli: ValidatedCli) -> Result<(), OctaveError> {
    let lease_client = Arc::new(octave_pipeline::infrastructure::lease::memory::MemoryLeaseClient::new());

    let options = Options {
        concurrency: cli.concurrency.unwrap_or(0),
        glob: cli.glob,
        temp_dir: cli.temp_dir,
        cycle_pause: cli.pause.unwrap_or_default(),
        span_name: "octave".to_string(),
        ..Options::default()
    };

    let pipeline = Pipeline::create(&cli.src, &cli.dst, lease_client, Some(options)).await?;

    install_signal_handler(pipeline.cancellation_token());

    let result = pipeline.run(passthrough_transform()).await;
    let close_result = pipeline.close().await;

    result.and(close_result)
}

/// Decodes each record as an untyped `serde_json::Value` and writes it back
/// out under the same name it was read from, letting the sink's own
/// codec/compression resolution (spec.md §4.1) pick the output format.
fn passthrough_transform() -> Transform {
    Arc::new(|emitter: &mut Emitter<'_>, sink: &mut Sink| {
        let name = emitter.name().to_string();
        loop {
            match emitter.decode::<serde_json::Value>() {
                Ok(record) => sink.encode(&name, &record)?,
                Err(OctaveError::EndOfStream) => return Ok(()),
                Err(err) => return Err(err),
            }
        }
    })
}
