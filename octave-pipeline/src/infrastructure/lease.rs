// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! Reference [`LeaseClient`](octave_pipeline_domain::LeaseClient)
//! implementation used by the engine's own test suite (the Rust analogue of
//! the Go test suite's `accord/backend/mock`).

pub mod memory;
