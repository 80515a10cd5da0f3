// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # octave-pipeline-domain
//!
//! Pure, reusable contracts for the octave batch file-processing pipeline:
//! the `Bucket`, `LeaseClient`, `Coder` and `Compression` ports, and the
//! domain error type they share. No async runtime choice, no concrete
//! storage or codec implementation, and no logging — those are
//! infrastructure concerns that belong to the `octave-pipeline` crate.

pub mod error;
pub mod ports;

pub use error::OctaveError;
pub use ports::{
    Bucket, Coder, Compression, Decoder, DecoderExt, Encoder, EncoderExt, GlobIterator, LeaseClient, LeaseHandle,
    ReadClose, WriteClose,
};
