// /////////////////////////////////////////////////////////////////////////////
// octave
// SPDX-License-Identifier: BSD-3-Clause
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Ports
//!
//! The external-collaborator contracts from spec §6: object storage,
//! distributed leasing, record codecs, and stream compression. Everything
//! in this module is an interface; concrete implementations (local
//! filesystem, in-memory, JSON, gzip, ...) live in octave-pipeline's
//! `infrastructure` module, never here.

pub mod bucket;
pub mod codec;
pub mod compression;
pub mod lease;

pub use bucket::{Bucket, GlobIterator};
pub use codec::{Coder, Decoder, DecoderExt, Encoder, EncoderExt};
pub use compression::{Compression, ReadClose, WriteClose};
pub use lease::{LeaseClient, LeaseHandle};
