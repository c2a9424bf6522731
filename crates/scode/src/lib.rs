//! Human-readable and compact binary command codec.
//!
//! A command such as `G1 X12.5 F1500` can travel either as an ASCII line or
//! as a CRC-8 protected binary frame; both decode to the same [`codec::Command`].
//!
//! # Crate Structure
//!
//! - [`codec`]: parameter and command codecs, CRC-8, stream reassembly and
//!   blocking reader/writer adapters
//!
//! The `scode` binary (feature `cli`) decodes, converts and inspects command
//! streams from the terminal.

/// Re-export codec types.
pub mod codec {
    pub use scode_codec::*;
}
