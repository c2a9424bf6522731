//! Dual-format command codec with stream reassembly.
//!
//! A command is a letter + number identifier followed by ordered, letter
//! tagged parameters. It travels in one of two interchangeable encodings:
//! - Human: an ASCII line such as `G1 X12.5 S'spindle' ; comment\n`
//! - Binary: packed header bytes, little-endian payloads, a `0x00`
//!   terminator and a CRC-8 check byte
//!
//! [`CommandStream`] buffers bytes arriving in arbitrary chunks and yields one
//! command at a time, skipping past malformed frames.

pub mod command;
pub mod config;
pub mod crc;
pub mod endian;
pub mod error;
pub mod param;
pub mod reader;
pub mod stream;
mod wire;
pub mod writer;

pub use command::{Command, Encoding};
pub use config::CodecConfig;
pub use crc::{crc8, Crc8};
pub use error::{CodecError, Result, StreamError};
pub use param::{Param, ParamType, Value};
pub use reader::CommandReader;
pub use stream::CommandStream;
pub use writer::CommandWriter;
