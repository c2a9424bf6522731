/// Errors produced by the parameter and command codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Malformed syntax or an invalid token.
    #[error("malformed command syntax")]
    Parse,

    /// A value cannot be represented in the target encoding.
    #[error("value cannot be represented in the target encoding")]
    Dump,

    /// Not enough input to parse, or not enough output space to write.
    #[error("insufficient buffer space or incomplete input")]
    Buffer,

    /// The binary frame failed its CRC-8 check.
    #[error("binary frame failed CRC-8 check")]
    Crc,

    /// A human line with no content (blank or comment only).
    #[error("empty line")]
    Empty,
}

impl CodecError {
    /// Returns true if a [`CommandStream`](crate::CommandStream) skips input
    /// after this error instead of waiting for more bytes.
    pub fn is_resync(self) -> bool {
        matches!(self, CodecError::Parse | CodecError::Dump | CodecError::Crc)
    }
}

/// Errors from the blocking reader and writer adapters.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// The codec rejected a frame.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// An I/O error occurred while reading or writing.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream ended before another complete command was received.
    #[error("connection closed (no complete command)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, CodecError>;
