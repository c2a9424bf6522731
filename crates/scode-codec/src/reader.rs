use std::io::{ErrorKind, Read};

use crate::command::Command;
use crate::config::CodecConfig;
use crate::error::{CodecError, StreamError};
use crate::stream::CommandStream;

/// Reads commands from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete commands
/// or a codec error for a frame that was skipped.
pub struct CommandReader<T> {
    inner: T,
    stream: CommandStream,
    chunk: Vec<u8>,
    config: CodecConfig,
    stalled: bool,
}

impl<T: Read> CommandReader<T> {
    /// Create a new command reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new command reader with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            stream: CommandStream::with_config(&config),
            chunk: vec![0; config.read_chunk_size.max(1)],
            config,
            stalled: false,
        }
    }

    /// Read the next command (blocking).
    ///
    /// Returns `Err(StreamError::Codec(_))` for a malformed frame; the reader
    /// stays usable and the next call continues after it. Returns
    /// `Err(StreamError::ConnectionClosed)` at EOF.
    pub fn read_command(&mut self) -> Result<Command, StreamError> {
        loop {
            if !self.stalled {
                match self.stream.pop() {
                    Ok(command) => return Ok(command),
                    Err(CodecError::Buffer) => {}
                    Err(err) => {
                        // Nothing skipped: wait for input before popping again.
                        self.stalled = self.stream.stalled();
                        return Err(err.into());
                    }
                }
            }

            let read = match self.inner.read(&mut self.chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(StreamError::Io(err)),
            };

            if read == 0 {
                if !self.stream.is_empty() {
                    tracing::debug!(
                        pending = self.stream.len(),
                        "stream ended with an incomplete command"
                    );
                }
                return Err(StreamError::ConnectionClosed);
            }

            self.stalled = false;
            self.stream.append(&self.chunk[..read]);
        }
    }

    /// Borrow the reassembly buffer.
    pub fn stream(&self) -> &CommandStream {
        &self.stream
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying reader.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the chunk size for subsequent reads.
    pub fn set_read_chunk_size(&mut self, read_chunk_size: usize) {
        self.config.read_chunk_size = read_chunk_size;
        self.chunk.resize(read_chunk_size.max(1), 0);
    }

    /// Current reader configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

impl<T: Read> Iterator for CommandReader<T> {
    type Item = Result<Command, StreamError>;

    /// Yields commands and codec errors; ends at EOF.
    fn next(&mut self) -> Option<Self::Item> {
        match self.read_command() {
            Err(StreamError::ConnectionClosed) => None,
            other => Some(other),
        }
    }
}
