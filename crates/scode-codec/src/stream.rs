use crate::command::{Command, BINARY_TERMINATOR};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};

/// Reassembles commands from a byte stream that arrives in arbitrary chunks.
///
/// Bytes in `[0, pos)` are consumed, `[pos, end)` await parsing and
/// `buf.len()` is the capacity. One instance serves one ordered stream.
#[derive(Debug, Default)]
pub struct CommandStream {
    buf: Vec<u8>,
    pos: usize,
    end: usize,
    stalled: bool,
}

impl CommandStream {
    /// Create a stream with no buffer allocated yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity],
            pos: 0,
            end: 0,
            stalled: false,
        }
    }

    pub fn with_config(config: &CodecConfig) -> Self {
        Self::with_capacity(config.initial_capacity)
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Unconsumed input.
    pub fn pending(&self) -> &[u8] {
        &self.buf[self.pos..self.end]
    }

    pub fn len(&self) -> usize {
        self.end - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == self.end
    }

    /// True when the last `pop` failed and found no point to skip to.
    /// Popping again before more input arrives repeats the same error.
    pub(crate) fn stalled(&self) -> bool {
        self.stalled
    }

    /// Append received bytes.
    ///
    /// Compacts in place when that frees enough room, otherwise moves the
    /// unconsumed tail into a buffer sized exactly to fit.
    pub fn append(&mut self, bytes: &[u8]) {
        let pending = self.end - self.pos;
        if self.end + bytes.len() > self.buf.len() {
            if pending + bytes.len() <= self.buf.len() {
                tracing::trace!(pending, consumed = self.pos, "compacting stream buffer");
                self.buf.copy_within(self.pos..self.end, 0);
            } else {
                let capacity = pending + bytes.len();
                tracing::trace!(
                    old = self.buf.len(),
                    new = capacity,
                    "growing stream buffer"
                );
                let mut grown = vec![0; capacity];
                grown[..pending].copy_from_slice(&self.buf[self.pos..self.end]);
                self.buf = grown;
            }
            self.pos = 0;
            self.end = pending;
        }

        self.buf[self.end..self.end + bytes.len()].copy_from_slice(bytes);
        self.end += bytes.len();
    }

    /// Extract the next command.
    ///
    /// `Buffer` means more input is needed and nothing was consumed. After
    /// `Parse`, `Dump` or `Crc` the cursor is moved past the bad frame where
    /// the buffered data allows it. Blank and comment-only lines are skipped
    /// and never reported.
    pub fn pop(&mut self) -> Result<Command> {
        if self.buf.is_empty() {
            return Err(CodecError::Buffer);
        }

        self.stalled = false;
        loop {
            match Command::parse(&self.buf[self.pos..self.end]) {
                Ok((command, consumed)) => {
                    self.pos += consumed;
                    return Ok(command);
                }
                Err(CodecError::Empty) => self.skip_line(),
                Err(CodecError::Buffer) => return Err(CodecError::Buffer),
                Err(err @ (CodecError::Parse | CodecError::Dump)) => {
                    self.stalled = !self.resync_any(err);
                    return Err(err);
                }
                Err(CodecError::Crc) => {
                    self.stalled = !self.resync_binary(CodecError::Crc);
                    return Err(CodecError::Crc);
                }
            }
        }
    }

    /// Past the next `\n` or `\r`, which an `Empty` result guarantees exists.
    fn skip_line(&mut self) {
        if let Some(i) = self.pending().iter().position(|&b| b == b'\n' || b == b'\r') {
            tracing::trace!(skipped = i + 1, "skipping blank line");
            self.pos += i + 1;
        }
    }

    /// Past whichever comes first: a binary terminator plus its CRC byte, or
    /// a line ending.
    fn resync_any(&mut self, err: CodecError) -> bool {
        let found = self
            .pending()
            .iter()
            .position(|&b| b == BINARY_TERMINATOR || b == b'\n' || b == b'\r');
        match found {
            Some(i) if self.pending()[i] == BINARY_TERMINATOR => {
                self.skip_terminator(i, err);
                true
            }
            Some(i) => {
                tracing::debug!(error = %err, skipped = i + 1, "resynchronized at line end");
                self.pos += i + 1;
                true
            }
            None => {
                tracing::debug!(error = %err, "not enough data to resynchronize");
                false
            }
        }
    }

    fn resync_binary(&mut self, err: CodecError) -> bool {
        match self.pending().iter().position(|&b| b == BINARY_TERMINATOR) {
            Some(i) => {
                self.skip_terminator(i, err);
                true
            }
            None => {
                tracing::debug!(error = %err, "not enough data to resynchronize");
                false
            }
        }
    }

    fn skip_terminator(&mut self, i: usize, err: CodecError) {
        let mut skipped = i + 1;
        if self.pos + skipped < self.end {
            skipped += 1;
        }
        tracing::debug!(error = %err, skipped, "resynchronized at binary terminator");
        self.pos += skipped;
    }
}
