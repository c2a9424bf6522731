use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::command::{Command, Encoding};
use crate::config::CodecConfig;
use crate::error::StreamError;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Writes complete commands to any `Write` stream.
pub struct CommandWriter<T> {
    inner: T,
    buf: BytesMut,
    config: CodecConfig,
}

impl<T: Write> CommandWriter<T> {
    /// Create a new command writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, CodecConfig::default())
    }

    /// Create a new command writer with explicit configuration.
    pub fn with_config(inner: T, config: CodecConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a command in the configured output encoding, or in the
    /// command's own encoding when none is configured (blocking).
    pub fn write_command(&mut self, command: &Command) -> Result<(), StreamError> {
        let encoding = self.config.output_encoding.unwrap_or(command.encoding());
        self.write_command_as(command, encoding)
    }

    /// Encode and send a command in an explicit encoding.
    ///
    /// Nothing reaches the stream if encoding fails.
    pub fn write_command_as(
        &mut self,
        command: &Command,
        encoding: Encoding,
    ) -> Result<(), StreamError> {
        self.buf.clear();
        command.encode(encoding, &mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(StreamError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(StreamError::Io(err)),
            }
        }

        tracing::trace!(
            encoding = encoding.name(),
            bytes = self.buf.len(),
            "wrote command"
        );
        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<(), StreamError> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(StreamError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Force every subsequent command into one encoding, or `None` to keep
    /// each command's own.
    pub fn set_output_encoding(&mut self, encoding: Option<Encoding>) {
        self.config.output_encoding = encoding;
    }

    /// Current writer configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;
    use crate::error::CodecError;
    use crate::param::Param;

    fn s2() -> Command {
        Command::with_params('S', 2, vec![Param::i16('N', 1235).unwrap()]).unwrap()
    }

    #[test]
    fn writes_binary_by_default() {
        let mut writer = CommandWriter::new(Vec::new());
        writer.write_command(&s2()).unwrap();
        assert_eq!(
            writer.into_inner(),
            vec![0xD3, 0x02, 0x8E, 0xD3, 0x04, 0x00, 0x59]
        );
    }

    #[test]
    fn output_encoding_overrides_command() {
        let mut writer = CommandWriter::new(Vec::new());
        writer.set_output_encoding(Some(Encoding::Human));
        assert_eq!(writer.config().output_encoding, Some(Encoding::Human));
        writer.write_command(&s2()).unwrap();
        assert_eq!(writer.get_ref().as_slice(), b"S2 N1235\r\n");
    }

    #[test]
    fn write_command_as_ignores_config() {
        let mut writer = CommandWriter::new(Vec::new());
        writer
            .write_command_as(&Command::new('M', 5).unwrap(), Encoding::Human)
            .unwrap();
        assert_eq!(writer.get_mut().as_slice(), b"M5\r\n");
    }

    #[test]
    fn dump_error_writes_nothing() {
        let mut cmd = Command::new('G', 1).unwrap();
        cmd.push(Param::f64('X', f64::NAN).unwrap());

        let mut writer = CommandWriter::new(Vec::new());
        let err = writer.write_command_as(&cmd, Encoding::Human).unwrap_err();
        assert!(matches!(err, StreamError::Codec(CodecError::Dump)));
        assert!(writer.get_ref().is_empty());
    }

    struct FlakyWriter {
        out: Vec<u8>,
        hiccups: usize,
    }

    impl Write for FlakyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.hiccups > 0 {
                self.hiccups -= 1;
                let kind = if self.hiccups % 2 == 0 {
                    ErrorKind::Interrupted
                } else {
                    ErrorKind::WouldBlock
                };
                return Err(io::Error::from(kind));
            }
            // One byte at a time.
            self.out.push(buf[0]);
            Ok(1)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn retries_interrupted_and_partial_writes() {
        let mut writer = CommandWriter::new(FlakyWriter {
            out: Vec::new(),
            hiccups: 4,
        });
        writer.write_command_as(&s2(), Encoding::Human).unwrap();
        assert_eq!(writer.into_inner().out, b"S2 N1235\r\n");
    }

    struct ClosedWriter;

    impl Write for ClosedWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn zero_length_write_is_connection_closed() {
        let mut writer = CommandWriter::new(ClosedWriter);
        assert!(matches!(
            writer.write_command(&s2()),
            Err(StreamError::ConnectionClosed)
        ));
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::BrokenPipe, "pipe closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_errors_propagate() {
        let mut writer = CommandWriter::new(BrokenWriter);
        assert!(matches!(
            writer.write_command(&s2()),
            Err(StreamError::Io(ref e)) if e.kind() == ErrorKind::BrokenPipe
        ));
    }
}
