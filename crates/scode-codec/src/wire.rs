//! Output sinks shared by the parameter and command encoders.

use bytes::{BufMut, BytesMut};

use crate::crc::Crc8;
use crate::error::{CodecError, Result};

pub(crate) trait Sink {
    fn put(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Fixed-size output. Fails with [`CodecError::Buffer`] once full; bytes
/// already written are left in place.
pub(crate) struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn written(&self) -> usize {
        self.pos
    }
}

impl Sink for SliceSink<'_> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        let end = self.pos + bytes.len();
        let dst = self.buf.get_mut(self.pos..end).ok_or(CodecError::Buffer)?;
        dst.copy_from_slice(bytes);
        self.pos = end;
        Ok(())
    }
}

impl Sink for BytesMut {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.put_slice(bytes);
        Ok(())
    }
}

/// Forwards to an inner sink while accumulating a CRC-8 of everything written.
pub(crate) struct CrcSink<'s, S> {
    inner: &'s mut S,
    crc: Crc8,
}

impl<'s, S: Sink> CrcSink<'s, S> {
    pub(crate) fn new(inner: &'s mut S) -> Self {
        Self {
            inner,
            crc: Crc8::new(),
        }
    }

    pub(crate) fn crc(&self) -> u8 {
        self.crc.finish(0)
    }
}

impl<S: Sink> Sink for CrcSink<'_, S> {
    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.put(bytes)?;
        self.crc.update(bytes);
        Ok(())
    }
}
