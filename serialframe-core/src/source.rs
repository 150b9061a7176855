//! Byte sources and sinks the framing engine runs against
//!
//! A source poll never blocks: `Ok(0)` means "no data right now", while end
//! of stream and I/O failures are reported as errors so the engine can tell
//! a silent device from a dead one.

use crate::error::FramingError;
use bytes::Bytes;
use std::io::{ErrorKind, Read, Write};

#[cfg(feature = "logging")]
use tracing::trace;

/// Non-blocking supplier of raw bytes
pub trait ByteSource {
    /// Read up to `buf.len()` bytes without blocking.
    ///
    /// Returns `Ok(0)` when no bytes are available at this moment.
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, FramingError>;
}

/// Receiver of raw bytes written to the device
pub trait ByteSink {
    /// Write `data` once and flush, returning how many bytes were accepted
    fn write(&mut self, data: &[u8]) -> Result<usize, FramingError>;
}

/// An open device: readable and writable
pub trait Transport: ByteSource + ByteSink + Send {}

impl<T: ByteSource + ByteSink + Send> Transport for T {}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, FramingError> {
        (**self).try_read(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, FramingError> {
        (**self).try_read(buf)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for &mut S {
    fn write(&mut self, data: &[u8]) -> Result<usize, FramingError> {
        (**self).write(data)
    }
}

impl<S: ByteSink + ?Sized> ByteSink for Box<S> {
    fn write(&mut self, data: &[u8]) -> Result<usize, FramingError> {
        (**self).write(data)
    }
}

/// In-memory source replaying a fixed buffer
///
/// Once drained it reports "no data" forever, like a device that went quiet,
/// unless [`SliceSource::end_of_stream_when_drained`] is set.
#[derive(Debug, Clone)]
pub struct SliceSource {
    data: Bytes,
    pos: usize,
    max_per_read: Option<usize>,
    eos_when_drained: bool,
}

impl SliceSource {
    /// Create a source over `data`
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            max_per_read: None,
            eos_when_drained: false,
        }
    }

    /// Deliver at most `n` bytes per poll, emulating a slow line
    pub fn max_per_read(mut self, n: usize) -> Self {
        self.max_per_read = Some(n.max(1));
        self
    }

    /// Report [`FramingError::EndOfStream`] once every byte was delivered
    pub fn end_of_stream_when_drained(mut self) -> Self {
        self.eos_when_drained = true;
        self
    }

    /// Bytes not yet delivered
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Whether every byte has been delivered
    pub fn is_drained(&self) -> bool {
        self.pos >= self.data.len()
    }
}

impl ByteSource for SliceSource {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, FramingError> {
        if self.is_drained() {
            if self.eos_when_drained {
                return Err(FramingError::EndOfStream);
            }
            return Ok(0);
        }

        let mut n = buf.len().min(self.data.len() - self.pos);
        if let Some(max) = self.max_per_read {
            n = n.min(max);
        }

        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Adapter turning any `Read + Write` handle into a [`Transport`]
///
/// `WouldBlock`, `TimedOut` and `Interrupted` are "no data this poll". A
/// zero-length read is end of stream, except for devices configured to
/// return immediately when idle (`VMIN=0`), see
/// [`StreamTransport::zero_read_is_idle`].
#[derive(Debug)]
pub struct StreamTransport<T> {
    inner: T,
    zero_read_is_idle: bool,
}

impl<T> StreamTransport<T> {
    /// Wrap an I/O handle
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            zero_read_is_idle: false,
        }
    }

    /// Treat `Ok(0)` from the handle as "no data" instead of end of stream
    pub fn zero_read_is_idle(mut self, idle: bool) -> Self {
        self.zero_read_is_idle = idle;
        self
    }

    /// Borrow the wrapped handle
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Unwrap the handle
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> ByteSource for StreamTransport<T> {
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, FramingError> {
        if buf.is_empty() {
            return Ok(0);
        }

        match self.inner.read(buf) {
            Ok(0) if self.zero_read_is_idle => Ok(0),
            Ok(0) => Err(FramingError::EndOfStream),
            Ok(n) => {
                #[cfg(feature = "logging")]
                trace!("Read {} bytes from device", n);
                Ok(n)
            }
            Err(e) => match e.kind() {
                ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted => Ok(0),
                _ => Err(e.into()),
            },
        }
    }
}

impl<T: Write> ByteSink for StreamTransport<T> {
    fn write(&mut self, data: &[u8]) -> Result<usize, FramingError> {
        let written = self
            .inner
            .write(data)
            .map_err(|e| FramingError::WriteNotAllowed(e.to_string()))?;
        self.inner
            .flush()
            .map_err(|e| FramingError::WriteNotAllowed(e.to_string()))?;
        Ok(written)
    }
}
