//! # Byte Streams
//!
//! Bounds-checked binary codec used by every packet on the wire.
//!
//! [`WriteStream`] appends fixed-width scalars and length-prefixed blobs to a
//! growable buffer. [`ReadStream`] walks an owned buffer with a cursor and
//! never reads past its end, whatever the input.
//!
//! ## Encoding
//! - Scalars: fixed width, little-endian
//! - Strings and byte blobs: `[u64 LE length][raw bytes]`, no terminator
//!
//! ## Security
//! A failed read leaves the cursor exactly where it was. Length prefixes are
//! validated against the remaining bytes before anything is allocated, so an
//! adversarial prefix can never trigger a large allocation or an out-of-bounds copy.

use bytes::{Bytes, BytesMut};
use std::ops::Range;

use crate::error::{ProtocolError, Result};

mod sealed {
    pub trait Sealed {}
}

/// Fixed-layout value that can be copied to and from the wire.
///
/// Sealed: only plain integers, floats, `bool` and byte arrays qualify, so a
/// read into anything holding pointers or padding is rejected at compile time.
pub trait WireScalar: sealed::Sealed + Copy + Sized {
    /// Encoded width in bytes
    const SIZE: usize;

    /// Append the encoded form to `out`
    fn put(self, out: &mut BytesMut);

    /// Decode from exactly `SIZE` bytes
    fn get(raw: &[u8]) -> Result<Self>;
}

macro_rules! impl_wire_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl WireScalar for $ty {
            const SIZE: usize = std::mem::size_of::<$ty>();

            #[inline]
            fn put(self, out: &mut BytesMut) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn get(raw: &[u8]) -> Result<Self> {
                let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                bytes.copy_from_slice(raw);
                Ok(<$ty>::from_le_bytes(bytes))
            }
        }
    )*};
}

impl_wire_scalar!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128, f32, f64);

impl sealed::Sealed for bool {}

impl WireScalar for bool {
    const SIZE: usize = 1;

    #[inline]
    fn put(self, out: &mut BytesMut) {
        out.extend_from_slice(&[u8::from(self)]);
    }

    fn get(raw: &[u8]) -> Result<Self> {
        match raw[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::InvalidValue(format!(
                "{other:#04x} is not a valid bool"
            ))),
        }
    }
}

impl<const N: usize> sealed::Sealed for [u8; N] {}

impl<const N: usize> WireScalar for [u8; N] {
    const SIZE: usize = N;

    #[inline]
    fn put(self, out: &mut BytesMut) {
        out.extend_from_slice(&self);
    }

    #[inline]
    fn get(raw: &[u8]) -> Result<Self> {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(raw);
        Ok(bytes)
    }
}

/// Append-only output stream
#[derive(Debug, Default, Clone)]
pub struct WriteStream {
    buf: BytesMut,
}

impl WriteStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a stream with room for `capacity` bytes before reallocating
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Append a fixed-width scalar
    #[inline]
    pub fn write<T: WireScalar>(&mut self, value: T) {
        value.put(&mut self.buf);
    }

    /// Append a length-prefixed byte blob
    pub fn write_bytes(&mut self, value: &[u8]) {
        self.write(value.len() as u64);
        self.buf.extend_from_slice(value);
    }

    /// Append a length-prefixed UTF-8 string
    pub fn write_string(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop all written bytes, keeping the allocation for reuse
    pub fn flush(&mut self) {
        self.buf.clear();
    }

    /// Reserve room for at least `additional` more bytes
    pub fn reserve(&mut self, additional: usize) {
        self.buf.reserve(additional);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Convert into an immutable, cheaply clonable buffer ready for the transport
    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

/// Cursor-based input stream over an owned buffer
#[derive(Debug, Default, Clone)]
pub struct ReadStream {
    buf: Bytes,
    pos: usize,
}

impl ReadStream {
    /// Take ownership of `buf` without copying
    pub fn new(buf: Bytes) -> Self {
        Self { buf, pos: 0 }
    }

    /// Copy `data` into a new stream
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    /// Read a fixed-width scalar, leaving the cursor untouched on failure
    pub fn read<T: WireScalar>(&mut self) -> Result<T> {
        let end = self.checked_end(T::SIZE)?;
        let value = T::get(&self.buf[self.pos..end])?;
        self.pos = end;
        Ok(value)
    }

    /// Read a length-prefixed byte blob
    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        let range = self.read_prefixed()?;
        Ok(self.buf[range].to_vec())
    }

    /// Read a length-prefixed byte blob as a zero-copy view into the buffer
    pub fn read_shared(&mut self) -> Result<Bytes> {
        let range = self.read_prefixed()?;
        Ok(self.buf.slice(range))
    }

    /// Read a length-prefixed UTF-8 string
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let range = self.read_prefixed()?;
        match std::str::from_utf8(&self.buf[range]) {
            Ok(value) => Ok(value.to_owned()),
            Err(_) => {
                self.pos = start;
                Err(ProtocolError::InvalidUtf8)
            }
        }
    }

    /// Current cursor offset
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn checked_end(&self, requested: usize) -> Result<usize> {
        let available = self.remaining();
        if requested > available {
            return Err(ProtocolError::UnexpectedEof {
                requested,
                available,
            });
        }
        Ok(self.pos + requested)
    }

    // Length prefix and body are validated together; on failure the cursor is
    // rewound past the prefix as well.
    fn read_prefixed(&mut self) -> Result<Range<usize>> {
        let start = self.pos;
        let declared = self.read::<u64>()?;
        let requested = usize::try_from(declared).unwrap_or(usize::MAX);
        match self.checked_end(requested) {
            Ok(end) => {
                let begin = self.pos;
                self.pos = end;
                Ok(begin..end)
            }
            Err(e) => {
                self.pos = start;
                Err(e)
            }
        }
    }
}

impl From<Bytes> for ReadStream {
    fn from(buf: Bytes) -> Self {
        Self::new(buf)
    }
}

impl From<Vec<u8>> for ReadStream {
    fn from(buf: Vec<u8>) -> Self {
        Self::new(Bytes::from(buf))
    }
}

impl From<WriteStream> for ReadStream {
    fn from(stream: WriteStream) -> Self {
        Self::new(stream.freeze())
    }
}
