//! Byte View Module
//!
//! Immutable view over a cached value.

use std::fmt;

use bytes::Bytes;

use crate::cache::lru::ByteSize;

// == Byte View ==
/// An immutable view of cached bytes.
///
/// The view owns its content; every accessor that hands bytes to a caller
/// returns a fresh copy, so neither side can mutate what the other holds.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    b: Bytes,
}

impl ByteView {
    // == Length ==
    /// Returns the view's length in bytes.
    pub fn len(&self) -> usize {
        self.b.len()
    }

    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    // == Accessors ==
    /// Returns a copy of the data as a byte vector.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.b.to_vec()
    }

    /// Returns a copy of the data as a string, replacing invalid UTF-8.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.b).into_owned()
    }

    /// Hands the underlying buffer to an HTTP body. `Bytes` is immutable, so
    /// the response cannot write back into the cache.
    pub(crate) fn into_body(self) -> Bytes {
        self.b
    }
}

impl ByteSize for ByteView {
    fn byte_size(&self) -> usize {
        self.len()
    }
}

// == Conversions ==
impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        Self { b: Bytes::from(v) }
    }
}

impl From<&[u8]> for ByteView {
    fn from(v: &[u8]) -> Self {
        Self {
            b: Bytes::copy_from_slice(v),
        }
    }
}

impl From<&str> for ByteView {
    fn from(v: &str) -> Self {
        Self::from(v.as_bytes())
    }
}

impl From<Bytes> for ByteView {
    fn from(b: Bytes) -> Self {
        Self { b }
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView").field(&self.as_string()).finish()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}
