//! Decode seam between raw cached bytes and the caller's value type
//!
//! The cache persists raw bytes only; what they mean (an image, a thumbnail,
//! plain bytes) is the caller's business. Bytes that fail to decode are never
//! persisted.

use std::fmt;

/// Bytes were retrieved but do not form a valid object of the expected type.
#[derive(Debug, Clone)]
pub struct DecodeError {
    reason: String,
}

impl DecodeError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode error: {}", self.reason)
    }
}

impl std::error::Error for DecodeError {}

/// Turns raw fetched bytes into the caller-facing value.
pub trait BlobDecoder: Send + Sync + 'static {
    type Output;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError>;
}

/// Identity decoder: hands the raw bytes straight back.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawDecoder;

impl BlobDecoder for RawDecoder {
    type Output = Vec<u8>;

    fn decode(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError> {
        Ok(bytes.to_vec())
    }
}
