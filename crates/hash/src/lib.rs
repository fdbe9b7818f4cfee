#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! MD5 content verification for hangar
//!
//! Catalogs publish an MD5 hex digest for every package archive. The
//! [`ChecksumStream`] accumulates the digest incrementally as body bytes
//! arrive so the archive never has to be hashed in a second pass.

use hangar_errors::{Error, StorageError};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of an MD5 digest in bytes
pub const DIGEST_LEN: usize = 16;

/// An MD5 digest value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum {
    bytes: [u8; DIGEST_LEN],
}

impl Checksum {
    /// Create a checksum from raw bytes
    #[must_use]
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.bytes
    }

    /// Lower-case hex rendering, the form catalogs publish
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse from hex string
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or is not exactly 32 characters.
    pub fn from_hex(s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| StorageError::CorruptedData {
            message: format!("invalid hex: {e}"),
        })?;

        let array: [u8; DIGEST_LEN] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| StorageError::CorruptedData {
                    message: format!("checksum must be {DIGEST_LEN} bytes, got {}", bytes.len()),
                })?;
        Ok(Self::from_bytes(array))
    }

    /// Compute the checksum of a byte slice in one shot
    #[must_use]
    pub fn from_data(data: &[u8]) -> Self {
        let mut stream = ChecksumStream::new();
        stream.update(data);
        stream.finalize()
    }

    /// Exact, case-sensitive comparison against a published hex digest
    #[must_use]
    pub fn matches_hex(&self, expected: &str) -> bool {
        self.to_hex() == expected
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Incremental MD5 accumulator fed by arriving body bytes
#[derive(Clone, Default)]
pub struct ChecksumStream {
    hasher: Md5,
    bytes_hashed: u64,
}

impl ChecksumStream {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next chunk of the stream
    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
        self.bytes_hashed += chunk.len() as u64;
    }

    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed
    }

    /// Finish the stream and produce the digest
    #[must_use]
    pub fn finalize(self) -> Checksum {
        Checksum::from_bytes(self.hasher.finalize().into())
    }

    /// Produce the digest and reset the accumulator for reuse
    pub fn finalize_reset(&mut self) -> Checksum {
        self.bytes_hashed = 0;
        Checksum::from_bytes(self.hasher.finalize_reset().into())
    }
}

impl fmt::Debug for ChecksumStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChecksumStream")
            .field("bytes_hashed", &self.bytes_hashed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_digest() {
        let checksum = ChecksumStream::new().finalize();
        assert_eq!(checksum.to_hex(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_known_digest() {
        let checksum = Checksum::from_data(b"hello world");
        assert_eq!(checksum.to_hex(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[test]
    fn test_matches_hex_is_case_sensitive() {
        let checksum = Checksum::from_data(b"");
        assert!(checksum.matches_hex("d41d8cd98f00b204e9800998ecf8427e"));
        assert!(!checksum.matches_hex("D41D8CD98F00B204E9800998ECF8427E"));
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        assert!(Checksum::from_hex("abcd").is_err());
        assert!(Checksum::from_hex("zz").is_err());
    }

    #[test]
    fn test_serialization() {
        let checksum = Checksum::from_data(b"test");
        let json = serde_json::to_string(&checksum).unwrap();
        let deserialized: Checksum = serde_json::from_str(&json).unwrap();
        assert_eq!(checksum, deserialized);
    }

    #[test]
    fn test_finalize_reset() {
        let mut stream = ChecksumStream::new();
        stream.update(b"hello world");
        assert_eq!(stream.bytes_hashed(), 11);
        let first = stream.finalize_reset();
        assert_eq!(stream.bytes_hashed(), 0);
        assert_eq!(first, Checksum::from_data(b"hello world"));
        assert_eq!(stream.finalize(), Checksum::from_data(b""));
    }
}
