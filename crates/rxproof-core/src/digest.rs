//! Document digests: the keys of the presence registry.
//!
//! A digest is a 32-byte fingerprint of file content. Two byte-identical
//! inputs always produce the same digest, on every platform, under a given
//! [`DigestAlgorithm`].

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Length of every digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// A 32-byte document digest.
///
/// This is the only key the registry understands. It carries no information
/// about the document beyond its fingerprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(pub [u8; DIGEST_LEN]);

impl Digest {
    /// Hash `data` with the given algorithm.
    pub fn compute(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        let mut hasher = DigestHasher::new(algorithm);
        hasher.update(data);
        hasher.finalize()
    }

    /// Hash `data` with SHA-256.
    pub fn sha256(data: &[u8]) -> Self {
        Self::compute(DigestAlgorithm::Sha256, data)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    /// Convert to lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, accepting an optional `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, CoreError> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(body).map_err(|e| CoreError::InvalidDigest(e.to_string()))?;
        Self::try_from(bytes.as_slice())
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}...)", &self.to_hex()[..16])
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = CoreError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; DIGEST_LEN] = slice.try_into().map_err(|_| {
            CoreError::InvalidDigest(format!(
                "expected {} bytes, got {}",
                DIGEST_LEN,
                slice.len()
            ))
        })?;
        Ok(Self(arr))
    }
}

impl FromStr for Digest {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

// Hex in human-readable formats, raw bytes otherwise.
impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Digest::from_hex(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Digest::try_from(bytes.as_slice()).map_err(serde::de::Error::custom)
        }
    }
}

/// Hash function used to fingerprint documents.
///
/// Both produce 32 bytes. A deployment must pick one and keep it: the same
/// file hashed under different algorithms yields unrelated digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// SHA-256 (FIPS 180-4).
    #[default]
    Sha256,
    /// BLAKE3 in default 256-bit output mode.
    Blake3,
}

impl DigestAlgorithm {
    /// Stable lowercase name.
    pub const fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            other => Err(CoreError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Incremental hasher for content that arrives in chunks.
///
/// Feeding the same bytes in any chunking yields the same digest as
/// [`Digest::compute`] over the concatenation.
pub enum DigestHasher {
    Sha256(Sha256),
    Blake3(Box<blake3::Hasher>),
}

impl DigestHasher {
    /// Start a new hash with the given algorithm.
    pub fn new(algorithm: DigestAlgorithm) -> Self {
        match algorithm {
            DigestAlgorithm::Sha256 => DigestHasher::Sha256(Sha256::default()),
            DigestAlgorithm::Blake3 => DigestHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// Absorb more bytes.
    pub fn update(&mut self, data: &[u8]) {
        match self {
            DigestHasher::Sha256(h) => sha2::Digest::update(h, data),
            DigestHasher::Blake3(h) => {
                h.update(data);
            }
        }
    }

    /// Finish and return the digest.
    pub fn finalize(self) -> Digest {
        match self {
            DigestHasher::Sha256(h) => Digest(sha2::Digest::finalize(h).into()),
            DigestHasher::Blake3(h) => Digest(*h.finalize().as_bytes()),
        }
    }
}
