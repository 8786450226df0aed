//! Digest Producer: file bytes in, registry key out.
//!
//! The producer is the only place content is hashed. It enforces the size
//! bound before a digest exists, so an over-size input can never yield a
//! key that reaches the registry.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use rxproof_core::{Digest, DigestAlgorithm, DigestHasher};
use tracing::debug;

use crate::error::InputError;

/// Default size bound: 10 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

const CHUNK: usize = 64 * 1024;

/// Deterministic content hasher with a size bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigestProducer {
    algorithm: DigestAlgorithm,
    max_bytes: u64,
}

impl Default for DigestProducer {
    fn default() -> Self {
        Self::new(DigestAlgorithm::default(), DEFAULT_MAX_BYTES)
    }
}

impl DigestProducer {
    pub fn new(algorithm: DigestAlgorithm, max_bytes: u64) -> Self {
        Self {
            algorithm,
            max_bytes,
        }
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Hash an in-memory buffer.
    pub fn digest_bytes(&self, bytes: &[u8]) -> Result<Digest, InputError> {
        self.check_size(bytes.len() as u64)?;
        Ok(Digest::compute(self.algorithm, bytes))
    }

    /// Hash everything `reader` yields, reading at most `max_bytes + 1` bytes.
    pub fn digest_reader<R: Read>(&self, reader: R) -> Result<Digest, InputError> {
        let mut reader = reader.take(self.max_bytes.saturating_add(1));
        let mut hasher = DigestHasher::new(self.algorithm);
        let mut buf = vec![0u8; CHUNK];
        let mut total: u64 = 0;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(InputError::Unreadable(e)),
            };
            total += n as u64;
            self.check_size(total)?;
            hasher.update(&buf[..n]);
        }

        Ok(hasher.finalize())
    }

    /// Hash a file on disk.
    ///
    /// Rejects files whose metadata already reports an over-size length
    /// without reading them.
    pub fn digest_file(&self, path: impl AsRef<Path>) -> Result<Digest, InputError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(InputError::NotAFile(path.display().to_string()));
        }
        self.check_size(meta.len())?;

        let digest = self.digest_reader(file)?;
        debug!(path = %path.display(), %digest, algorithm = %self.algorithm, "fingerprinted file");
        Ok(digest)
    }

    fn check_size(&self, size: u64) -> Result<(), InputError> {
        if size > self.max_bytes {
            return Err(InputError::TooLarge {
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}
