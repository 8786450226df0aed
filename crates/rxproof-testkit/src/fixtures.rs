//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use std::path::PathBuf;
use std::sync::Arc;

use rxproof::{Client, DigestProducer, Registry, RegistryConfig};
use rxproof_core::{CallerId, Digest, Keypair, Submission};
use rxproof_ledger::MemoryLedger;
use tempfile::TempDir;

/// A keypair, an in-memory registry, and a scratch directory.
pub struct TestFixture {
    pub keypair: Keypair,
    pub registry: Arc<Registry<MemoryLedger>>,
    dir: TempDir,
}

impl TestFixture {
    /// Create a new fixture with a random keypair.
    pub fn new() -> Self {
        Self::from_keypair(Keypair::generate())
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self::from_keypair(Keypair::from_seed(&seed))
    }

    fn from_keypair(keypair: Keypair) -> Self {
        Self {
            keypair,
            registry: Arc::new(Registry::new(MemoryLedger::new(), RegistryConfig::default())),
            dir: tempfile::tempdir().expect("create fixture dir"),
        }
    }

    /// Another identity sharing this fixture's registry.
    pub fn party(&self, seed: [u8; 32]) -> Client<MemoryLedger> {
        Client::new(
            Keypair::from_seed(&seed),
            Arc::clone(&self.registry),
            DigestProducer::default(),
        )
    }

    pub fn caller_id(&self) -> CallerId {
        self.keypair.caller_id()
    }

    /// A client bound to this fixture's identity and registry.
    pub fn client(&self) -> Client<MemoryLedger> {
        Client::new(
            self.keypair.clone(),
            Arc::clone(&self.registry),
            DigestProducer::default(),
        )
    }

    /// Sign a submission for `digest`.
    pub fn submission(&self, digest: Digest) -> Submission {
        Submission::sign(&self.keypair, digest, now_millis())
    }

    /// Write `bytes` to `name` inside the scratch directory.
    pub fn write_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, bytes).expect("write fixture file");
        path
    }

    pub fn dir(&self) -> &std::path::Path {
        self.dir.path()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create fixtures with distinct deterministic identities and separate
/// registries.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            TestFixture::with_seed(seed)
        })
        .collect()
}

/// A small PDF-shaped prescription document.
pub fn sample_prescription(drug: &str) -> Vec<u8> {
    format!(
        "%PDF-1.7\n\
         1 0 obj << /Type /Catalog >> endobj\n\
         % Patient: Jane Doe\n\
         % Rx: {drug}, 1 tablet twice daily, 14 days\n\
         % Prescriber: Dr. A. Smith\n\
         %%EOF\n"
    )
    .into_bytes()
}

/// Copy of `bytes` with one bit inverted.
///
/// # Panics
///
/// If `bit` is past the end of `bytes`.
pub fn flip_bit(bytes: &[u8], bit: usize) -> Vec<u8> {
    let mut out = bytes.to_vec();
    out[bit / 8] ^= 1 << (bit % 8);
    out
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_millis() as i64
}
