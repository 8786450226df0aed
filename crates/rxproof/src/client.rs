//! Client: the caller side of the registry.
//!
//! A client holds an identity, fingerprints local files, and submits signed
//! records. Files never leave the client; only their digests do.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use rxproof_core::{CallerId, Digest, Keypair, Submission};
use rxproof_ledger::Ledger;
use tracing::{debug, info};

use crate::error::{ClientError, InputError};
use crate::producer::DigestProducer;
use crate::registry::{RecordReceipt, Registry};
use crate::upload::UploadPolicy;

/// Outcome of checking a file against the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub digest: Digest,
    pub recorded: bool,
}

/// Registry client bound to one identity.
pub struct Client<L: Ledger> {
    keypair: Keypair,
    registry: Arc<Registry<L>>,
    producer: DigestProducer,
    upload: UploadPolicy,
}

impl<L: Ledger> Client<L> {
    /// Create a client with the default upload policy.
    pub fn new(keypair: Keypair, registry: Arc<Registry<L>>, producer: DigestProducer) -> Self {
        let upload = UploadPolicy {
            max_bytes: producer.max_bytes(),
            ..UploadPolicy::default()
        };
        Self {
            keypair,
            registry,
            producer,
            upload,
        }
    }

    /// Replace the upload policy.
    pub fn with_upload_policy(mut self, upload: UploadPolicy) -> Self {
        self.upload = upload;
        self
    }

    pub fn caller_id(&self) -> CallerId {
        self.keypair.caller_id()
    }

    pub fn registry(&self) -> &Registry<L> {
        &self.registry
    }

    pub fn producer(&self) -> &DigestProducer {
        &self.producer
    }

    /// Read `path`, apply the upload policy, and hash it.
    pub fn fingerprint(&self, path: impl AsRef<Path>) -> Result<Digest, ClientError> {
        Ok(fingerprint_file(&self.producer, &self.upload, path)?)
    }

    /// Sign and submit a record for a digest computed elsewhere.
    pub async fn record_digest(&self, digest: Digest) -> Result<RecordReceipt, ClientError> {
        let submission = Submission::sign(&self.keypair, digest, now_millis());
        let receipt = self.registry.record(&submission).await?;
        info!(%digest, new = receipt.is_new(), "record submitted");
        Ok(receipt)
    }

    /// Fingerprint `path` and record its digest.
    pub async fn record_file(&self, path: impl AsRef<Path>) -> Result<RecordReceipt, ClientError> {
        let digest = self.fingerprint(path)?;
        self.record_digest(digest).await
    }

    /// Check whether `digest` is present.
    pub async fn verify_digest(&self, digest: Digest) -> Result<Verification, ClientError> {
        let recorded = self.registry.is_recorded(&digest).await?;
        Ok(Verification { digest, recorded })
    }

    /// Fingerprint `path` and check whether its digest is present.
    pub async fn verify_file(&self, path: impl AsRef<Path>) -> Result<Verification, ClientError> {
        let digest = self.fingerprint(path)?;
        self.verify_digest(digest).await
    }
}

/// Read `path`, apply `upload`, and hash it with `producer`.
///
/// The whole file is held in memory, bounded by the smaller of the two
/// size limits.
pub fn fingerprint_file(
    producer: &DigestProducer,
    upload: &UploadPolicy,
    path: impl AsRef<Path>,
) -> Result<Digest, InputError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let meta = file.metadata()?;
    if !meta.is_file() {
        return Err(InputError::NotAFile(path.display().to_string()));
    }

    let limit = upload.max_bytes.min(producer.max_bytes());
    if meta.len() > limit {
        return Err(InputError::TooLarge { limit });
    }

    let mut bytes = Vec::with_capacity(meta.len() as usize);
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;

    let mime = upload.check(&bytes)?;
    let digest = producer.digest_bytes(&bytes)?;
    debug!(path = %path.display(), mime, %digest, "fingerprinted upload");
    Ok(digest)
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{RecordStatus, RegistryConfig};
    use rxproof_core::DigestAlgorithm;
    use rxproof_ledger::MemoryLedger;
    use std::io::Write;

    fn client() -> Client<MemoryLedger> {
        let registry = Arc::new(Registry::new(MemoryLedger::new(), RegistryConfig::default()));
        Client::new(
            Keypair::from_seed(&[9; 32]),
            registry,
            DigestProducer::default(),
        )
    }

    fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file
    }

    #[tokio::test]
    async fn test_record_then_verify_file() {
        let client = client();
        let file = write_temp(b"%PDF-1.7\nRx: amoxicillin 500mg\n");

        let before = client.verify_file(file.path()).await.unwrap();
        assert!(!before.recorded);

        let receipt = client.record_file(file.path()).await.unwrap();
        assert_eq!(receipt.status, RecordStatus::Recorded);
        assert_eq!(receipt.digest, before.digest);
        assert_eq!(receipt.notification.recorded_by, client.caller_id());

        let after = client.verify_file(file.path()).await.unwrap();
        assert!(after.recorded);
    }

    #[tokio::test]
    async fn test_fingerprint_matches_producer() {
        let client = client();
        let file = write_temp(b"Rx: 1 tablet daily");
        assert_eq!(
            client.fingerprint(file.path()).unwrap(),
            Digest::compute(DigestAlgorithm::Sha256, b"Rx: 1 tablet daily")
        );
    }

    #[tokio::test]
    async fn test_rejected_upload_never_reaches_registry() {
        let client = client();
        let file = write_temp(&[0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00]);

        let err = client.record_file(file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::InvalidInput(InputError::UnsupportedType(_))
        ));
        assert_eq!(
            client.registry().ledger().notification_count().await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_oversize_upload_rejected() {
        let registry = Arc::new(Registry::new(MemoryLedger::new(), RegistryConfig::default()));
        let client = Client::new(
            Keypair::from_seed(&[9; 32]),
            registry,
            DigestProducer::new(DigestAlgorithm::Sha256, 8),
        );
        let file = write_temp(b"this text is longer than eight bytes");

        assert!(matches!(
            client.fingerprint(file.path()),
            Err(ClientError::InvalidInput(InputError::TooLarge { limit: 8 }))
        ));
    }
}
