//! Signed record submissions.
//!
//! A [`Submission`] is the state-changing call a client sends to the
//! registry. The signature binds the caller's identity to the digest and the
//! submission time, so the caller recorded in the notification is the key
//! holder that actually submitted.

use crate::crypto::{CallerId, Keypair, Signature};
use crate::digest::Digest;
use crate::error::CoreError;

/// Domain separation tag for record signatures.
pub const RECORD_DOMAIN: &[u8] = b"rxproof/record/v1";

/// Build the exact bytes a submission signs.
///
/// Format: `RECORD_DOMAIN || caller (32) || digest (32) || submitted_at (i64 BE)`
pub fn signed_message(caller: &CallerId, digest: &Digest, submitted_at: i64) -> Vec<u8> {
    let mut buf = Vec::with_capacity(RECORD_DOMAIN.len() + 32 + 32 + 8);
    buf.extend_from_slice(RECORD_DOMAIN);
    buf.extend_from_slice(caller.as_bytes());
    buf.extend_from_slice(digest.as_bytes());
    buf.extend_from_slice(&submitted_at.to_be_bytes());
    buf
}

/// A signed request to record a digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Who is submitting.
    pub caller: CallerId,
    /// The digest to mark present.
    pub digest: Digest,
    /// Caller-claimed submission time (Unix ms).
    pub submitted_at: i64,
    /// Signature over [`signed_message`].
    pub signature: Signature,
}

impl Submission {
    /// Create and sign a submission.
    pub fn sign(keypair: &Keypair, digest: Digest, submitted_at: i64) -> Self {
        let caller = keypair.caller_id();
        let message = signed_message(&caller, &digest, submitted_at);
        Self {
            caller,
            digest,
            submitted_at,
            signature: keypair.sign(&message),
        }
    }

    /// The bytes this submission claims to have signed.
    pub fn message(&self) -> Vec<u8> {
        signed_message(&self.caller, &self.digest, self.submitted_at)
    }

    /// Check the signature against the claimed caller.
    pub fn verify(&self) -> Result<(), CoreError> {
        self.caller.verify(&self.message(), &self.signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_submission_verifies() {
        let kp = Keypair::from_seed(&[0x11; 32]);
        let sub = Submission::sign(&kp, Digest::sha256(b"rx-001"), 1_700_000_000_000);
        assert_eq!(sub.caller, kp.caller_id());
        sub.verify().unwrap();
    }

    #[test]
    fn test_tampered_digest_fails() {
        let kp = Keypair::generate();
        let mut sub = Submission::sign(&kp, Digest::sha256(b"rx-001"), 1000);
        sub.digest = Digest::sha256(b"rx-002");
        assert!(matches!(sub.verify(), Err(CoreError::InvalidSignature)));
    }

    #[test]
    fn test_tampered_time_fails() {
        let kp = Keypair::generate();
        let mut sub = Submission::sign(&kp, Digest::sha256(b"rx-001"), 1000);
        sub.submitted_at = 1001;
        assert!(sub.verify().is_err());
    }

    #[test]
    fn test_impersonation_fails() {
        let honest = Keypair::generate();
        let other = Keypair::generate();
        let mut sub = Submission::sign(&honest, Digest::sha256(b"rx-001"), 1000);
        sub.caller = other.caller_id();
        assert!(sub.verify().is_err());
    }

    #[test]
    fn test_message_layout() {
        let caller = CallerId::from_bytes([0x01; 32]);
        let digest = Digest::from_bytes([0x02; 32]);
        let msg = signed_message(&caller, &digest, 1);
        assert!(msg.starts_with(RECORD_DOMAIN));
        assert_eq!(msg.len(), RECORD_DOMAIN.len() + 72);
        assert_eq!(&msg[msg.len() - 8..], &1i64.to_be_bytes());
    }
}
