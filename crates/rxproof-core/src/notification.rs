//! Notifications: the append-only audit trail of first-time records.
//!
//! The registry state itself only answers "is this digest present". Who
//! recorded it and when lives here, in the notification emitted at the
//! moment the digest went from absent to present.

use serde::{Deserialize, Serialize};

use crate::crypto::CallerId;
use crate::digest::Digest;

/// Audit record for a digest becoming present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Position in the notification log (1-based, gapless).
    pub seq: u64,
    /// The digest that was recorded.
    pub digest: Digest,
    /// Caller whose submission committed first.
    pub recorded_by: CallerId,
    /// Commit time assigned by the ledger (Unix ms).
    pub recorded_at: i64,
}

impl Notification {
    pub fn new(seq: u64, digest: Digest, recorded_by: CallerId, recorded_at: i64) -> Self {
        Self {
            seq,
            digest,
            recorded_by,
            recorded_at,
        }
    }
}
