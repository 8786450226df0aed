//! The Presence Registry: the single owner of recorded-digest state.
//!
//! Two operations matter. `record` is state-changing and idempotent;
//! `is_recorded` is a pure read. Every newly recorded digest produces exactly
//! one [`Notification`], which is persisted by the ledger and broadcast to
//! live subscribers. A repeated `record` is a successful no-op and emits
//! nothing.

use std::sync::Arc;

use rxproof_core::{AccessPolicy, Capability, Digest, Notification, Submission};
use rxproof_ledger::{CommitOutcome, Ledger};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::error::{RegistryError, Result};

/// Default size of the live notification channel.
pub const DEFAULT_NOTIFY_CAPACITY: usize = 256;

/// Upper bound on the live notification channel. Larger requests are clamped.
pub const MAX_NOTIFY_CAPACITY: usize = 65_536;

/// Configuration for the Registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Who may call what.
    pub policy: AccessPolicy,
    /// Buffered notifications per slow subscriber before it lags.
    pub notify_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            policy: AccessPolicy::public_registry(),
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
        }
    }
}

/// Whether a `record` call changed state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    /// The digest was absent and is now present.
    Recorded,
    /// The digest was already present. Nothing changed.
    AlreadyRecorded,
}

/// Result of a successful `record` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReceipt {
    pub digest: Digest,
    pub status: RecordStatus,
    /// The notification that first made this digest present.
    pub notification: Notification,
}

impl RecordReceipt {
    pub fn is_new(&self) -> bool {
        self.status == RecordStatus::Recorded
    }
}

/// The registry.
pub struct Registry<L: Ledger> {
    ledger: Arc<L>,
    policy: AccessPolicy,
    notify: broadcast::Sender<Notification>,
    clock: fn() -> i64,
}

impl<L: Ledger> Registry<L> {
    /// Create a registry over `ledger`.
    pub fn new(ledger: L, config: RegistryConfig) -> Self {
        Self::with_clock(ledger, config, now_millis)
    }

    /// Create a registry with a fixed time source.
    pub fn with_clock(ledger: L, config: RegistryConfig, clock: fn() -> i64) -> Self {
        let (notify, _) =
            broadcast::channel(config.notify_capacity.clamp(1, MAX_NOTIFY_CAPACITY));
        Self {
            ledger: Arc::new(ledger),
            policy: config.policy,
            notify,
            clock,
        }
    }

    /// Record the digest carried by `submission`.
    ///
    /// Either the digest becomes present and one notification is appended,
    /// or the call fails with [`RegistryError::SubmissionRejected`] and the
    /// registry is unchanged.
    pub async fn record(&self, submission: &Submission) -> Result<RecordReceipt> {
        if !self.policy.permits(Some(&submission.caller), Capability::Record) {
            warn!(caller = %submission.caller, "record not permitted");
            return Err(RegistryError::not_permitted(
                Some(&submission.caller),
                Capability::Record,
            ));
        }

        if let Err(e) = submission.verify() {
            warn!(caller = %submission.caller, digest = %submission.digest, "bad submission signature");
            return Err(RegistryError::SubmissionRejected {
                reason: e.to_string(),
            });
        }

        let outcome = self
            .ledger
            .commit_record(&submission.digest, &submission.caller, (self.clock)())
            .await
            .map_err(|e| {
                warn!(digest = %submission.digest, error = %e, "ledger commit failed");
                RegistryError::SubmissionRejected {
                    reason: e.to_string(),
                }
            })?;

        let receipt = match outcome {
            CommitOutcome::Committed(notification) => {
                info!(
                    seq = notification.seq,
                    digest = %notification.digest,
                    caller = %notification.recorded_by,
                    "digest recorded"
                );
                // No receivers is fine; the ledger already holds the log.
                let _ = self.notify.send(notification.clone());
                RecordReceipt {
                    digest: submission.digest,
                    status: RecordStatus::Recorded,
                    notification,
                }
            }
            CommitOutcome::AlreadyPresent { first } => {
                debug!(digest = %submission.digest, first_seq = first.seq, "digest already recorded");
                RecordReceipt {
                    digest: submission.digest,
                    status: RecordStatus::AlreadyRecorded,
                    notification: first,
                }
            }
        };

        Ok(receipt)
    }

    /// Whether `digest` has ever been recorded.
    pub async fn is_recorded(&self, digest: &Digest) -> Result<bool> {
        if !self.policy.permits(None, Capability::IsRecorded) {
            return Err(RegistryError::not_permitted(None, Capability::IsRecorded));
        }
        let present = self.ledger.is_present(digest).await?;
        debug!(%digest, present, "presence query");
        Ok(present)
    }

    /// Subscribe to notifications committed from now on.
    ///
    /// Past notifications are read through [`Ledger::notifications_since`].
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify.subscribe()
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
