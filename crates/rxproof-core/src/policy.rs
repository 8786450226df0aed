//! Access policy for registry operations.
//!
//! The policy is an explicit capability set: each rule names a principal
//! and what it may call. The public registry grants `Anyone` both
//! operations, which makes a record an existence proof and never an
//! authorship proof.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::crypto::CallerId;

/// A registry operation that can be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Mark a digest present.
    Record,
    /// Test a digest for presence.
    IsRecorded,
}

/// Who a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Principal {
    /// Every caller, identified or not.
    Anyone,
    /// One specific caller.
    Caller(CallerId),
}

impl Principal {
    fn matches(&self, caller: Option<&CallerId>) -> bool {
        match self {
            Principal::Anyone => true,
            Principal::Caller(id) => caller == Some(id),
        }
    }
}

/// A single grant: principal plus the capabilities it holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub principal: Principal,
    pub capabilities: BTreeSet<Capability>,
}

/// Capability set consulted before every registry call.
///
/// Rules only add capabilities; there is no deny rule.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccessPolicy {
    rules: Vec<Rule>,
}

impl AccessPolicy {
    /// An empty policy that permits nothing.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// `Anyone: {Record, IsRecorded}`.
    pub fn public_registry() -> Self {
        Self::deny_all().grant(Principal::Anyone, [Capability::Record, Capability::IsRecorded])
    }

    /// Add a rule.
    pub fn grant(
        mut self,
        principal: Principal,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.rules.push(Rule {
            principal,
            capabilities: capabilities.into_iter().collect(),
        });
        self
    }

    /// Whether `caller` (or an anonymous reader, for `None`) may use `capability`.
    pub fn permits(&self, caller: Option<&CallerId>, capability: Capability) -> bool {
        self.rules
            .iter()
            .any(|r| r.principal.matches(caller) && r.capabilities.contains(&capability))
    }

    /// The configured rules.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}
