//! Deployment configuration.
//!
//! Read from a TOML file, then overridden from `RXPROOF_*` environment
//! variables. Every field has a default, so an empty file is valid.

use std::path::{Path, PathBuf};

use rxproof_core::DigestAlgorithm;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::producer::DigestProducer;
use crate::registry::{RegistryConfig, DEFAULT_NOTIFY_CAPACITY, MAX_NOTIFY_CAPACITY};
use crate::upload::UploadPolicy;

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {var}: {value}")]
    InvalidOverride { var: &'static str, value: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RxConfig {
    /// SQLite ledger file.
    pub ledger_path: PathBuf,
    pub digest: DigestSection,
    pub upload: UploadPolicy,
    pub registry: RegistrySection,
    pub identity: IdentitySection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestSection {
    /// Fixed per deployment. Changing it orphans every existing record.
    pub algorithm: DigestAlgorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySection {
    pub notify_capacity: usize,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySection {
    /// Hex-encoded Ed25519 seed.
    pub key_file: PathBuf,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            key_file: PathBuf::from("rxproof.key"),
        }
    }
}

impl Default for RxConfig {
    fn default() -> Self {
        Self {
            ledger_path: PathBuf::from("rxproof.db"),
            digest: DigestSection::default(),
            upload: UploadPolicy::default(),
            registry: RegistrySection::default(),
            identity: IdentitySection::default(),
        }
    }
}

impl RxConfig {
    /// Load from `path` if given, else defaults, then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML file without consulting the environment.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&text)?)
    }

    /// Apply `RXPROOF_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable source.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("RXPROOF_LEDGER_PATH") {
            self.ledger_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("RXPROOF_MAX_BYTES") {
            self.upload.max_bytes = v.parse().map_err(|_| ConfigError::InvalidOverride {
                var: "RXPROOF_MAX_BYTES",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("RXPROOF_ALGORITHM") {
            self.digest.algorithm = v.parse().map_err(|_| ConfigError::InvalidOverride {
                var: "RXPROOF_ALGORITHM",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("RXPROOF_KEY_FILE") {
            self.identity.key_file = PathBuf::from(v);
        }
        Ok(())
    }

    /// Producer matching this deployment.
    pub fn producer(&self) -> DigestProducer {
        DigestProducer::new(self.digest.algorithm, self.upload.max_bytes)
    }

    /// Registry settings with the public access policy.
    ///
    /// `notify_capacity` is clamped to `1..=MAX_NOTIFY_CAPACITY`.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            notify_capacity: self
                .registry
                .notify_capacity
                .clamp(1, MAX_NOTIFY_CAPACITY),
            ..RegistryConfig::default()
        }
    }
}
