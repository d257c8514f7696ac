//! # Configuration
//!
//! Writer settings are managed by [`confique`], layering environment variables
//! over an optional TOML file over compiled defaults.
//!
//! | Key | Default | Env | Description |
//! |-----|---------|-----|-------------|
//! | `chunk_size` | `8192` | `FATOMIC_CHUNK_SIZE` | Chunk size used by `transform_chunks` when none is given |
//! | `staging_suffix` | `.tmp` | `FATOMIC_STAGING_SUFFIX` | Suffix of staging file names |
//! | `preserve_permissions` | `true` | `FATOMIC_PRESERVE_PERMISSIONS` | Give the staging file the target's permissions |
//! | `keep_staging_on_failure` | `false` | `FATOMIC_KEEP_STAGING_ON_FAILURE` | Leave the staging file behind when a session unwinds |

use crate::error::{FatomicError, Result};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CHUNK_SIZE: usize = 8192;
pub const DEFAULT_STAGING_SUFFIX: &str = ".tmp";

/// Configuration for an [`crate::AtomicWriter`].
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WriterConfig {
    /// Size of the chunks read from the original file by `transform_chunks`.
    /// Bytes in binary mode, characters in text mode.
    #[config(default = 8192, env = "FATOMIC_CHUNK_SIZE")]
    pub chunk_size: usize,

    #[config(default = ".tmp", env = "FATOMIC_STAGING_SUFFIX")]
    pub staging_suffix: String,

    #[config(default = true, env = "FATOMIC_PRESERVE_PERMISSIONS")]
    pub preserve_permissions: bool,

    /// Keep the staging file of a session that was dropped without being
    /// finished, so it can be inspected.
    #[config(default = false, env = "FATOMIC_KEEP_STAGING_ON_FAILURE")]
    pub keep_staging_on_failure: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            staging_suffix: DEFAULT_STAGING_SUFFIX.to_string(),
            preserve_permissions: true,
            keep_staging_on_failure: false,
        }
    }
}

impl WriterConfig {
    /// Load from the environment, then `file` (if given and present), then defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = WriterConfig::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        let config = builder.load()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(FatomicError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.staging_suffix.contains(['/', '\\']) {
            return Err(FatomicError::Config(format!(
                "staging_suffix must not contain a path separator: {}",
                self.staging_suffix
            )));
        }
        Ok(())
    }

    /// Get the staging suffix, normalized to start with a dot.
    pub fn staging_suffix(&self) -> String {
        if self.staging_suffix.starts_with('.') {
            self.staging_suffix.clone()
        } else {
            format!(".{}", self.staging_suffix)
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_staging_suffix(mut self, suffix: &str) -> Self {
        self.staging_suffix = suffix.to_string();
        self
    }

    pub fn with_preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    pub fn with_keep_staging_on_failure(mut self, keep: bool) -> Self {
        self.keep_staging_on_failure = keep;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::{Mutex, MutexGuard};

    // Tests that call `load` read the process environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    struct EnvVar(&'static str);

    impl EnvVar {
        fn set(name: &'static str, value: &str) -> Self {
            std::env::set_var(name, value);
            EnvVar(name)
        }
    }

    impl Drop for EnvVar {
        fn drop(&mut self) {
            std::env::remove_var(self.0);
        }
    }

    #[test]
    fn test_default_config() {
        let config = WriterConfig::default();
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.staging_suffix(), ".tmp");
        assert!(config.preserve_permissions);
        assert!(!config.keep_staging_on_failure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_staging_suffix_normalization_without_dot() {
        let config = WriterConfig::default().with_staging_suffix("staging");
        assert_eq!(config.staging_suffix(), ".staging");
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = WriterConfig::default().with_chunk_size(0);
        assert!(matches!(config.validate(), Err(FatomicError::Config(_))));
    }

    #[test]
    fn test_suffix_with_separator_rejected() {
        let config = WriterConfig::default().with_staging_suffix("../x");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fatomic.toml");
        fs::write(&path, "chunk_size = 16\nkeep_staging_on_failure = true\n").unwrap();

        let config = WriterConfig::load(Some(&path)).unwrap();
        assert_eq!(config.chunk_size, 16);
        assert!(config.keep_staging_on_failure);
        assert_eq!(config.staging_suffix, ".tmp");
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fatomic.toml");
        fs::write(&path, "chunk_size = 0\n").unwrap();

        assert!(matches!(
            WriterConfig::load(Some(&path)),
            Err(FatomicError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides_file() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fatomic.toml");
        fs::write(&path, "chunk_size = 16\nstaging_suffix = \".part\"\n").unwrap();

        let _chunk = EnvVar::set("FATOMIC_CHUNK_SIZE", "64");
        let config = WriterConfig::load(Some(&path)).unwrap();

        assert_eq!(config.chunk_size, 64);
        assert_eq!(config.staging_suffix, ".part");
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let _lock = env_lock();
        let config = WriterConfig::load(None).unwrap();
        assert_eq!(config, WriterConfig::default());
    }
}
