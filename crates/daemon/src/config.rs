// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment-sourced configuration (§6 "reads `QUAERO_DATA_DIR`,
//! `QUAERO_CONCURRENCY` from the environment").

use std::env::VarError;
use std::path::PathBuf;

const DATA_DIR_VAR: &str = "QUAERO_DATA_DIR";
const CONCURRENCY_VAR: &str = "QUAERO_CONCURRENCY";
const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{DATA_DIR_VAR} is not set")]
    MissingDataDir,
    #[error("{CONCURRENCY_VAR} must be a positive integer, got {0:?}")]
    InvalidConcurrency(String),
}

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub data_dir: PathBuf,
    pub concurrency: usize,
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = std::env::var(DATA_DIR_VAR).map_err(|_| ConfigError::MissingDataDir)?.into();
        let concurrency = match std::env::var(CONCURRENCY_VAR) {
            Ok(raw) => raw.parse::<usize>().map_err(|_| ConfigError::InvalidConcurrency(raw))?,
            Err(VarError::NotPresent) => DEFAULT_CONCURRENCY,
            Err(VarError::NotUnicode(raw)) => return Err(ConfigError::InvalidConcurrency(raw.to_string_lossy().into_owned())),
        };
        Ok(Self { data_dir, concurrency })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_concurrency_when_unset() {
        std::env::set_var(DATA_DIR_VAR, "/tmp/quaero-test-defaults");
        std::env::remove_var(CONCURRENCY_VAR);
        let config = DaemonConfig::from_env().unwrap();
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        std::env::remove_var(DATA_DIR_VAR);
    }

    #[test]
    #[serial]
    fn rejects_missing_data_dir() {
        std::env::remove_var(DATA_DIR_VAR);
        assert!(matches!(DaemonConfig::from_env(), Err(ConfigError::MissingDataDir)));
    }

    #[test]
    #[serial]
    fn rejects_non_numeric_concurrency() {
        std::env::set_var(DATA_DIR_VAR, "/tmp/quaero-test-bad-concurrency");
        std::env::set_var(CONCURRENCY_VAR, "not-a-number");
        assert!(matches!(DaemonConfig::from_env(), Err(ConfigError::InvalidConcurrency(_))));
        std::env::remove_var(DATA_DIR_VAR);
        std::env::remove_var(CONCURRENCY_VAR);
    }
}
