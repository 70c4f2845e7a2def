//! Host configuration from the environment.

use std::path::PathBuf;

use crate::state::SnapshotError;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("invalid PORT `{0}`")]
    InvalidPort(String),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("failed to bind: {0}")]
    Bind(std::io::Error),
    #[error("server failed: {0}")]
    Serve(std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    pub port: u16,
    /// `CONFIGHOST_DATA`: JSON snapshot of the global table.
    pub data_path: Option<PathBuf>,
}

impl HostConfig {
    /// # Errors
    ///
    /// Returns [`HostError::InvalidPort`] when `PORT` is not a port number.
    pub fn from_env() -> Result<Self, HostError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HostError> {
        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| HostError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        let data_path = lookup("CONFIGHOST_DATA").filter(|path| !path.trim().is_empty()).map(PathBuf::from);
        Ok(Self { port, data_path })
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
