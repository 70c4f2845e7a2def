//! Where the option schema comes from: a file, an http(s) URL, or a host key.

use std::path::PathBuf;

use configform::{FormSchema, RemoteStore};
use tracing::debug;

use crate::CliError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    File(PathBuf),
    Url(String),
    /// JSON text stored under a global on the host.
    Key(String),
}

impl SchemaSource {
    /// Pick the source from `--schema` / `--schema-key`. The key wins when both are set.
    pub fn resolve(schema: Option<&str>, key: Option<&str>) -> Result<Self, CliError> {
        if let Some(key) = key.filter(|key| !key.trim().is_empty()) {
            return Ok(Self::Key(key.trim().to_owned()));
        }
        let Some(location) = schema.map(str::trim).filter(|location| !location.is_empty()) else {
            return Err(CliError::MissingSchema);
        };
        if location.starts_with("http://") || location.starts_with("https://") {
            Ok(Self::Url(location.to_owned()))
        } else {
            Ok(Self::File(PathBuf::from(location)))
        }
    }

    pub fn needs_host(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    /// Fetch and parse the schema. `store` is only consulted for [`SchemaSource::Key`].
    pub async fn load<S>(&self, store: Option<&S>) -> Result<FormSchema, CliError>
    where
        S: RemoteStore + ?Sized,
    {
        let text = match self {
            Self::File(path) => tokio::fs::read_to_string(path)
                .await
                .map_err(|source| CliError::SchemaFile { path: path.clone(), source })?,
            Self::Url(url) => fetch_url(url).await?,
            Self::Key(key) => {
                let store = store.ok_or(CliError::HostRequired("--schema-key"))?;
                store.get_value(key).await?.ok_or_else(|| CliError::SchemaKeyMissing(key.clone()))?
            }
        };
        debug!(source = ?self, bytes = text.len(), "schema fetched");
        Ok(FormSchema::from_json(&text)?)
    }
}

async fn fetch_url(url: &str) -> Result<String, CliError> {
    let response = reqwest::get(url).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError {
            syscall: format!("HTTP {}", status.as_u16()),
            message: format!("schema fetch from {url} failed"),
        });
    }
    Ok(response.text().await?)
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
