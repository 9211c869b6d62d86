//! YAML configuration for the compiler and the file-backed template store.
//!
//! ```yaml
//! compiler:
//!   baseUrl: https://mail.example.com
//!   contentWidth: 600
//!   placeholderImage: https://mail.example.com/placeholder.png
//!   documentTitle: Weekly digest
//! storage:
//!   directory: ./templates
//!   namespace: mailblocks-templates
//! ```
//!
//! Every field is optional; an empty document yields the defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{MailError, MailResult};
use crate::html::{CompileOptions, DEFAULT_CONTENT_WIDTH, DEFAULT_DOCUMENT_TITLE};
use crate::sanitize::DEFAULT_BASE_URL;

/// Key the saved-template collection is stored under
pub const DEFAULT_STORAGE_NAMESPACE: &str = "mailblocks-templates";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MailblocksConfig {
    pub compiler: CompilerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompilerConfig {
    pub base_url: String,
    pub content_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder_image: Option<String>,
    pub document_title: String,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            content_width: DEFAULT_CONTENT_WIDTH,
            placeholder_image: None,
            document_title: DEFAULT_DOCUMENT_TITLE.to_string(),
        }
    }
}

impl CompilerConfig {
    /// Validate and convert into the options the compiler reads
    pub fn to_options(&self) -> MailResult<CompileOptions> {
        let base_url = Url::parse(&self.base_url)
            .map_err(|e| MailError::Config(format!("baseUrl '{}': {}", self.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(MailError::Config(format!(
                "baseUrl '{}' cannot be used as a base",
                self.base_url
            )));
        }
        if self.content_width == 0 {
            return Err(MailError::Config("contentWidth must be positive".to_string()));
        }
        Ok(CompileOptions {
            base_url,
            content_width: self.content_width,
            placeholder_image: self.placeholder_image.clone(),
            document_title: self.document_title.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StorageConfig {
    /// Directory holding the store file; the working directory when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            directory: None,
            namespace: DEFAULT_STORAGE_NAMESPACE.to_string(),
        }
    }
}

impl StorageConfig {
    /// Path of the JSON file backing the store: `<directory>/<namespace>.json`
    pub fn file_path(&self) -> MailResult<PathBuf> {
        let namespace = self.namespace.trim();
        if namespace.is_empty() || namespace.contains(&['/', '\\'][..]) || namespace.starts_with('.') {
            return Err(MailError::Config(format!(
                "invalid storage namespace '{}'",
                self.namespace
            )));
        }
        let directory = self.directory.clone().unwrap_or_else(|| PathBuf::from("."));
        Ok(directory.join(format!("{}.json", namespace)))
    }
}

impl MailblocksConfig {
    pub fn from_yaml_str(yaml: &str) -> MailResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn load(path: impl AsRef<Path>) -> MailResult<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }
}
