//! Named template persistence.
//!
//! The editor only needs `save`, `list` and `delete`; hosts can plug in their own
//! [`TemplateStore`]. Two implementations ship with the crate: an in-memory store and a
//! JSON file keyed by the configured namespace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::block::Template;
use crate::config::StorageConfig;
use crate::document::validate_template;
use crate::error::{MailError, MailResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateCategory {
    Predefined,
    User,
}

/// A template document with the metadata shown in the template picker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedTemplate {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: TemplateCategory,
    pub template: Template,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SavedTemplate {
    /// A new user template with a fresh id and no timestamps yet
    pub fn new(name: impl Into<String>, template: Template) -> Self {
        SavedTemplate {
            id: generate_template_id(),
            name: name.into(),
            description: None,
            category: TemplateCategory::User,
            template,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// `template-<unix millis>-<9 base-36 chars>`
pub fn generate_template_id() -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut n = Uuid::new_v4().as_u128();
    let mut suffix = String::with_capacity(9);
    for _ in 0..9 {
        suffix.push(DIGITS[(n % 36) as usize] as char);
        n /= 36;
    }
    format!("template-{}-{}", Utc::now().timestamp_millis(), suffix)
}

pub trait TemplateStore {
    /// Insert or replace by id. Returns the stored entry with its timestamps.
    fn save(&mut self, template: SavedTemplate) -> MailResult<SavedTemplate>;

    fn list(&self) -> MailResult<Vec<SavedTemplate>>;

    /// Remove by id; removing an unknown id is not an error
    fn delete(&mut self, id: &str) -> MailResult<()>;

    fn get(&self, id: &str) -> MailResult<SavedTemplate> {
        self.list()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| MailError::TemplateNotFound { id: id.to_string() })
    }

    /// Case-insensitive name lookup, ignoring the entry `exclude_id` (the one being renamed)
    fn name_exists(&self, name: &str, exclude_id: Option<&str>) -> MailResult<bool> {
        let name = name.to_lowercase();
        Ok(self
            .list()?
            .iter()
            .any(|t| t.name.to_lowercase() == name && Some(t.id.as_str()) != exclude_id))
    }
}

/// Insert or replace `template` in `entries`, keeping an existing `createdAt`
fn upsert(entries: &mut Vec<SavedTemplate>, mut template: SavedTemplate) -> MailResult<SavedTemplate> {
    if template.name.trim().is_empty() {
        return Err(MailError::Storage("template name must not be empty".to_string()));
    }
    validate_template(&template.template)?;

    let now = Utc::now();
    template.updated_at = Some(now);
    match entries.iter_mut().find(|t| t.id == template.id) {
        Some(existing) => {
            template.created_at = existing.created_at.or(Some(now));
            *existing = template.clone();
        }
        None => {
            template.created_at = Some(now);
            entries.push(template.clone());
        }
    }
    Ok(template)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTemplateStore {
    entries: Vec<SavedTemplate>,
}

impl MemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemplateStore for MemoryTemplateStore {
    fn save(&mut self, template: SavedTemplate) -> MailResult<SavedTemplate> {
        upsert(&mut self.entries, template)
    }

    fn list(&self) -> MailResult<Vec<SavedTemplate>> {
        Ok(self.entries.clone())
    }

    fn delete(&mut self, id: &str) -> MailResult<()> {
        self.entries.retain(|t| t.id != id);
        Ok(())
    }
}

/// All templates in one JSON array file
#[derive(Debug, Clone)]
pub struct FileTemplateStore {
    path: PathBuf,
}

impl FileTemplateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileTemplateStore { path: path.into() }
    }

    pub fn from_config(config: &StorageConfig) -> MailResult<Self> {
        Ok(Self::new(config.file_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> MailResult<Vec<SavedTemplate>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let json = std::fs::read_to_string(&self.path)?;
        if json.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&json).map_err(|e| {
            MailError::Storage(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write(&self, entries: &[SavedTemplate]) -> MailResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| MailError::Storage(e.to_string()))?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), count = entries.len(), "template store written");
        Ok(())
    }
}

impl TemplateStore for FileTemplateStore {
    fn save(&mut self, template: SavedTemplate) -> MailResult<SavedTemplate> {
        let mut entries = self.read()?;
        let saved = upsert(&mut entries, template)?;
        self.write(&entries)?;
        Ok(saved)
    }

    fn list(&self) -> MailResult<Vec<SavedTemplate>> {
        self.read()
    }

    fn delete(&mut self, id: &str) -> MailResult<()> {
        let mut entries = self.read()?;
        let before = entries.len();
        entries.retain(|t| t.id != id);
        if entries.len() == before {
            tracing::debug!(id, "delete of unknown template ignored");
            return Ok(());
        }
        self.write(&entries)
    }
}
