//! JSON interchange for template documents.

use serde_json::error::Category;
use serde_json::Value;
use std::path::Path;

use crate::block::Template;
use crate::error::{MailError, MailResult};
use crate::tree::{exceeds_depth, first_duplicate_id, MAX_TREE_DEPTH};

impl Template {
    /// Parse a template document.
    ///
    /// Input that is not JSON yields [`MailError::InvalidJson`]; JSON of the wrong shape
    /// yields [`MailError::InvalidShape`]. Documents deeper than the depth bound or with
    /// repeated block ids are rejected as well. There is no partial recovery.
    pub fn from_json(json: &str) -> MailResult<Template> {
        let value: Value = serde_json::from_str(json).map_err(json_error)?;
        let template: Template =
            serde_json::from_value(value).map_err(|e| MailError::InvalidShape(e.to_string()))?;
        validate_template(&template)?;
        Ok(template)
    }

    /// Read and parse a template document from disk
    pub fn load(path: impl AsRef<Path>) -> MailResult<Template> {
        let json = std::fs::read_to_string(path)?;
        Template::from_json(&json)
    }

    /// Compact interchange JSON
    pub fn to_json(&self) -> MailResult<String> {
        serde_json::to_string(self).map_err(|e| MailError::InvalidShape(e.to_string()))
    }

    /// Indented interchange JSON, as written by the export action
    pub fn to_json_pretty(&self) -> MailResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MailError::InvalidShape(e.to_string()))
    }
}

/// Nesting past the parser's recursion limit is well-formed JSON that is too deep to be a
/// template, so it reports as a depth violation rather than a syntax error.
fn json_error(err: serde_json::Error) -> MailError {
    if err.classify() == Category::Syntax && err.to_string().starts_with("recursion limit exceeded") {
        return MailError::MaxDepthExceeded {
            max_depth: MAX_TREE_DEPTH,
        };
    }
    MailError::InvalidJson {
        line: err.line(),
        column: err.column(),
        message: err.to_string(),
    }
}

/// Check the structural invariants of a decoded template: bounded depth and unique ids.
pub fn validate_template(template: &Template) -> MailResult<()> {
    if exceeds_depth(template) {
        return Err(MailError::MaxDepthExceeded {
            max_depth: MAX_TREE_DEPTH,
        });
    }
    if let Some(id) = first_duplicate_id(template) {
        return Err(MailError::DuplicateId { id: id.to_string() });
    }
    Ok(())
}
