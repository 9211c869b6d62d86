//! # Mailblocks
//!
//! Document model and HTML compiler for block-based email templates.
//!
//! ## Features
//! - Typed block tree (text, image, button, columns, divider, spacer, header, footer,
//!   social links) with the JSON interchange format used by the editor
//! - Pure, depth-bounded tree operations: insert, move, reparent, patch, delete
//! - Editor state container with selection, drag-and-drop resolution and change listeners
//! - Deterministic compiler to table-based, email-client-safe HTML
//! - URL allow-listing and escaping shared by preview and export
//! - Saved-template stores and predefined templates
//!
//! ## Example
//! ```ignore
//! use mailblocks::{compile, parse_template};
//!
//! let json = r#"{
//!   "version": "1.0",
//!   "root": {
//!     "backgroundColor": "#ffffff",
//!     "fontFamily": "sans-serif",
//!     "children": [ { "id": "t1", "type": "text", "props": { "text": "Hi" } } ]
//!   }
//! }"#;
//!
//! let template = parse_template(json).expect("valid template");
//! let html = compile(&template);
//! ```

pub mod block;
pub mod config;
pub mod document;
pub mod editor;
pub mod error;
pub mod html;
pub mod presets;
pub mod sanitize;
pub mod storage;
pub mod tree;

// --- Core types ---
pub use block::{Block, BlockProps, BlockType, Length, Root, Template};
pub use config::MailblocksConfig;
pub use editor::{DragSource, DropTarget, EditorState};
pub use error::{MailError, MailResult};
pub use html::{compile, compile_with, CompileOptions};

// --- Storage ---
pub use storage::{
    FileTemplateStore, MemoryTemplateStore, SavedTemplate, TemplateCategory, TemplateStore,
};

/// Parse and validate a template document from JSON.
pub fn parse_template(json: &str) -> MailResult<Template> {
    Template::from_json(json)
}

/// Parse a template document and compile it with the given configuration.
pub fn compile_json(json: &str, config: &MailblocksConfig) -> MailResult<String> {
    let template = Template::from_json(json)?;
    let options = config.compiler.to_options()?;
    Ok(compile_with(&template, &options))
}
