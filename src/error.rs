use thiserror::Error;

pub type MailResult<T> = Result<T, MailError>;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Invalid JSON at line {line}, column {column}: {message}")]
    InvalidJson {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Invalid template document: {0}")]
    InvalidShape(String),

    #[error("Duplicate block id '{id}': block ids must be unique within the template")]
    DuplicateId { id: String },

    #[error("Maximum nesting depth ({max_depth}) exceeded")]
    MaxDepthExceeded { max_depth: usize },

    #[error("Invalid props for block type '{block_type}': {reason}")]
    InvalidProps { block_type: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Template storage error: {0}")]
    Storage(String),

    #[error("Template '{id}' not found")]
    TemplateNotFound { id: String },

    #[error("Unknown preset '{id}'")]
    UnknownPreset { id: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MailError {
    /// True for errors caused by the input document itself, as opposed to
    /// configuration, storage or I/O failures.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            MailError::InvalidJson { .. }
                | MailError::InvalidShape(_)
                | MailError::DuplicateId { .. }
                | MailError::MaxDepthExceeded { .. }
        )
    }
}

impl From<serde_yaml::Error> for MailError {
    fn from(err: serde_yaml::Error) -> Self {
        MailError::Config(err.to_string())
    }
}
