use thiserror::Error;

/// Hard failures of the engine. Only malformed caller input ends up here;
/// extraction ambiguity and structural invalidity are reported as data.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("{what} must be a JSON object")]
    NotAnObject { what: &'static str },
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid field '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Prompt is too long: {len} characters (limit {max})")]
    PromptTooLong { len: usize, max: usize },
    #[error("Domain tables rejected: {0}")]
    InvalidTables(String),
    #[error("Domain tables could not be parsed: {0}")]
    Tables(#[from] serde_json::Error),
    #[error("Domain tables could not be read: {0}")]
    Io(#[from] std::io::Error),
}

impl SpecError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpecError>;
