/// Error types for OOXML comment part operations.
use thiserror::Error;

/// Result type for OOXML operations.
pub type Result<T> = std::result::Result<T, OoxmlError>;

/// Error types for OOXML operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OoxmlError {
    /// Malformed or non-conforming XML in a comment part
    #[error("Schema parse error in part '{part}': {message}")]
    SchemaParse { part: String, message: String },

    /// A comment references an author index with no matching author
    #[error(
        "Author index {author_index} out of range for comment at '{cell_reference}' ({author_count} authors)"
    )]
    IndexOutOfRange {
        cell_reference: String,
        author_index: u32,
        author_count: usize,
    },

    /// Projection collected one or more entry errors
    #[error("Projection failed for {} comment(s)", .0.len())]
    Projection(Vec<OoxmlError>),

    /// XML generation error
    #[error("XML error: {0}")]
    Xml(String),
}

impl OoxmlError {
    /// Build a [`OoxmlError::SchemaParse`] for the named part.
    pub fn schema_parse(part: &str, message: impl Into<String>) -> Self {
        OoxmlError::SchemaParse {
            part: part.to_string(),
            message: message.into(),
        }
    }

    /// The cell reference of the offending entry, if this error concerns one.
    pub fn cell_reference(&self) -> Option<&str> {
        match self {
            OoxmlError::IndexOutOfRange { cell_reference, .. } => Some(cell_reference),
            _ => None,
        }
    }
}

impl From<std::fmt::Error> for OoxmlError {
    fn from(err: std::fmt::Error) -> Self {
        OoxmlError::Xml(format!("XML write error: {}", err))
    }
}
