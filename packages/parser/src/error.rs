use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Failures while reading a document from its JSON form.
///
/// Everything below the JSON layer is total: malformed option metadata and
/// unexpected node shapes are normalised by the decoder instead of failing.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid document JSON at line {line}, column {column}: {message}")]
    Json {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("Document root must be an object or an array, found {found}")]
    InvalidRoot { found: String },
}

impl ParseError {
    pub fn invalid_root(found: impl Into<String>) -> Self {
        Self::InvalidRoot {
            found: found.into(),
        }
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json {
            line: err.line(),
            column: err.column(),
            message: err.to_string(),
        }
    }
}
