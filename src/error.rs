//! Structured error types for report generation.
//!
//! Three variants cover the real error sources: looking up configuration
//! (rows, descriptor, settings), decoding serialized-array values, and
//! drawing/serializing the PDF. None of them is retried.

use thiserror::Error;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Config rows, field metadata or report settings could not be read.
    #[error("Configuration lookup failed: {message}")]
    ConfigurationLookup {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// A value flagged as a serialized array is not a valid record list.
    #[error("Failed to decode serialized value of '{path}': {message}")]
    Decoding { path: String, message: String },

    /// A font, image or page could not be drawn or written.
    #[error("Render error: {0}")]
    Rendering(String),
}

pub type Result<T, E = ReportError> = std::result::Result<T, E>;

impl ReportError {
    pub fn lookup(message: impl Into<String>) -> Self {
        ReportError::ConfigurationLookup {
            message: message.into(),
            source: None,
        }
    }

    pub fn lookup_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ReportError::ConfigurationLookup {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn decoding(path: impl Into<String>, message: impl Into<String>) -> Self {
        ReportError::Decoding {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn rendering(message: impl Into<String>) -> Self {
        ReportError::Rendering(message.into())
    }
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::lookup_with(e.to_string(), e)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => "check for trailing commas or missing quotes",
            serde_json::error::Category::Data => "the JSON is valid but has the wrong shape",
            serde_json::error::Category::Eof => "unexpected end of input, is the file truncated?",
            serde_json::error::Category::Io => "",
        };
        let message = if hint.is_empty() {
            e.to_string()
        } else {
            format!("{} ({})", e, hint)
        };
        ReportError::lookup_with(message, e)
    }
}

impl From<quick_xml::Error> for ReportError {
    fn from(e: quick_xml::Error) -> Self {
        ReportError::lookup_with(format!("malformed field descriptor: {}", e), e)
    }
}
