//! Error types for handlers and extraction engines.

use thiserror::Error;

/// Failure kinds a handler (or the dispatcher) may raise.
///
/// Partial failures (one OCR page, the Word table phase) never surface here;
/// handlers recover from them locally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    UnsupportedContent(String),

    #[error("{0}")]
    EngineFailure(String),
}

impl ParseError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedContent(message.into())
    }

    #[cfg(test)]
    pub fn engine(message: impl Into<String>) -> Self {
        Self::EngineFailure(message.into())
    }
}

/// Failure raised by an extraction capability.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The bytes are not a valid instance of the format the engine reads.
    #[error("cannot decode {format}: {message}")]
    Decode { format: &'static str, message: String },

    /// An external tool ran but reported an error.
    #[error("{tool} failed: {message}")]
    Tool { tool: String, message: String },

    /// An external tool or library is not available on this host.
    #[error("{0} is not available")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn decode(format: &'static str, message: impl ToString) -> Self {
        Self::Decode {
            format,
            message: message.to_string(),
        }
    }

    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

impl From<EngineError> for ParseError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Decode { .. } => ParseError::UnsupportedContent(err.to_string()),
            other => ParseError::EngineFailure(other.to_string()),
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
