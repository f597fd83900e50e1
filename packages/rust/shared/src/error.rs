//! Error types for edugen.
//!
//! Library crates use [`EdugenError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

use crate::types::PipelineStage;

/// Top-level error type for all edugen operations.
#[derive(Debug, thiserror::Error)]
pub enum EdugenError {
    /// Configuration loading or validation error (including missing secrets).
    #[error("config error: {message}")]
    Config { message: String },

    /// Network, auth, rate-limit or HTTP status error from an external API.
    #[error("{service} API error: {message}")]
    ExternalApi {
        service: String,
        message: String,
        /// Whether a retry could plausibly succeed (timeouts, 429, 5xx).
        retryable: bool,
    },

    /// Response arrived but does not match the expected structure.
    #[error("malformed response from {service}: {message}")]
    MalformedResponse { service: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A persisted file could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Invalid input or content (empty request fields, empty text, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A pipeline run aborted at `stage`.
    #[error("pipeline failed at {stage} stage: {source}")]
    Stage {
        stage: PipelineStage,
        source: Box<EdugenError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EdugenError>;

impl EdugenError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a non-retryable external API error.
    pub fn api(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExternalApi {
            service: service.into(),
            message: msg.into(),
            retryable: false,
        }
    }

    /// Create an external API error that a retry may resolve.
    pub fn transient(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ExternalApi {
            service: service.into(),
            message: msg.into(),
            retryable: true,
        }
    }

    /// Classify a non-success HTTP status: 408, 429 and 5xx are retryable.
    pub fn http_status(service: impl Into<String>, status: u16, msg: impl Into<String>) -> Self {
        if matches!(status, 408 | 429 | 500..=599) {
            Self::transient(service, msg)
        } else {
            Self::api(service, msg)
        }
    }

    /// Create a malformed-response error.
    pub fn malformed(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::MalformedResponse {
            service: service.into(),
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attribute this error to a pipeline stage.
    pub fn at_stage(self, stage: PipelineStage) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// True for API failures worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalApi { retryable: true, .. })
    }

    /// The stage a pipeline error was attributed to, if any.
    pub fn stage(&self) -> Option<PipelineStage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Strip any stage wrapper and return the underlying error.
    pub fn root(&self) -> &EdugenError {
        match self {
            Self::Stage { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = EdugenError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = EdugenError::api("groq", "HTTP 401 Unauthorized");
        assert_eq!(err.to_string(), "groq API error: HTTP 401 Unauthorized");
    }

    #[test]
    fn retryable_only_for_transient_api_errors() {
        assert!(EdugenError::transient("gemini", "HTTP 503").is_retryable());
        assert!(!EdugenError::api("gemini", "HTTP 400").is_retryable());
        assert!(!EdugenError::malformed("gemini", "not json").is_retryable());
    }

    #[test]
    fn http_status_classification() {
        for status in [408, 429, 500, 503] {
            assert!(EdugenError::http_status("search", status, "x").is_retryable(), "{status}");
        }
        for status in [400, 401, 403, 404] {
            assert!(!EdugenError::http_status("search", status, "x").is_retryable(), "{status}");
        }
    }

    #[test]
    fn stage_wrapper_names_stage_and_keeps_root() {
        let err = EdugenError::malformed("gemini", "expected value at line 1")
            .at_stage(PipelineStage::Simplified);
        assert_eq!(err.stage(), Some(PipelineStage::Simplified));
        assert!(err.to_string().contains("simplification"));
        assert!(matches!(err.root(), EdugenError::MalformedResponse { .. }));
    }
}
