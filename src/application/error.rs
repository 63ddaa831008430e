use std::any::Any;
use std::error::Error as StdError;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::platform::PlatformError;

/// Diagnostic record attached to error responses as an extension. Carries
/// the full source chain, which the response body never shows.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    fn new(error: &EngineError, status: StatusCode) -> Self {
        let messages = std::iter::successors(Some(error as &dyn StdError), |inner: &&dyn StdError| (*inner).source())
            .map(ToString::to_string)
            .collect();
        Self {
            kind: error.kind(),
            status,
            messages,
        }
    }
}

/// Every failure a render call can end in. Delivered through the render
/// callback, never thrown past the pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no bootstrap entity supplied")]
    MissingBootstrap,
    #[error("failed to construct compiler: {0}")]
    CompilerSetup(#[source] PlatformError),
    #[error("compilation failed for {key}: {source}")]
    Compile { key: String, source: PlatformError },
    #[error("render failed: {0}")]
    Render(#[source] PlatformError),
    #[error("failed to read document {}: {source}", path.display())]
    DocumentRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("platform panicked: {message}")]
    Panicked { message: String },
    #[error("no tokio runtime available to run the render")]
    NoRuntime,
    #[error("render task dropped before completing")]
    Cancelled,
}

impl EngineError {
    pub fn compile(key: impl ToString, source: PlatformError) -> Self {
        Self::Compile {
            key: key.to_string(),
            source,
        }
    }

    pub fn document_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DocumentRead {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked { message }
    }

    /// Short machine-friendly label used in logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::MissingBootstrap => "configuration",
            EngineError::CompilerSetup(_) | EngineError::Compile { .. } => "compile",
            EngineError::Render(_) => "render",
            EngineError::DocumentRead { .. } => "document_read",
            EngineError::Panicked { .. } => "panic",
            EngineError::NoRuntime => "runtime",
            EngineError::Cancelled => "cancelled",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::DocumentRead { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn presentation_message(&self) -> &'static str {
        match self {
            EngineError::DocumentRead { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                "Document not found"
            }
            EngineError::MissingBootstrap => "Service misconfigured",
            _ => "Unexpected error occurred",
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.presentation_message();
        let report = ErrorReport::new(&self, status);
        let mut response = (status, message).into_response();
        response.extensions_mut().insert(report);
        response
    }
}
