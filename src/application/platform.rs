//! Collaborator seams: the external compiler and renderer.
//!
//! The engine never inspects modules or artifacts. It hands them to a
//! [`Platform`] and caches what comes back.

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::providers::ProviderSet;

use super::error::EngineError;

/// Failure reported by a platform collaborator.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PlatformError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Compiles a module into an artifact the platform can render.
#[async_trait]
pub trait Compiler: Send + Sync {
    type Module: Send + Sync + 'static;
    type Artifact: Send + Sync + 'static;

    async fn compile(&self, module: &Self::Module) -> Result<Self::Artifact, PlatformError>;
}

/// The application framework the engine drives.
///
/// Implementations build compilers from a provider list (which always carries
/// a [`ResourceLoader`] under [`crate::domain::providers::RESOURCE_LOADER`])
/// and turn a compiled artifact plus request providers into HTML.
#[async_trait]
pub trait Platform: Send + Sync + 'static {
    type Module: Send + Sync + 'static;
    type Artifact: Send + Sync + 'static;
    type Compiler: Compiler<Module = Self::Module, Artifact = Self::Artifact> + 'static;

    fn create_compiler(&self, providers: &ProviderSet) -> Result<Self::Compiler, PlatformError>;

    async fn render(
        &self,
        artifact: &Self::Artifact,
        providers: &ProviderSet,
    ) -> Result<String, PlatformError>;
}

/// Resolves a logical resource identifier to its textual content.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    async fn get(&self, url: &str) -> Result<Arc<str>, EngineError>;
}
