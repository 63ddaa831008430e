use std::sync::Arc;

use tracing::debug;

use crate::application::error::EngineError;
use crate::application::platform::{Platform, ResourceLoader};
use crate::domain::providers::{Provider, ProviderSet, RESOURCE_LOADER};

/// Owns the engine's default compiler and builds per-call compilers.
pub struct CompilerContext<P: Platform> {
    platform: Arc<P>,
    providers: ProviderSet,
    default: Arc<P::Compiler>,
}

impl<P: Platform> CompilerContext<P> {
    /// Build the default compiler from the resource loader plus the
    /// setup-level compiler providers.
    pub fn new(
        platform: Arc<P>,
        loader: Arc<dyn ResourceLoader>,
        setup_providers: &[Provider],
    ) -> Result<Self, EngineError> {
        let mut providers = ProviderSet::new();
        providers.push(Provider::new(RESOURCE_LOADER, loader));
        providers.extend(setup_providers.iter().cloned());

        let default = platform
            .create_compiler(&providers)
            .map_err(EngineError::CompilerSetup)?;

        Ok(Self {
            platform,
            providers,
            default: Arc::new(default),
        })
    }

    pub fn default_compiler(&self) -> Arc<P::Compiler> {
        Arc::clone(&self.default)
    }

    /// Provider list the default compiler was built from.
    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Build a fresh compiler from the default providers followed by `extra`.
    /// Nothing is cached; every call pays for construction.
    pub fn with_extra(&self, extra: &[Provider]) -> Result<Arc<P::Compiler>, EngineError> {
        let mut providers = self.providers.clone();
        providers.extend(extra.iter().cloned());
        debug!(
            extra = extra.len(),
            total = providers.len(),
            "building call-specific compiler"
        );

        self.platform
            .create_compiler(&providers)
            .map(Arc::new)
            .map_err(EngineError::CompilerSetup)
    }
}
