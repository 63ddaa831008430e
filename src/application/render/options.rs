use std::path::PathBuf;

use crate::cache::CompileMode;
use crate::config::Settings;
use crate::domain::entity::BootstrapEntity;
use crate::domain::keys::CacheKey;
use crate::domain::providers::Provider;

use super::context::{RequestContext, ResponseHandle};

/// Engine-wide defaults fixed at construction time.
pub struct SetupOptions<M, A> {
    pub bootstrap: Option<BootstrapEntity<M, A>>,
    pub providers: Vec<Provider>,
    pub compiler_providers: Vec<Provider>,
    pub cache_key: Option<CacheKey>,
    pub compile_mode: CompileMode,
    /// Relative render paths and resource URLs resolve against this directory.
    pub document_root: Option<PathBuf>,
}

impl<M, A> Default for SetupOptions<M, A> {
    fn default() -> Self {
        Self {
            bootstrap: None,
            providers: Vec::new(),
            compiler_providers: Vec::new(),
            cache_key: None,
            compile_mode: CompileMode::default(),
            document_root: None,
        }
    }
}

impl<M, A> SetupOptions<M, A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed engine options from loaded settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            compile_mode: settings.cache.compile_mode,
            document_root: settings.documents.root.clone(),
            ..Self::default()
        }
    }

    pub fn with_bootstrap(mut self, bootstrap: BootstrapEntity<M, A>) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn with_compiler_providers(
        mut self,
        providers: impl IntoIterator<Item = Provider>,
    ) -> Self {
        self.compiler_providers.extend(providers);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<CacheKey>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    pub fn with_compile_mode(mut self, mode: CompileMode) -> Self {
        self.compile_mode = mode;
        self
    }

    pub fn with_document_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.document_root = Some(root.into());
        self
    }
}

/// Per-call render configuration. Every optional field overrides the
/// matching [`SetupOptions`] value for this call only.
pub struct RenderOptions<M, A> {
    pub request: RequestContext,
    pub response: Option<ResponseHandle>,
    pub bootstrap: Option<BootstrapEntity<M, A>>,
    pub providers: Vec<Provider>,
    /// When present (even empty), the call compiles with a freshly built
    /// compiler instead of the engine default.
    pub compiler_providers: Option<Vec<Provider>>,
    pub cache_key: Option<CacheKey>,
}

impl<M, A> RenderOptions<M, A> {
    pub fn new(request: RequestContext) -> Self {
        Self {
            request,
            response: None,
            bootstrap: None,
            providers: Vec::new(),
            compiler_providers: None,
            cache_key: None,
        }
    }

    pub fn with_response(mut self, response: ResponseHandle) -> Self {
        self.response = Some(response);
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: BootstrapEntity<M, A>) -> Self {
        self.bootstrap = Some(bootstrap);
        self
    }

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Provider>) -> Self {
        self.providers.extend(providers);
        self
    }

    pub fn with_compiler_providers(
        mut self,
        providers: impl IntoIterator<Item = Provider>,
    ) -> Self {
        self.compiler_providers
            .get_or_insert_with(Vec::new)
            .extend(providers);
        self
    }

    pub fn with_cache_key(mut self, key: impl Into<CacheKey>) -> Self {
        self.cache_key = Some(key.into());
        self
    }
}

impl<M, A> std::fmt::Debug for RenderOptions<M, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOptions")
            .field("request", &self.request)
            .field("response", &self.response.is_some())
            .field("bootstrap", &self.bootstrap)
            .field("providers", &self.providers.len())
            .field(
                "compiler_providers",
                &self.compiler_providers.as_ref().map(Vec::len),
            )
            .field("cache_key", &self.cache_key)
            .finish()
    }
}
