//! The render pipeline: one call in, exactly one outcome out.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use metrics::{counter, histogram};
use tokio::runtime::Handle;
use tracing::{debug, instrument, warn};

use crate::application::error::EngineError;
use crate::application::platform::{Platform, ResourceLoader};
use crate::cache::{DocumentCache, DocumentSource, FactoryCache};
use crate::domain::keys::CacheKey;
use crate::domain::providers::{INITIAL_CONFIG, Provider, ProviderSet, REQUEST, RESPONSE};
use crate::infra::loader::{FileLoader, FsDocumentSource, resolve_path};

use super::compiler::CompilerContext;
use super::context::{PlatformConfig, RequestContext, ResponseHandle};
use super::options::{RenderOptions, SetupOptions};

const METRIC_RENDER: &str = "ssr_render_total";
const METRIC_RENDER_FAILURE: &str = "ssr_render_failure_total";
const METRIC_RENDER_MS: &str = "ssr_render_ms";

/// Options types specialised to a platform.
pub type PlatformSetup<P> = SetupOptions<<P as Platform>::Module, <P as Platform>::Artifact>;
pub type PlatformRenderOptions<P> =
    RenderOptions<<P as Platform>::Module, <P as Platform>::Artifact>;

/// Server-side render engine.
///
/// Owns the factory and document caches; clones share them. Construct one per
/// application and reuse it for every request.
pub struct Engine<P: Platform> {
    inner: Arc<EngineInner<P>>,
}

struct EngineInner<P: Platform> {
    platform: Arc<P>,
    setup: PlatformSetup<P>,
    compilers: CompilerContext<P>,
    factories: FactoryCache<P::Artifact>,
    documents: Arc<DocumentCache>,
}

impl<P: Platform> Clone for Engine<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Platform> Engine<P> {
    /// Build an engine reading documents from the file system.
    pub fn new(platform: P, setup: PlatformSetup<P>) -> Result<Self, EngineError> {
        Self::with_document_source(platform, setup, Arc::new(FsDocumentSource))
    }

    /// Build an engine reading documents through `source`.
    pub fn with_document_source(
        platform: P,
        setup: PlatformSetup<P>,
        source: Arc<dyn DocumentSource>,
    ) -> Result<Self, EngineError> {
        let platform = Arc::new(platform);
        let documents = Arc::new(DocumentCache::new(source));
        let loader: Arc<dyn ResourceLoader> = Arc::new(FileLoader::new(
            Arc::clone(&documents),
            setup.document_root.clone(),
        ));
        let compilers =
            CompilerContext::new(Arc::clone(&platform), loader, &setup.compiler_providers)?;
        let factories = FactoryCache::new(setup.compile_mode);

        debug!(
            compile_mode = %setup.compile_mode,
            has_bootstrap = setup.bootstrap.is_some(),
            "render engine ready"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                platform,
                setup,
                compilers,
                factories,
                documents,
            }),
        })
    }

    pub fn platform(&self) -> &P {
        &self.inner.platform
    }

    pub fn factory_cache(&self) -> &FactoryCache<P::Artifact> {
        &self.inner.factories
    }

    pub fn document_cache(&self) -> &DocumentCache {
        &self.inner.documents
    }

    /// Render `path` and hand the outcome to `callback`.
    ///
    /// The work runs on the current tokio runtime; `callback` is invoked
    /// exactly once with either the HTML or the error. Without a runtime the
    /// callback receives [`EngineError::NoRuntime`] immediately; a task the
    /// runtime drops before it finishes reports [`EngineError::Cancelled`].
    pub fn render<F>(
        &self,
        path: impl Into<PathBuf>,
        options: PlatformRenderOptions<P>,
        callback: F,
    ) where
        F: FnOnce(Result<String, EngineError>) + Send + 'static,
    {
        let delivery = Delivery::new(callback);
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                counter!(METRIC_RENDER_FAILURE, "kind" => EngineError::NoRuntime.kind())
                    .increment(1);
                warn!(error = %err, "render requested outside a tokio runtime");
                delivery.deliver(Err(EngineError::NoRuntime));
                return;
            }
        };

        let engine = self.clone();
        let path = path.into();
        runtime.spawn(async move {
            let outcome = engine.render_to_string(&path, options).await;
            delivery.deliver(outcome);
        });
    }

    /// Render `path` and return the outcome directly.
    pub async fn render_to_string(
        &self,
        path: impl AsRef<Path>,
        options: PlatformRenderOptions<P>,
    ) -> Result<String, EngineError> {
        let path = resolve_path(self.inner.setup.document_root.as_deref(), path.as_ref());
        let outcome = AssertUnwindSafe(self.inner.run(&path, options))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(EngineError::panicked(payload)));

        match &outcome {
            Ok(_) => counter!(METRIC_RENDER).increment(1),
            Err(error) => {
                counter!(METRIC_RENDER_FAILURE, "kind" => error.kind()).increment(1);
                warn!(path = %path.display(), kind = error.kind(), error = %error, "render failed");
            }
        }
        outcome
    }
}

impl<P: Platform> EngineInner<P> {
    #[instrument(skip_all, fields(path = %path.display(), url = %options.request.original_url()))]
    async fn run(&self, path: &Path, options: PlatformRenderOptions<P>) -> Result<String, EngineError> {
        let RenderOptions {
            request,
            response,
            bootstrap,
            providers,
            compiler_providers,
            cache_key,
        } = options;

        let bootstrap = bootstrap
            .or_else(|| self.setup.bootstrap.clone())
            .ok_or(EngineError::MissingBootstrap)?;
        let cache_key = cache_key
            .or_else(|| self.setup.cache_key.clone())
            .unwrap_or_else(|| CacheKey::Entity(bootstrap.identity()));

        let document = self.documents.get(path).await?;
        let providers =
            assemble_providers(&self.setup.providers, providers, request, response, document);

        let compilers = &self.compilers;
        let supplier = move || match compiler_providers.as_deref() {
            Some(extra) => compilers.with_extra(extra),
            None => Ok(compilers.default_compiler()),
        };
        let artifact = self
            .factories
            .resolve(&bootstrap, &cache_key, supplier)
            .await?;

        let started_at = Instant::now();
        let html = self
            .platform
            .render(&artifact, &providers)
            .await
            .map_err(EngineError::Render)?;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        histogram!(METRIC_RENDER_MS).record(elapsed_ms);
        debug!(cache_key = %cache_key, elapsed_ms, bytes = html.len(), "rendered document");

        Ok(html)
    }
}

/// Owns a render callback until an outcome is delivered. Dropping it
/// undelivered, as happens when the runtime discards the task, reports
/// [`EngineError::Cancelled`].
struct Delivery<F>
where
    F: FnOnce(Result<String, EngineError>),
{
    callback: Option<F>,
}

impl<F> Delivery<F>
where
    F: FnOnce(Result<String, EngineError>),
{
    fn new(callback: F) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    fn deliver(mut self, outcome: Result<String, EngineError>) {
        if let Some(callback) = self.callback.take() {
            callback(outcome);
        }
    }
}

impl<F> Drop for Delivery<F>
where
    F: FnOnce(Result<String, EngineError>),
{
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            counter!(METRIC_RENDER_FAILURE, "kind" => EngineError::Cancelled.kind())
                .increment(1);
            warn!("render task dropped before completing");
            callback(Err(EngineError::Cancelled));
        }
    }
}

/// Assemble render providers in fixed precedence: setup, call, request,
/// response, then the document configuration. Later entries win.
pub(crate) fn assemble_providers(
    setup: &[Provider],
    call: Vec<Provider>,
    request: RequestContext,
    response: Option<ResponseHandle>,
    document: Arc<str>,
) -> ProviderSet {
    let url = request.original_url().to_string();

    let mut providers = ProviderSet::new();
    providers.extend(setup.iter().cloned());
    providers.extend(call);
    providers.push(Provider::new(REQUEST, request));
    if let Some(response) = response {
        providers.push(Provider::new(RESPONSE, response));
    }
    providers.push(Provider::new(INITIAL_CONFIG, PlatformConfig { document, url }));
    providers
}
