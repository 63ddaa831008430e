#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use ssr_engine::{
    BootstrapEntity, Compiler, DocumentSource, Engine, INITIAL_CONFIG, Platform, PlatformConfig,
    PlatformError, PlatformSetup, ProviderSet, REQUEST, RESOURCE_LOADER, RESPONSE, RequestContext,
    ResourceLoader, ResponseHandle, Token,
};
use tokio::sync::Semaphore;

pub const INDEX: &str = "index.html";
pub const INDEX_HTML: &str = "<html><body><app-root></app-root></body></html>";
pub const TEMPLATE: &str = "app.component.html";

/// Optional greeting rendered into the page.
pub const GREETING: Token = Token::new("GREETING");
/// Render fails when this token is present.
pub const FAIL_RENDER: Token = Token::new("FAIL_RENDER");
/// Status code the renderer writes through the response handle.
pub const STATUS: Token = Token::new("STATUS");
/// `create_compiler` rejects provider lists carrying this token.
pub const FAIL_COMPILER: Token = Token::new("FAIL_COMPILER");
/// Compiler-level tag copied into every artifact the compiler builds.
pub const COMPILER_TAG: Token = Token::new("COMPILER_TAG");

#[derive(Debug, Clone, Default)]
pub struct StubModule {
    pub name: String,
    pub template_url: Option<String>,
    pub fail_compile: bool,
    pub panic_on_render: bool,
}

impl StubModule {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_template(mut self, url: &str) -> Self {
        self.template_url = Some(url.to_string());
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_compile = true;
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_render = true;
        self
    }
}

#[derive(Debug)]
pub struct StubArtifact {
    pub name: String,
    pub serial: usize,
    pub tag: String,
    pub template: Option<Arc<str>>,
    pub panic_on_render: bool,
}

impl StubArtifact {
    pub fn precompiled(name: &str) -> Self {
        Self {
            name: name.to_string(),
            serial: 0,
            tag: "precompiled".to_string(),
            template: None,
            panic_on_render: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct Stats {
    pub compilers_created: AtomicUsize,
    pub compile_started: AtomicUsize,
    pub compiles: AtomicUsize,
    pub renders: AtomicUsize,
}

impl Stats {
    pub fn compiles(&self) -> usize {
        self.compiles.load(Ordering::SeqCst)
    }

    pub fn compilers_created(&self) -> usize {
        self.compilers_created.load(Ordering::SeqCst)
    }

    pub fn compile_started(&self) -> usize {
        self.compile_started.load(Ordering::SeqCst)
    }
}

pub struct StubCompiler {
    loader: Arc<dyn ResourceLoader>,
    tag: String,
    stats: Arc<Stats>,
    gate: Option<Arc<Semaphore>>,
}

#[async_trait]
impl Compiler for StubCompiler {
    type Module = StubModule;
    type Artifact = StubArtifact;

    async fn compile(&self, module: &StubModule) -> Result<StubArtifact, PlatformError> {
        let serial = self.stats.compile_started.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(gate) = &self.gate {
            let _permit = gate
                .acquire()
                .await
                .map_err(|err| PlatformError::with_source("compile gate closed", err))?;
        }
        if module.fail_compile {
            return Err(PlatformError::new(format!("cannot compile {}", module.name)));
        }

        let template = match &module.template_url {
            Some(url) => Some(
                self.loader
                    .get(url)
                    .await
                    .map_err(|err| PlatformError::with_source("template unavailable", err))?,
            ),
            None => None,
        };

        self.stats.compiles.fetch_add(1, Ordering::SeqCst);
        Ok(StubArtifact {
            name: module.name.clone(),
            serial,
            tag: self.tag.clone(),
            template,
            panic_on_render: module.panic_on_render,
        })
    }
}

#[derive(Clone, Default)]
pub struct StubPlatform {
    pub stats: Arc<Stats>,
    pub gate: Option<Arc<Semaphore>>,
}

impl StubPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every compile blocks until the returned semaphore gains permits.
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let platform = Self {
            stats: Arc::default(),
            gate: Some(Arc::clone(&gate)),
        };
        (platform, gate)
    }
}

#[async_trait]
impl Platform for StubPlatform {
    type Module = StubModule;
    type Artifact = StubArtifact;
    type Compiler = StubCompiler;

    fn create_compiler(&self, providers: &ProviderSet) -> Result<StubCompiler, PlatformError> {
        if providers.contains(FAIL_COMPILER) {
            return Err(PlatformError::new("compiler configuration rejected"));
        }
        let loader = providers
            .get::<Arc<dyn ResourceLoader>>(RESOURCE_LOADER)
            .cloned()
            .ok_or_else(|| PlatformError::new("resource loader missing"))?;
        let tag = providers
            .get::<&'static str>(COMPILER_TAG)
            .map(|tag| tag.to_string())
            .unwrap_or_else(|| "default".to_string());
        self.stats.compilers_created.fetch_add(1, Ordering::SeqCst);

        Ok(StubCompiler {
            loader,
            tag,
            stats: Arc::clone(&self.stats),
            gate: self.gate.clone(),
        })
    }

    async fn render(
        &self,
        artifact: &StubArtifact,
        providers: &ProviderSet,
    ) -> Result<String, PlatformError> {
        self.stats.renders.fetch_add(1, Ordering::SeqCst);
        if artifact.panic_on_render {
            panic!("renderer exploded on {}", artifact.name);
        }
        if providers.contains(FAIL_RENDER) {
            return Err(PlatformError::new("renderer rejected the page"));
        }

        let config = providers
            .get::<PlatformConfig>(INITIAL_CONFIG)
            .ok_or_else(|| PlatformError::new("document configuration missing"))?;
        let request = providers
            .get::<RequestContext>(REQUEST)
            .ok_or_else(|| PlatformError::new("request missing"))?;
        let greeting = providers
            .get::<&'static str>(GREETING)
            .copied()
            .unwrap_or("none");

        if let (Some(response), Some(status)) = (
            providers.get::<ResponseHandle>(RESPONSE),
            providers.get::<StatusCode>(STATUS),
        ) {
            response.set_status(*status);
        }

        let body = format!(
            "<app-root>{}#{}|{}|{}|{}|{}</app-root>",
            artifact.name,
            artifact.serial,
            request.original_url(),
            greeting,
            artifact.tag,
            artifact.template.as_deref().unwrap_or(""),
        );
        Ok(config.document.replace("<app-root></app-root>", &body))
    }
}

/// In-memory documents that count every read.
#[derive(Default)]
pub struct MemoryDocuments {
    files: HashMap<PathBuf, String>,
    reads: AtomicUsize,
}

impl MemoryDocuments {
    pub fn new() -> Self {
        Self::default()
            .with(INDEX, INDEX_HTML)
            .with(TEMPLATE, "<h1>hello</h1>")
    }

    pub fn with(mut self, path: &str, content: &str) -> Self {
        self.files.insert(PathBuf::from(path), content.to_string());
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentSource for MemoryDocuments {
    async fn read(&self, path: &Path) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such document"))
    }
}

pub fn module(name: &str) -> BootstrapEntity<StubModule, StubArtifact> {
    BootstrapEntity::module(StubModule::named(name))
}

pub fn engine_with(
    platform: StubPlatform,
    setup: PlatformSetup<StubPlatform>,
) -> (Engine<StubPlatform>, Arc<MemoryDocuments>) {
    let documents = Arc::new(MemoryDocuments::new());
    let engine = Engine::with_document_source(platform, setup, documents.clone())
        .expect("engine should build");
    (engine, documents)
}

/// Poll until `condition` holds, failing the test after a few seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition should hold before the timeout");
}
