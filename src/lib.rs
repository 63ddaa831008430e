//! Server-side rendering engine: compile each bootstrap module once, render
//! it many times with per-request providers.
//!
//! An [`Engine`] owns a factory cache of compiled artifacts and a document
//! cache of template text. Each render resolves both, hands the platform a
//! provider list carrying the request, the optional response handle and the
//! document, and delivers the HTML or the error to a single callback.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

pub use application::error::{EngineError, ErrorReport};
pub use application::platform::{Compiler, Platform, PlatformError, ResourceLoader};
pub use application::render::{
    CompilerContext, Engine, PlatformConfig, PlatformRenderOptions, PlatformSetup,
    RenderOptions, RequestContext, ResponseHandle, SetupOptions,
};
pub use cache::{CompileMode, DocumentCache, DocumentSource, FactoryCache};
pub use domain::entity::BootstrapEntity;
pub use domain::keys::{CacheKey, EntityRef, Symbol};
pub use domain::providers::{
    INITIAL_CONFIG, Provider, ProviderSet, REQUEST, RESOURCE_LOADER, RESPONSE, Token,
};
pub use infra::http::render_response;
pub use infra::loader::{FileLoader, FsDocumentSource};
