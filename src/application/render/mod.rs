//! Per-request rendering on top of the compile-once caches.
//!
//! A render call resolves its bootstrap entity and cache key, assembles the
//! provider list, obtains a compiled artifact from the factory cache and asks
//! the platform for HTML. The outcome always reaches the caller once.

mod compiler;
mod context;
mod options;
mod pipeline;

pub use compiler::CompilerContext;
pub use context::{PlatformConfig, RequestContext, ResponseHandle};
pub use options::{RenderOptions, SetupOptions};
pub use pipeline::{Engine, PlatformRenderOptions, PlatformSetup};
