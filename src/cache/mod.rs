//! Engine caches.
//!
//! - **Factory cache**: compiled artifacts keyed by [`CacheKey`](crate::CacheKey)
//! - **Document cache**: template documents keyed by path
//!
//! Both live as long as the engine that owns them and only ever grow.

mod config;
mod document;
mod factory;

pub use config::CompileMode;
pub use document::{DocumentCache, DocumentSource};
pub use factory::FactoryCache;
