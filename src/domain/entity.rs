//! Bootstrap entities: what a render call asks the platform to draw.

use std::fmt;
use std::sync::Arc;

use super::keys::EntityRef;

/// Either an uncompiled module or an artifact the platform already compiled.
///
/// Compiled artifacts are used as-is; they never enter the factory cache.
pub enum BootstrapEntity<M, A> {
    Module(Arc<M>),
    Compiled(Arc<A>),
}

impl<M, A> BootstrapEntity<M, A>
where
    M: Send + Sync + 'static,
    A: Send + Sync + 'static,
{
    pub fn module(module: M) -> Self {
        Self::Module(Arc::new(module))
    }

    pub fn compiled(artifact: A) -> Self {
        Self::Compiled(Arc::new(artifact))
    }

    pub fn is_compiled(&self) -> bool {
        matches!(self, Self::Compiled(_))
    }

    /// Identity key used when no explicit cache key is configured.
    pub fn identity(&self) -> EntityRef {
        match self {
            Self::Module(module) => EntityRef::of(module),
            Self::Compiled(artifact) => EntityRef::of(artifact),
        }
    }
}

impl<M, A> Clone for BootstrapEntity<M, A> {
    fn clone(&self) -> Self {
        match self {
            Self::Module(module) => Self::Module(Arc::clone(module)),
            Self::Compiled(artifact) => Self::Compiled(Arc::clone(artifact)),
        }
    }
}

impl<M, A> fmt::Debug for BootstrapEntity<M, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(module) => write!(f, "Module({:p})", Arc::as_ptr(module)),
            Self::Compiled(artifact) => write!(f, "Compiled({:p})", Arc::as_ptr(artifact)),
        }
    }
}
