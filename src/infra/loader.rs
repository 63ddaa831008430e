//! File-backed document storage and the resource loader handed to compilers.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::application::error::EngineError;
use crate::application::platform::ResourceLoader;
use crate::cache::{DocumentCache, DocumentSource};

/// Reads documents from the local file system without blocking the runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDocumentSource;

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn read(&self, path: &Path) -> std::io::Result<String> {
        tokio::fs::read_to_string(path).await
    }
}

/// Resource loader backed by the engine's document cache.
///
/// Compilers fetch referenced templates and stylesheets through it, so each
/// file is read at most once per engine.
pub struct FileLoader {
    documents: Arc<DocumentCache>,
    root: Option<PathBuf>,
}

impl FileLoader {
    pub fn new(documents: Arc<DocumentCache>, root: Option<PathBuf>) -> Self {
        Self { documents, root }
    }
}

#[async_trait]
impl ResourceLoader for FileLoader {
    async fn get(&self, url: &str) -> Result<Arc<str>, EngineError> {
        let trimmed = url.strip_prefix("file://").unwrap_or(url);
        let path = resolve_path(self.root.as_deref(), Path::new(trimmed));
        self.documents.get(&path).await
    }
}

/// Join relative paths onto `root`; absolute paths and a missing root leave
/// the path as given. `.` components are dropped so equivalent spellings
/// share a cache entry.
pub fn resolve_path(root: Option<&Path>, path: &Path) -> PathBuf {
    let joined = match root {
        Some(root) if path.is_relative() => root.join(path),
        _ => path.to_path_buf(),
    };
    joined
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}
