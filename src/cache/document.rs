//! Document cache: template text memoized by path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use metrics::counter;
use tracing::{debug, warn};

use crate::application::error::EngineError;

const METRIC_HIT: &str = "ssr_document_cache_hit_total";
const METRIC_READ: &str = "ssr_document_read_total";

/// Storage backing the document cache.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn read(&self, path: &Path) -> std::io::Result<String>;
}

/// Memoizes document content per path for the lifetime of the cache.
///
/// Failed reads are not remembered; the next call reads again.
pub struct DocumentCache {
    source: Arc<dyn DocumentSource>,
    entries: DashMap<PathBuf, Arc<str>>,
}

impl DocumentCache {
    pub fn new(source: Arc<dyn DocumentSource>) -> Self {
        Self {
            source,
            entries: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub async fn get(&self, path: &Path) -> Result<Arc<str>, EngineError> {
        if let Some(entry) = self.entries.get(path) {
            counter!(METRIC_HIT).increment(1);
            return Ok(Arc::clone(entry.value()));
        }

        let content = match self.source.read(path).await {
            Ok(content) => content,
            Err(source) => {
                warn!(path = %path.display(), error = %source, "failed to read document");
                return Err(EngineError::document_read(path, source));
            }
        };
        counter!(METRIC_READ).increment(1);
        debug!(path = %path.display(), bytes = content.len(), "document cached");

        // A concurrent first read of the same path may have landed already;
        // keep whichever was stored first.
        let entry = self
            .entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::from(content));
        Ok(Arc::clone(entry.value()))
    }
}
