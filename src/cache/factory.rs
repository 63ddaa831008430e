//! Factory cache: one compiled artifact per cache key.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use metrics::{counter, histogram};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::application::error::EngineError;
use crate::application::platform::Compiler;
use crate::domain::entity::BootstrapEntity;
use crate::domain::keys::CacheKey;

use super::config::CompileMode;

const METRIC_HIT: &str = "ssr_factory_cache_hit_total";
const METRIC_MISS: &str = "ssr_factory_cache_miss_total";
const METRIC_COALESCED: &str = "ssr_factory_cache_coalesced_total";
const METRIC_COMPILE: &str = "ssr_compile_total";
const METRIC_COMPILE_FAILURE: &str = "ssr_compile_failure_total";
const METRIC_COMPILE_MS: &str = "ssr_compile_ms";

type Slot<A> = Arc<OnceCell<Arc<A>>>;

/// Maps cache keys to compiled artifacts.
///
/// A slot is written at most once and never evicted. Failed compiles leave the
/// slot empty so the next caller retries.
///
/// A miss is counted per compile attempt. Under [`CompileMode::Coalesce`],
/// callers that wait on another caller's compile count as coalesced instead.
pub struct FactoryCache<A> {
    mode: CompileMode,
    slots: DashMap<CacheKey, Slot<A>>,
}

impl<A> FactoryCache<A>
where
    A: Send + Sync + 'static,
{
    pub fn new(mode: CompileMode) -> Self {
        Self {
            mode,
            slots: DashMap::new(),
        }
    }

    pub fn mode(&self) -> CompileMode {
        self.mode
    }

    /// Number of keys holding a compiled artifact.
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.get(key).is_some()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<A>> {
        self.slots
            .get(key)
            .and_then(|slot| slot.value().get().cloned())
    }

    /// Resolve the artifact for `entity` under `key`, compiling on a miss.
    ///
    /// Precompiled entities are returned untouched and never stored. The
    /// compiler supplier only runs when a compile actually happens.
    pub async fn resolve<M, C, F>(
        &self,
        entity: &BootstrapEntity<M, A>,
        key: &CacheKey,
        supplier: F,
    ) -> Result<Arc<A>, EngineError>
    where
        M: Send + Sync + 'static,
        C: Compiler<Module = M, Artifact = A>,
        F: FnOnce() -> Result<Arc<C>, EngineError> + Send,
    {
        let module = match entity {
            BootstrapEntity::Compiled(artifact) => {
                debug!(cache_key = %key, "bootstrap entity already compiled; bypassing cache");
                return Ok(Arc::clone(artifact));
            }
            BootstrapEntity::Module(module) => module,
        };

        let slot = self.slot(key);
        if let Some(artifact) = slot.get() {
            counter!(METRIC_HIT).increment(1);
            debug!(cache_key = %key, "factory cache hit");
            return Ok(Arc::clone(artifact));
        }

        match self.mode {
            CompileMode::Coalesce => {
                let mut compiled_here = false;
                let outcome = slot
                    .get_or_try_init(|| {
                        compiled_here = true;
                        counter!(METRIC_MISS).increment(1);
                        debug!(cache_key = %key, mode = %self.mode, "factory cache miss");
                        compile(module.as_ref(), key, supplier)
                    })
                    .await
                    .map(Arc::clone);
                if !compiled_here {
                    counter!(METRIC_COALESCED).increment(1);
                    debug!(cache_key = %key, "joined in-flight compile");
                }
                outcome
            }
            CompileMode::Independent => {
                counter!(METRIC_MISS).increment(1);
                debug!(cache_key = %key, mode = %self.mode, "factory cache miss");
                let compiled = compile(module.as_ref(), key, supplier).await?;
                match slot.set(Arc::clone(&compiled)) {
                    Ok(()) => Ok(compiled),
                    Err(_) => {
                        debug!(cache_key = %key, "discarding duplicate artifact from concurrent compile");
                        Ok(slot.get().cloned().unwrap_or(compiled))
                    }
                }
            }
        }
    }

    fn slot(&self, key: &CacheKey) -> Slot<A> {
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }
}

async fn compile<M, C, F>(
    module: &M,
    key: &CacheKey,
    supplier: F,
) -> Result<Arc<C::Artifact>, EngineError>
where
    C: Compiler<Module = M>,
    F: FnOnce() -> Result<Arc<C>, EngineError>,
{
    let compiler = supplier()?;
    let started_at = Instant::now();
    match compiler.compile(module).await {
        Ok(artifact) => {
            let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;
            counter!(METRIC_COMPILE).increment(1);
            histogram!(METRIC_COMPILE_MS).record(elapsed_ms);
            info!(cache_key = %key, elapsed_ms, "compiled bootstrap module");
            Ok(Arc::new(artifact))
        }
        Err(source) => {
            counter!(METRIC_COMPILE_FAILURE).increment(1);
            warn!(cache_key = %key, error = %source, "bootstrap module failed to compile");
            Err(EngineError::compile(key, source))
        }
    }
}
