//! Cache key definitions.
//!
//! A [`CacheKey`] names the slot a compiled artifact lives in. Names compare by
//! value, symbols by their unique id, and entity keys by module identity.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL_ID: AtomicU64 = AtomicU64::new(1);

/// Unique symbolic token.
///
/// Every call to [`Symbol::new`] yields a distinct key, even when two symbols
/// share a description. Clones compare equal to their original.
#[derive(Clone)]
pub struct Symbol {
    id: u64,
    description: Arc<str>,
}

impl Symbol {
    pub fn new(description: impl Into<Arc<str>>) -> Self {
        Self {
            id: NEXT_SYMBOL_ID.fetch_add(1, Ordering::Relaxed),
            description: description.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({}#{})", self.description, self.id)
    }
}

/// Identity of a bootstrap entity.
///
/// Holds a strong reference to the entity so its address cannot be reused
/// while the key is alive. Equality and hashing use the pointer only.
#[derive(Clone)]
pub struct EntityRef {
    target: Arc<dyn Any + Send + Sync>,
}

impl EntityRef {
    pub fn of<T: Send + Sync + 'static>(entity: &Arc<T>) -> Self {
        let target: Arc<dyn Any + Send + Sync> = Arc::clone(entity) as _;
        Self { target }
    }

    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.target) as *const ()
    }

    /// Returns true if this key refers to `entity`.
    pub fn is<T: Send + Sync + 'static>(&self, entity: &Arc<T>) -> bool {
        std::ptr::eq(self.addr(), Arc::as_ptr(entity) as *const ())
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl Eq for EntityRef {}

impl Hash for EntityRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.addr() as usize).hash(state);
    }
}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityRef({:p})", self.addr())
    }
}

/// Key under which a compiled artifact is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Name(String),
    Symbol(Symbol),
    Entity(EntityRef),
}

impl CacheKey {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn entity<T: Send + Sync + 'static>(entity: &Arc<T>) -> Self {
        Self::Entity(EntityRef::of(entity))
    }
}

impl From<&str> for CacheKey {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for CacheKey {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<Symbol> for CacheKey {
    fn from(value: Symbol) -> Self {
        Self::Symbol(value)
    }
}

impl From<EntityRef> for CacheKey {
    fn from(value: EntityRef) -> Self {
        Self::Entity(value)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Name(name) => write!(f, "name:{name}"),
            CacheKey::Symbol(symbol) => write!(f, "symbol:{}#{}", symbol.description, symbol.id),
            CacheKey::Entity(entity) => write!(f, "entity:{:p}", entity.addr()),
        }
    }
}
