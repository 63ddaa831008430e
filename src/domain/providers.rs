//! Provider tokens and provider lists handed to the platform.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Named injection token. Tokens compare by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(&'static str);

impl Token {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Incoming request for the current render ([`crate::RequestContext`]).
pub const REQUEST: Token = Token::new("REQUEST");
/// Response handle for the current render ([`crate::ResponseHandle`]).
pub const RESPONSE: Token = Token::new("RESPONSE");
/// Document and URL for the current render ([`crate::PlatformConfig`]).
pub const INITIAL_CONFIG: Token = Token::new("INITIAL_CONFIG");
/// Resource loader handed to compilers (`Arc<dyn ResourceLoader>`).
pub const RESOURCE_LOADER: Token = Token::new("RESOURCE_LOADER");

pub type ProviderValue = Arc<dyn Any + Send + Sync>;

/// A `(token, value)` injection entry.
#[derive(Clone)]
pub struct Provider {
    token: Token,
    value: ProviderValue,
}

impl Provider {
    pub fn new<T: Any + Send + Sync>(token: Token, value: T) -> Self {
        Self {
            token,
            value: Arc::new(value),
        }
    }

    pub fn from_shared(token: Token, value: ProviderValue) -> Self {
        Self { token, value }
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn value(&self) -> &ProviderValue {
        &self.value
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

/// Ordered provider list. Later entries override earlier ones sharing a token.
#[derive(Debug, Clone, Default)]
pub struct ProviderSet {
    entries: Vec<Provider>,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, provider: Provider) {
        self.entries.push(provider);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Provider> {
        self.entries.iter()
    }

    pub fn contains(&self, token: Token) -> bool {
        self.entries.iter().any(|entry| entry.token == token)
    }

    /// Resolve the winning provider for `token`.
    pub fn resolve(&self, token: Token) -> Option<&Provider> {
        self.entries.iter().rev().find(|entry| entry.token == token)
    }

    /// Resolve the winning provider for `token` and downcast its value.
    ///
    /// Returns `None` when the winning entry holds a different type; shadowed
    /// entries are never consulted.
    pub fn get<T: Any>(&self, token: Token) -> Option<&T> {
        self.resolve(token)
            .and_then(|entry| entry.downcast_ref::<T>())
    }
}

impl Extend<Provider> for ProviderSet {
    fn extend<I: IntoIterator<Item = Provider>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<Provider> for ProviderSet {
    fn from_iter<I: IntoIterator<Item = Provider>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ProviderSet {
    type Item = &'a Provider;
    type IntoIter = std::slice::Iter<'a, Provider>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
