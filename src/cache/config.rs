//! Cache configuration.
//!
//! Controls how the factory cache treats concurrent misses on one key.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Strategy for concurrent renders that miss the same cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompileMode {
    /// Concurrent callers await a single in-flight compile.
    #[default]
    Coalesce,
    /// Every caller compiles on its own; the first stored artifact wins and
    /// later ones are discarded.
    Independent,
}

impl CompileMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompileMode::Coalesce => "coalesce",
            CompileMode::Independent => "independent",
        }
    }
}

impl fmt::Display for CompileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompileMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "coalesce" => Ok(CompileMode::Coalesce),
            "independent" => Ok(CompileMode::Independent),
            other => Err(format!(
                "unknown compile mode `{other}` (expected `coalesce` or `independent`)"
            )),
        }
    }
}
