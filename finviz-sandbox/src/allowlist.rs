//! Module allowlist policy consulted on every import.

use std::collections::BTreeSet;
use thiserror::Error;

/// Baseline modules any snippet may import: pure-computation parts of the
/// Python standard library. Nothing here touches the filesystem, the
/// network, or the process.
pub const DEFAULT_ALLOWED_MODULES: &[&str] = &[
    "abc",
    "base64",
    "binascii",
    "collections",
    "copy",
    "datetime",
    "decimal",
    "fractions",
    "functools",
    "itertools",
    "json",
    "math",
    "numbers",
    "operator",
    "random",
    "re",
    "statistics",
    "string",
    "textwrap",
    "time",
    "typing",
    "unicodedata",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PolicyError {
    /// An empty prefix would match every module path; the allow surface
    /// must be explicit.
    #[error("allowed prefixes must be non-empty strings")]
    EmptyPrefix,
}

/// Deny-by-default import policy: a set of allowed module names plus an
/// optional list of dotted-path prefixes.
///
/// A module is admitted when its root segment (or its full dotted path)
/// is in the allowed set, or when a configured prefix is a prefix of the
/// full path. An empty prefix list matches nothing.
#[derive(Debug, Clone)]
pub struct ModulePolicy {
    allowed: BTreeSet<String>,
    prefixes: Vec<String>,
}

impl ModulePolicy {
    /// Policy containing only [`DEFAULT_ALLOWED_MODULES`].
    pub fn baseline() -> Self {
        Self {
            allowed: DEFAULT_ALLOWED_MODULES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            prefixes: Vec::new(),
        }
    }

    /// Empty policy that denies every import.
    pub fn deny_all() -> Self {
        Self {
            allowed: BTreeSet::new(),
            prefixes: Vec::new(),
        }
    }

    /// Add module names to the allowed set.
    pub fn allowing<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for module in modules {
            self.allowed.insert(module.into());
        }
        self
    }

    /// Set the dotted-path prefixes. Empty strings are rejected rather
    /// than silently matching everything.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Result<Self, PolicyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected = Vec::new();
        for prefix in prefixes {
            let prefix = prefix.into();
            if prefix.is_empty() {
                return Err(PolicyError::EmptyPrefix);
            }
            collected.push(prefix);
        }
        self.prefixes = collected;
        Ok(self)
    }

    /// Decide whether `module` (a name or dotted path) may be imported.
    pub fn allows(&self, module: &str) -> bool {
        if module.is_empty() {
            return false;
        }
        if self.allowed.contains(module) {
            return true;
        }
        // Submodules of an allowed root are admitted: importing `json`
        // implies `json.decoder`.
        let root = module.split('.').next().unwrap_or(module);
        if self.allowed.contains(root) {
            return true;
        }
        self.prefixes.iter().any(|p| module.starts_with(p.as_str()))
    }

    /// Names in the allowed set, for logging.
    pub fn allowed_modules(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(|s| s.as_str())
    }
}
