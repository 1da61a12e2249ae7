//! Canonical cache key derivation.
//!
//! A key is deterministic over the *meaning* of a call, not its spelling:
//! arguments are normalized against the callable's declared signature so
//! that positional and keyword spellings of the same call, and calls that
//! only differ by omitted defaults, all land on the same key.
//!
//! Signatures are explicit registration metadata. There is no reflection
//! over Rust functions, so whoever wraps a computation also declares its
//! parameter names and trailing defaults.

use serde::Serialize;
use serde_json::Value;

use recall_core::{CallArgs, KeyError};

/// Declared shape of a wrapped computation.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    module: String,
    name: String,
    params: Vec<String>,
    defaults: Vec<Value>,
}

impl Signature {
    /// Signature with no declared parameters. Purely variadic callables
    /// stay like this; the key builder then has no named slots to fill.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
            params: Vec::new(),
            defaults: Vec::new(),
        }
    }

    /// Declare the next positional parameter. Parameters without defaults
    /// must all come before parameters with defaults.
    pub fn param(mut self, name: impl Into<String>) -> Self {
        debug_assert!(
            self.defaults.is_empty(),
            "parameters without defaults must precede defaulted ones"
        );
        self.params.push(name.into());
        self
    }

    /// Declare the next positional parameter with a default value.
    pub fn param_default<T: Serialize>(
        mut self,
        name: impl Into<String>,
        default: T,
    ) -> Result<Self, KeyError> {
        let name = name.into();
        let default = serde_json::to_value(default).map_err(|err| KeyError::Unrenderable {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        self.params.push(name);
        self.defaults.push(default);
        Ok(self)
    }

    /// `module.name`, the key's callable identity.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }

    /// Declared positional parameter names, in order.
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// Derive the canonical key for one call.
///
/// Named slots are filled in declaration order, keyword arguments winning
/// over positionals; the variadic tail and any still-missing trailing
/// defaults are appended; leftover keywords render as `name=value` pairs.
/// The result is `<module>.<name>(<args>)`, prefixed with `<master>:` when
/// a master key is present.
pub fn build_key(signature: &Signature, args: &CallArgs, master_key: Option<&str>) -> String {
    let mut keyword = args.keyword.clone();
    let mut remaining = args.positional.as_slice();
    let mut filled: Vec<Value> = Vec::with_capacity(args.positional.len());

    for name in &signature.params {
        if let Some(value) = keyword.remove(name) {
            filled.push(value);
        } else if let Some((first, rest)) = remaining.split_first() {
            filled.push(first.clone());
            remaining = rest;
        } else {
            break;
        }
    }

    // Variadic tail.
    filled.extend(remaining.iter().cloned());

    // Defaults for declared slots beyond the arguments actually supplied.
    let offset = signature.params.len() - signature.defaults.len();
    let skip = filled.len().saturating_sub(offset);
    for default in signature.defaults.iter().skip(skip) {
        filled.push(default.clone());
    }

    let mut chunks: Vec<String> = filled.iter().map(render_value).collect();
    for (name, value) in &keyword {
        chunks.push(format!("{}={}", name, render_value(value)));
    }

    let key = format!("{}({})", signature.qualified_name(), chunks.join(", "));
    match master_key {
        Some(master) => format!("{}:{}", master, key),
        None => key,
    }
}

/// Compose a master key from decorator-time components; empty means none.
pub fn master_key(components: &[Value]) -> Option<String> {
    if components.is_empty() {
        return None;
    }
    Some(
        components
            .iter()
            .map(render_value)
            .collect::<Vec<_>>()
            .join(","),
    )
}

fn render_value(value: &Value) -> String {
    // Compact JSON is the machine-readable rendering; strings keep their
    // quotes so `1` and `"1"` stay distinct keys.
    value.to_string()
}

// =============================================================================
// TESTS
// =============================================================================
