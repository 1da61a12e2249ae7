//! Call argument bundles.
//!
//! Rust has no runtime reflection over call sites, so arguments reach the
//! cache as an explicit bundle of positional and keyword values. Keywords
//! are kept in a `BTreeMap` so rendering order is deterministic.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::KeyError;

/// Positional and keyword arguments for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    /// Positional arguments in call order.
    pub positional: Vec<Value>,
    /// Keyword arguments by parameter name.
    pub keyword: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Empty argument bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle from already-rendered positional values.
    pub fn from_positional(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keyword: BTreeMap::new(),
        }
    }

    /// Append a positional argument.
    pub fn with_arg<T: Serialize>(mut self, value: T) -> Result<Self, KeyError> {
        let value = render(None, value)?;
        self.positional.push(value);
        Ok(self)
    }

    /// Set a keyword argument. A repeated name overwrites the earlier value.
    pub fn with_kwarg<T: Serialize>(mut self, name: &str, value: T) -> Result<Self, KeyError> {
        let value = render(Some(name), value)?;
        self.keyword.insert(name.to_string(), value);
        Ok(self)
    }

    /// Merge `later` behind this bundle: our positionals become the leading
    /// prefix, and later keywords override ours. This is the partial-binding
    /// rule for bound wrappers.
    pub fn merge_with(&self, later: &CallArgs) -> CallArgs {
        let mut positional = self.positional.clone();
        positional.extend(later.positional.iter().cloned());
        let mut keyword = self.keyword.clone();
        keyword.extend(later.keyword.iter().map(|(k, v)| (k.clone(), v.clone())));
        CallArgs {
            positional,
            keyword,
        }
    }

    /// True when the bundle carries no arguments at all.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.keyword.is_empty()
    }
}

fn render<T: Serialize>(name: Option<&str>, value: T) -> Result<Value, KeyError> {
    serde_json::to_value(value).map_err(|err| KeyError::Unrenderable {
        name: name.unwrap_or("<positional>").to_string(),
        reason: err.to_string(),
    })
}

// =============================================================================
// TESTS
// =============================================================================
