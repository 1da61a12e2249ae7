//! Named configuration regions with inheritance.
//!
//! Regions are a flat name-to-options lookup, not an object tree: parent
//! links are walked at resolution time. Every chain must end at the
//! `"default"` region, which is the sentinel with no further parent. The
//! walk is bounded and cycle-checked, so a miswired chain fails fast as a
//! configuration error instead of looping.

use std::collections::{HashMap, HashSet};

use recall_core::{Options, RegionError, StoreRef};

/// The sentinel region terminating every inheritance chain.
pub const DEFAULT_REGION: &str = "default";

/// Hard cap on the parent walk; chains deeper than this are treated as
/// miswired even if they are technically acyclic.
const MAX_CHAIN_DEPTH: usize = 32;

/// Name-indexed region configuration.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    regions: HashMap<String, Options>,
}

impl RegionMap {
    /// Region map seeded with the `"default"` region.
    pub fn new(default: Options) -> Self {
        let mut regions = HashMap::new();
        regions.insert(DEFAULT_REGION.to_string(), default);
        Self { regions }
    }

    /// Add or replace a named region.
    pub fn insert(&mut self, name: impl Into<String>, options: Options) {
        self.regions.insert(name.into(), options);
    }

    /// Look up a region's raw configuration.
    pub fn get(&self, name: &str) -> Option<&Options> {
        self.regions.get(name)
    }

    /// Merge the region chain into `opts` and resolve the final key and
    /// store.
    ///
    /// Starting from `opts.region` (or `"default"`), each region's fields
    /// fill only the still-unset fields of `opts`, so the most specific
    /// source wins. After `"default"` is applied the effective namespace,
    /// if any, is prefixed onto the key.
    pub fn resolve(&self, key: &str, opts: &mut Options) -> Result<(String, StoreRef), RegionError> {
        let start = opts
            .region
            .clone()
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        let mut current = start.clone();
        let mut visited: HashSet<String> = HashSet::new();

        for _ in 0..MAX_CHAIN_DEPTH {
            let region = self
                .regions
                .get(&current)
                .ok_or_else(|| RegionError::Unknown {
                    name: current.clone(),
                })?;
            opts.merge_from(region);

            if current == DEFAULT_REGION {
                let key = match opts.effective_namespace() {
                    Some(namespace) => format!("{}:{}", namespace, key),
                    None => key.to_string(),
                };
                let store = opts
                    .store
                    .clone()
                    .ok_or(RegionError::NoStore { name: start })?;
                return Ok((key, store));
            }

            if !visited.insert(current.clone()) {
                return Err(RegionError::Cycle { name: start });
            }
            // The parent link comes from the region's own configuration,
            // not the merged options.
            current = region
                .parent
                .clone()
                .unwrap_or_else(|| DEFAULT_REGION.to_string());
        }

        Err(RegionError::Cycle { name: start })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::Arc;
    use std::time::Duration;

    fn map_with_store() -> (RegionMap, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let map = RegionMap::new(Options::new().with_store(store.clone()));
        (map, store)
    }

    #[test]
    fn test_default_region_resolves_bare_key() {
        let (map, _store) = map_with_store();
        let mut opts = Options::new();
        let (key, _) = map.resolve("k", &mut opts).unwrap();
        assert_eq!(key, "k");
    }

    #[test]
    fn test_namespace_prefixes_key() {
        let store = Arc::new(MemoryStore::new());
        let map = RegionMap::new(Options::new().with_store(store).with_namespace("ns"));
        let mut opts = Options::new();
        let (key, _) = map.resolve("k", &mut opts).unwrap();
        assert_eq!(key, "ns:k");
    }

    #[test]
    fn test_call_site_namespace_overrides_region() {
        let store = Arc::new(MemoryStore::new());
        let map = RegionMap::new(Options::new().with_store(store).with_namespace("region"));

        let mut opts = Options::new().with_namespace("call");
        let (key, _) = map.resolve("k", &mut opts).unwrap();
        assert_eq!(key, "call:k");

        let mut opts = Options::new().without_namespace();
        let (key, _) = map.resolve("k", &mut opts).unwrap();
        assert_eq!(key, "k");
    }

    #[test]
    fn test_child_region_overrides_parent() {
        let (mut map, _store) = map_with_store();
        map.insert(
            "parent",
            Options::new()
                .with_namespace("parent")
                .with_max_age(Duration::from_secs(60)),
        );
        map.insert(
            "child",
            Options::new().with_namespace("child").with_parent("parent"),
        );

        let mut opts = Options::new().with_region("child");
        let (key, _) = map.resolve("k", &mut opts).unwrap();

        assert_eq!(key, "child:k");
        // The parent still contributes what the child leaves unset.
        assert_eq!(opts.max_age, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_unknown_region_is_reported_distinctly() {
        let (map, _store) = map_with_store();
        let mut opts = Options::new().with_region("nope");
        let err = map.resolve("k", &mut opts).err().unwrap();
        assert_eq!(
            err,
            RegionError::Unknown {
                name: "nope".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_parent_is_reported() {
        let (mut map, _store) = map_with_store();
        map.insert("a", Options::new().with_parent("ghost"));
        let mut opts = Options::new().with_region("a");
        let err = map.resolve("k", &mut opts).err().unwrap();
        assert_eq!(
            err,
            RegionError::Unknown {
                name: "ghost".to_string()
            }
        );
    }

    #[test]
    fn test_cycle_fails_fast() {
        let (mut map, _store) = map_with_store();
        map.insert("a", Options::new().with_parent("b"));
        map.insert("b", Options::new().with_parent("a"));

        let mut opts = Options::new().with_region("a");
        let err = map.resolve("k", &mut opts).err().unwrap();
        assert_eq!(
            err,
            RegionError::Cycle {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let (mut map, _store) = map_with_store();
        map.insert("a", Options::new().with_parent("a"));

        let mut opts = Options::new().with_region("a");
        assert!(matches!(
            map.resolve("k", &mut opts),
            Err(RegionError::Cycle { .. })
        ));
    }

    #[test]
    fn test_region_store_overrides_default() {
        let default_store = Arc::new(MemoryStore::new());
        let region_store = Arc::new(MemoryStore::new());
        let mut map = RegionMap::new(Options::new().with_store(default_store));
        map.insert("a", Options::new().with_store(region_store.clone()));

        let mut opts = Options::new().with_region("a");
        let (_, store) = map.resolve("k", &mut opts).unwrap();

        let entry = recall_core::CacheEntry::new(
            serde_json::json!(1),
            chrono::Utc::now(),
            None,
            None,
            None,
        );
        store.set("probe", entry).unwrap();
        assert!(region_store.contains_key("probe"));
    }
}
