//! Type-keyed index over the resources of a state snapshot.
//!
//! The index walks the module tree on demand, once per resource type, and
//! keeps the result for the rest of the run. The snapshot is borrowed, so the
//! index can never outlive or mutate it.

use std::collections::HashMap;
use tracing::debug;

use super::types::{StateModule, StateResource, StateSnapshot};

/// Lazily populated, per-type cache of managed resources.
#[derive(Debug)]
pub struct ResourceIndex<'a> {
    /// Root of the module tree (absent for an empty state).
    root: Option<&'a StateModule>,
    /// Resources found so far, keyed by type.
    cache: HashMap<String, Vec<&'a StateResource>>,
    /// Number of tree walks performed.
    traversals: usize,
}

impl<'a> ResourceIndex<'a> {
    /// Creates an index over a snapshot.
    #[must_use]
    pub fn new(snapshot: &'a StateSnapshot) -> Self {
        Self::from_root(snapshot.root_module())
    }

    /// Creates an index over a module tree.
    #[must_use]
    pub fn from_root(root: Option<&'a StateModule>) -> Self {
        Self {
            root,
            cache: HashMap::new(),
            traversals: 0,
        }
    }

    /// Returns every managed resource of `resource_type`, in depth-first
    /// module order.
    ///
    /// An unknown type yields an empty slice.
    pub fn get(&mut self, resource_type: &str) -> &[&'a StateResource] {
        if !self.cache.contains_key(resource_type) {
            let found = self.collect(resource_type);
            debug!("Indexed {} resource(s) of type {}", found.len(), resource_type);
            self.cache.insert(resource_type.to_string(), found);
        }

        self.cache
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Returns true if a managed resource of `resource_type` already has
    /// `address`.
    pub fn contains(&mut self, resource_type: &str, address: &str) -> bool {
        self.get(resource_type).iter().any(|r| r.address == address)
    }

    /// Number of tree walks performed so far.
    #[must_use]
    pub const fn traversal_count(&self) -> usize {
        self.traversals
    }

    /// Returns true if `resource_type` has already been indexed.
    #[must_use]
    pub fn is_cached(&self, resource_type: &str) -> bool {
        self.cache.contains_key(resource_type)
    }

    /// Walks the tree with an explicit stack, producing pre-order results.
    fn collect(&mut self, resource_type: &str) -> Vec<&'a StateResource> {
        self.traversals += 1;

        let mut found = Vec::new();
        let mut stack: Vec<&'a StateModule> = self.root.into_iter().collect();

        while let Some(module) = stack.pop() {
            found.extend(
                module
                    .resources
                    .iter()
                    .filter(|r| r.is_managed() && r.resource_type == resource_type),
            );

            // Reversed so the first child is visited next.
            stack.extend(module.child_modules.iter().rev());
        }

        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> StateSnapshot {
        let json = r#"{
            "format_version": "1.0",
            "values": {
                "root_module": {
                    "resources": [
                        { "address": "aws_subnet.root", "mode": "managed", "type": "aws_subnet", "name": "root" },
                        { "address": "data.aws_subnet.lookup", "mode": "data", "type": "aws_subnet", "name": "lookup" }
                    ],
                    "child_modules": [
                        {
                            "address": "module.net",
                            "resources": [
                                { "address": "module.net.aws_subnet.this[0]", "mode": "managed", "type": "aws_subnet", "name": "this", "index": 0 },
                                { "address": "module.net.aws_subnet.this[1]", "mode": "managed", "type": "aws_subnet", "name": "this", "index": 1 }
                            ],
                            "child_modules": [
                                {
                                    "address": "module.net.module.inner",
                                    "resources": [
                                        { "address": "module.net.module.inner.aws_subnet.deep", "mode": "managed", "type": "aws_subnet", "name": "deep" }
                                    ]
                                }
                            ]
                        },
                        {
                            "address": "module.dns",
                            "resources": [
                                { "address": "module.dns.aws_subnet.second", "mode": "managed", "type": "aws_subnet", "name": "second" },
                                { "address": "module.dns.aws_route53_zone.main", "mode": "managed", "type": "aws_route53_zone", "name": "main" }
                            ]
                        }
                    ]
                }
            }
        }"#;
        StateSnapshot::from_json(json).expect("fixture should parse")
    }

    fn addresses(resources: &[&StateResource]) -> Vec<String> {
        resources.iter().map(|r| r.address.clone()).collect()
    }

    #[test]
    fn test_walks_all_child_modules_in_order() {
        let snapshot = snapshot();
        let mut index = ResourceIndex::new(&snapshot);

        assert_eq!(
            addresses(index.get("aws_subnet")),
            vec![
                "aws_subnet.root",
                "module.net.aws_subnet.this[0]",
                "module.net.aws_subnet.this[1]",
                "module.net.module.inner.aws_subnet.deep",
                "module.dns.aws_subnet.second",
            ]
        );
    }

    #[test]
    fn test_data_sources_are_excluded() {
        let snapshot = snapshot();
        let mut index = ResourceIndex::new(&snapshot);

        assert!(index.get("aws_subnet").iter().all(|r| r.is_managed()));
    }

    #[test]
    fn test_cached_per_type() {
        let snapshot = snapshot();
        let mut index = ResourceIndex::new(&snapshot);

        let first = addresses(index.get("aws_subnet"));
        let second = addresses(index.get("aws_subnet"));

        assert_eq!(first, second);
        assert_eq!(index.traversal_count(), 1);

        assert_eq!(index.get("aws_route53_zone").len(), 1);
        assert_eq!(index.traversal_count(), 2);
    }

    #[test]
    fn test_unknown_type_is_empty() {
        let snapshot = snapshot();
        let mut index = ResourceIndex::new(&snapshot);

        assert!(index.get("aws_instance").is_empty());
        assert!(index.is_cached("aws_instance"));
        assert!(index.get("aws_instance").is_empty());
        assert_eq!(index.traversal_count(), 1);
    }

    #[test]
    fn test_contains_address() {
        let snapshot = snapshot();
        let mut index = ResourceIndex::new(&snapshot);

        assert!(index.contains("aws_subnet", "module.net.aws_subnet.this[1]"));
        assert!(!index.contains("aws_subnet", "module.net.aws_subnet.this[2]"));
        assert!(!index.contains("aws_subnet", "data.aws_subnet.lookup"));
        assert!(!index.contains("aws_route53_zone", "module.net.aws_subnet.this[1]"));
        assert_eq!(index.traversal_count(), 2);
    }

    #[test]
    fn test_empty_state() {
        let snapshot = StateSnapshot::default();
        let mut index = ResourceIndex::new(&snapshot);

        assert!(index.get("aws_subnet").is_empty());
    }
}
