//! Symbol table used while the visitor builds a graph
//!
//! A stack of scopes, one per open world. Each scope maps a name to the node
//! that last wrote it and that name's version counter in the scope. Writes
//! only ever touch the innermost scope; reads walk outward.

use std::collections::HashMap;
use crate::id::{NodeId, WorldId};

/// Current binding of a name in one scope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub node: NodeId,
    pub version: u32,
    /// World the bound node lives in
    pub world: WorldId,
}

type Scope = HashMap<String, Binding>;

/// Scope stack with per-scope name versioning
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create a table holding only the outermost scope
    pub fn new() -> Self {
        Self { scopes: vec![Scope::new()] }
    }

    /// Enter a nested world
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::new());
    }

    /// Leave the innermost world. The outermost scope stays.
    pub fn pop_scope(&mut self) -> bool {
        if self.scopes.len() > 1 {
            self.scopes.pop();
            true
        } else {
            false
        }
    }

    /// Record a write of `name` by `node` in the innermost scope
    ///
    /// Returns the new version: one more than the last write of the same
    /// name in this scope, starting at 1. Outer scopes are untouched.
    pub fn define_write(&mut self, name: &str, node: NodeId, world: WorldId) -> u32 {
        let last = self.scopes.len() - 1;
        let scope = &mut self.scopes[last];
        let version = scope.get(name).map_or(1, |b| b.version + 1);
        scope.insert(name.to_string(), Binding { node, version, world });
        version
    }

    /// Find the innermost binding of `name`
    ///
    /// `None` means the name is external (a builtin or something never
    /// assigned), which is not an error.
    pub fn resolve_read(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

/// Closure proxies already created, keyed by consuming world and origin.
#[derive(Debug, Default, Clone)]
pub struct ProxyCache {
    proxies: HashMap<(WorldId, NodeId), NodeId>,
}

impl ProxyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, world: &WorldId, origin: &NodeId) -> Option<&NodeId> {
        self.proxies.get(&(world.clone(), origin.clone()))
    }

    pub fn insert(&mut self, world: WorldId, origin: NodeId, proxy: NodeId) {
        self.proxies.insert((world, origin), proxy);
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_versions_increase_per_scope() {
        let mut table = SymbolTable::default();
        for n in 1..=5 {
            let node = id(&format!("x{}", n));
            assert_eq!(table.define_write("x", node.clone(), WorldId::Root), n);
            assert_eq!(table.resolve_read("x").map(|b| &b.node), Some(&node));
        }
    }

    #[test]
    fn test_inner_write_shadows_without_touching_outer() {
        let mut table = SymbolTable::default();
        table.define_write("a", id("outer_a"), WorldId::Root);
        table.define_write("a", id("outer_a2"), WorldId::Root);

        let inner = WorldId::Node(id("if_block_1"));
        table.push_scope();
        assert_eq!(table.define_write("a", id("inner_a"), inner.clone()), 1);
        assert_eq!(table.resolve_read("a").unwrap().world, inner);

        assert!(table.pop_scope());
        let binding = table.resolve_read("a").unwrap();
        assert_eq!(binding.node, id("outer_a2"));
        assert_eq!(binding.version, 2);
    }

    #[test]
    fn test_read_walks_outward() {
        let mut table = SymbolTable::default();
        table.define_write("x", id("x1"), WorldId::Root);
        table.push_scope();
        table.push_scope();

        let binding = table.resolve_read("x").unwrap();
        assert_eq!(binding.world, WorldId::Root);
        assert!(table.resolve_read("print").is_none());
    }

    #[test]
    fn test_root_scope_is_never_popped() {
        let mut table = SymbolTable::default();
        assert!(!table.pop_scope());
        table.define_write("x", id("x1"), WorldId::Root);
        assert_eq!(table.resolve_read("x").unwrap().world, WorldId::Root);
    }

    #[test]
    fn test_proxy_cache() {
        let mut cache = ProxyCache::new();
        let world = WorldId::Node(id("g"));
        cache.insert(world.clone(), id("x"), id("proxy"));

        assert_eq!(cache.get(&world, &id("x")), Some(&id("proxy")));
        assert!(cache.get(&WorldId::Root, &id("x")).is_none());
        assert_eq!(cache.len(), 1);
    }
}
