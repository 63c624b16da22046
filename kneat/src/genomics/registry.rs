use super::IdAllocator;
use crate::Innovation;

use ahash::RandomState;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use std::collections::hash_map::{Entry, HashMap};

/// An `InnovationRegistry` keeps track of the structural
/// mutations performed within one scope (usually a generation),
/// so that identical mutations occurring independently
/// in different genomes are assigned the same ids.
///
/// For connection additions the `(source, target)` pair
/// identifies identical mutations, and the connection's
/// innovation number is recorded.
///
/// For node additions the split connection's `(source, target)`
/// pair identifies identical mutations, and the new node's id
/// is recorded.
///
/// Registering a key twice is a logic error: it panics in debug
/// builds, and is ignored in release builds. Registering a key
/// with an id different from the recorded one always panics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InnovationRegistry {
    connections: HashMap<(Innovation, Innovation), Innovation, RandomState>,
    added_nodes: HashMap<(Innovation, Innovation), Innovation, RandomState>,
}

impl InnovationRegistry {
    /// Creates an empty registry.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::InnovationRegistry;
    ///
    /// let registry = InnovationRegistry::new();
    /// assert_eq!(registry.connection_count(), 0);
    /// ```
    pub fn new() -> InnovationRegistry {
        InnovationRegistry::default()
    }

    /// Returns the innovation number registered for
    /// a connection from `source` to `target`, if any.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new();
    /// assert_eq!(registry.try_lookup_connection(0, 3), None);
    ///
    /// registry.register_connection(0, 3, 17);
    /// assert_eq!(registry.try_lookup_connection(0, 3), Some(17));
    /// assert_eq!(registry.try_lookup_connection(3, 0), None);
    /// ```
    pub fn try_lookup_connection(&self, source: Innovation, target: Innovation) -> Option<Innovation> {
        self.connections.get(&(source, target)).copied()
    }

    /// Records `innovation` as the id of connections
    /// from `source` to `target`.
    ///
    /// # Panics
    /// Panics if the key is already registered with a different id,
    /// and, in debug builds, if it is already registered at all.
    pub fn register_connection(&mut self, source: Innovation, target: Innovation, innovation: Innovation) {
        register(&mut self.connections, "connection", (source, target), innovation);
    }

    /// Returns the node id registered for a split
    /// of the connection from `source` to `target`, if any.
    pub fn try_lookup_added_node(&self, source: Innovation, target: Innovation) -> Option<Innovation> {
        self.added_nodes.get(&(source, target)).copied()
    }

    /// Records `node_id` as the id of nodes created by splitting
    /// connections from `source` to `target`.
    ///
    /// # Panics
    /// Panics if the key is already registered with a different id,
    /// and, in debug builds, if it is already registered at all.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new();
    /// registry.register_added_node(0, 3, 12);
    ///
    /// assert_eq!(registry.try_lookup_added_node(0, 3), Some(12));
    /// // Node additions and connection additions are kept apart.
    /// assert_eq!(registry.try_lookup_connection(0, 3), None);
    /// ```
    pub fn register_added_node(&mut self, source: Innovation, target: Innovation, node_id: Innovation) {
        register(&mut self.added_nodes, "added node", (source, target), node_id);
    }

    /// Forgets all registered mutations, starting a new scope.
    /// The same structural change will be treated as novel
    /// afterwards.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::InnovationRegistry;
    ///
    /// let mut registry = InnovationRegistry::new();
    /// registry.register_connection(0, 3, 17);
    /// registry.clear();
    ///
    /// assert_eq!(registry.try_lookup_connection(0, 3), None);
    /// ```
    pub fn clear(&mut self) {
        self.connections.clear();
        self.added_nodes.clear();
    }

    /// Number of registered connection additions.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Number of registered node additions.
    pub fn added_node_count(&self) -> usize {
        self.added_nodes.len()
    }

    /// Returns an iterator over the registered connection
    /// additions, in the format `((source, target), innovation)`.
    /// No ordering is guaranteed.
    pub fn connection_history(&self) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.connections.iter()
    }

    /// Returns an iterator over the registered node additions,
    /// in the format `((split source, split target), node id)`.
    /// No ordering is guaranteed.
    pub fn added_node_history(&self) -> impl Iterator<Item = (&(Innovation, Innovation), &Innovation)> {
        self.added_nodes.iter()
    }
}

fn register(
    map: &mut HashMap<(Innovation, Innovation), Innovation, RandomState>,
    kind: &str,
    key: (Innovation, Innovation),
    id: Innovation,
) {
    match map.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(id);
        }
        Entry::Occupied(entry) => {
            if *entry.get() != id {
                panic!(
                    "{} innovation {} -> {} registered as both {} and {}",
                    kind,
                    key.0,
                    key.1,
                    entry.get(),
                    id
                );
            }
            debug_assert!(
                false,
                "{} innovation {} -> {} registered twice",
                kind, key.0, key.1
            );
        }
    }
}

/// A source of ids for structural mutations.
///
/// Mutation operators never touch the registry or the id
/// allocator directly; they go through this interface, which
/// always looks a mutation up before allocating a new id.
pub trait InnovationSource {
    /// Returns the innovation number for a connection from
    /// `source` to `target`, allocating and registering a
    /// new one if the mutation has not been seen before.
    fn connection_innovation(&mut self, source: Innovation, target: Innovation) -> Innovation;

    /// Returns the id of the node created by splitting the
    /// connection from `source` to `target`.
    ///
    /// If the registered id is one for which `is_taken` returns
    /// `true` (the genome being mutated already has that node),
    /// a fresh id is allocated and left unregistered.
    fn added_node_innovation(
        &mut self,
        source: Innovation,
        target: Innovation,
        is_taken: &dyn Fn(Innovation) -> bool,
    ) -> Innovation;
}

/// Single-threaded [`InnovationSource`] borrowing a
/// registry and an id allocator.
#[derive(Debug)]
pub struct InnovationTracker<'a> {
    registry: &'a mut InnovationRegistry,
    ids: &'a mut IdAllocator,
}

impl<'a> InnovationTracker<'a> {
    /// Creates a tracker over `registry` and `ids`.
    ///
    /// # Examples
    /// ```
    /// use kneat::genomics::{IdAllocator, InnovationRegistry, InnovationSource, InnovationTracker};
    ///
    /// let mut registry = InnovationRegistry::new();
    /// let mut ids = IdAllocator::new(4);
    /// let mut tracker = InnovationTracker::new(&mut registry, &mut ids);
    ///
    /// let first = tracker.connection_innovation(0, 3);
    /// let second = tracker.connection_innovation(0, 3);
    /// assert_eq!(first, second);
    /// assert_eq!(tracker.connection_innovation(1, 3), first + 1);
    /// ```
    pub fn new(registry: &'a mut InnovationRegistry, ids: &'a mut IdAllocator) -> InnovationTracker<'a> {
        InnovationTracker { registry, ids }
    }
}

impl InnovationSource for InnovationTracker<'_> {
    fn connection_innovation(&mut self, source: Innovation, target: Innovation) -> Innovation {
        connection_innovation(self.registry, self.ids, source, target)
    }

    fn added_node_innovation(
        &mut self,
        source: Innovation,
        target: Innovation,
        is_taken: &dyn Fn(Innovation) -> bool,
    ) -> Innovation {
        added_node_innovation(self.registry, self.ids, source, target, is_taken)
    }
}

/// Thread-safe [`InnovationSource`]. Every lookup-or-register
/// runs under a single lock, so concurrent mutation of different
/// genomes still assigns one id per structural change.
#[derive(Debug)]
pub struct SharedInnovations {
    state: Mutex<(InnovationRegistry, IdAllocator)>,
}

impl SharedInnovations {
    /// Wraps `registry` and `ids` for shared use.
    pub fn new(registry: InnovationRegistry, ids: IdAllocator) -> SharedInnovations {
        SharedInnovations {
            state: Mutex::new((registry, ids)),
        }
    }

    /// Returns the registry and allocator.
    pub fn into_inner(self) -> (InnovationRegistry, IdAllocator) {
        self.state.into_inner()
    }
}

impl InnovationSource for &SharedInnovations {
    fn connection_innovation(&mut self, source: Innovation, target: Innovation) -> Innovation {
        let mut state = self.state.lock();
        let (registry, ids) = &mut *state;
        connection_innovation(registry, ids, source, target)
    }

    fn added_node_innovation(
        &mut self,
        source: Innovation,
        target: Innovation,
        is_taken: &dyn Fn(Innovation) -> bool,
    ) -> Innovation {
        let mut state = self.state.lock();
        let (registry, ids) = &mut *state;
        added_node_innovation(registry, ids, source, target, is_taken)
    }
}

fn connection_innovation(
    registry: &mut InnovationRegistry,
    ids: &mut IdAllocator,
    source: Innovation,
    target: Innovation,
) -> Innovation {
    match registry.try_lookup_connection(source, target) {
        Some(innovation) => innovation,
        None => {
            let innovation = ids.next_id();
            registry.register_connection(source, target, innovation);
            innovation
        }
    }
}

fn added_node_innovation(
    registry: &mut InnovationRegistry,
    ids: &mut IdAllocator,
    source: Innovation,
    target: Innovation,
    is_taken: &dyn Fn(Innovation) -> bool,
) -> Innovation {
    match registry.try_lookup_added_node(source, target) {
        Some(node_id) if !is_taken(node_id) => node_id,
        // The genome split this connection before; a second
        // copy of the node would clash with the first.
        Some(_) => ids.next_id(),
        None => {
            let node_id = ids.next_id();
            registry.register_added_node(source, target, node_id);
            node_id
        }
    }
}
