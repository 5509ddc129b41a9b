//! Directed graph and dependency-first ordering
//!
//! Vertices are arbitrary hashable keys. An edge `u -> v` reads as
//! "`u` depends on `v`", so the ordering produced by [`DiGraph::sort_by`]
//! places every `v` before the `u` that points to it.
//!
//! ## Determinism
//!
//! Vertices are kept in insertion order without duplicates and outgoing
//! edges are followed in the order they were added. Combined with a total
//! tie-break comparator this makes the resulting order fully reproducible.

use crate::error::Cycle;
use indexmap::IndexSet;
use std::{
    cmp::Ordering,
    collections::HashMap,
    hash::Hash
};

/// A directed graph over vertices of type `T`
#[derive(Debug, Clone)]
pub struct DiGraph<T> {
    vertices: IndexSet<T>,
    edges: HashMap<T, Vec<T>>
}

impl<T: Hash + Eq + Clone> Default for DiGraph<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone> DiGraph<T> {
    /// Creates an empty graph
    #[inline]
    pub fn new() -> Self {
        Self {
            vertices: IndexSet::new(),
            edges: HashMap::new()
        }
    }

    /// Adds a vertex. Adding the same vertex twice has no effect.
    #[inline]
    pub fn add_vertex(&mut self, vertex: T) {
        self.vertices.insert(vertex);
    }

    /// Adds a directed edge `from -> to`.
    ///
    /// `to` does not have to be a known vertex, it is still visited
    /// while ordering and appears in the output.
    #[inline]
    pub fn add_edge(&mut self, from: T, to: T) {
        self.edges
            .entry(from)
            .or_default()
            .push(to);
    }

    /// Returns the number of vertices added with [`DiGraph::add_vertex`]
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if the graph has no vertices
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Returns `true` if `vertex` was added with [`DiGraph::add_vertex`]
    #[inline]
    pub fn contains(&self, vertex: &T) -> bool {
        self.vertices.contains(vertex)
    }

    /// Iterates over vertices in insertion order
    #[inline]
    pub fn vertices(&self) -> impl Iterator<Item = &T> {
        self.vertices.iter()
    }

    /// Returns the outgoing edges of `vertex` in insertion order
    #[inline]
    pub fn dependencies(&self, vertex: &T) -> &[T] {
        self.edges
            .get(vertex)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Orders vertices so that every dependency precedes its dependents.
    ///
    /// `tie_break` fixes the order in which unrelated vertices are visited.
    /// The traversal is a depth-first postorder starting from each vertex
    /// not yet visited, in `tie_break` order.
    ///
    /// # Errors
    /// Returns [`Cycle`] if a vertex is reached again while its own
    /// dependencies are still being visited.
    pub fn sort_by<F>(&self, mut tie_break: F) -> Result<Vec<T>, Cycle<T>>
    where
        F: FnMut(&T, &T) -> Ordering
    {
        let mut roots: Vec<&T> = self.vertices.iter().collect();
        roots.sort_by(|a, b| tie_break(*a, *b));

        let mut walk = Walk {
            graph: self,
            marks: HashMap::with_capacity(self.vertices.len()),
            path: Vec::new(),
            output: Vec::with_capacity(self.vertices.len())
        };

        for vertex in roots {
            if !walk.marks.contains_key(vertex) {
                walk.visit(vertex)?;
            }
        }

        Ok(walk.output)
    }

    /// Orders vertices using their natural order as the tie-break.
    ///
    /// See [`DiGraph::sort_by`].
    #[inline]
    pub fn sort(&self) -> Result<Vec<T>, Cycle<T>>
    where
        T: Ord
    {
        self.sort_by(Ord::cmp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done
}

struct Walk<'a, T> {
    graph: &'a DiGraph<T>,
    marks: HashMap<&'a T, Mark>,
    path: Vec<&'a T>,
    output: Vec<T>
}

impl<'a, T: Hash + Eq + Clone> Walk<'a, T> {
    fn visit(&mut self, vertex: &'a T) -> Result<(), Cycle<T>> {
        self.marks.insert(vertex, Mark::Active);
        self.path.push(vertex);

        let graph = self.graph;
        for next in graph.dependencies(vertex) {
            match self.marks.get(next).copied() {
                None => self.visit(next)?,
                Some(Mark::Active) => return Err(self.cycle_to(next)),
                Some(Mark::Done) => ()
            }
        }

        self.path.pop();
        self.marks.insert(vertex, Mark::Done);
        self.output.push(vertex.clone());
        Ok(())
    }

    fn cycle_to(&self, vertex: &T) -> Cycle<T> {
        // an active vertex is always on the path
        let start = self.path
            .iter()
            .position(|v| *v == vertex)
            .unwrap_or(0);
        let path = self.path[start..]
            .iter()
            .map(|v| (*v).clone())
            .chain(std::iter::once(vertex.clone()))
            .collect();
        Cycle::new(path)
    }
}
