//! Volga DI Graph
//!
//! A small directed graph used to order services by their dependencies

mod graph;
pub mod error;

pub use graph::DiGraph;
pub use error::Cycle;
