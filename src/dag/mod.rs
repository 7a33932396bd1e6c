// src/dag/mod.rs

//! Task graph.
//!
//! - [`graph`] holds tasks with mutually consistent parent/child sets and
//!   rejects edges that would close a cycle among incomplete tasks.
//! - [`order`] produces the deterministic topological order the scheduler
//!   consumes.

pub mod graph;
pub mod order;

pub use graph::TaskGraph;
pub use order::topological_order;
