//! Index Module
//!
//! In-memory package dependency graph.
//!
//! ## Responsibilities
//! - Track every indexed package with its declared dependencies
//! - Maintain the reverse (dependents) edges alongside the forward edges
//! - Enforce referential integrity: a package is only indexed when all of
//!   its dependencies are indexed, and only removed when no indexed
//!   package depends on it
//!
//! ## Data Structure Choice
//! A single HashMap keyed by package name, each entry holding the forward
//! and reverse edge sets as plain name sets. Names-as-indices keeps the
//! two-way relation cycle-free in memory. The whole map sits behind one
//! RwLock: mutations take the write lock, queries share the read lock.

mod store;

pub use store::IndexStore;
