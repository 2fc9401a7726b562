//! IndexStore implementation
//!
//! HashMap-based dependency graph with RwLock for concurrency.
//! Uses parking_lot::RwLock which never poisons on panic.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

/// A single indexed package: its declared dependencies and the packages
/// that currently declare it as a dependency. Both sets hold names only;
/// every name in either set is itself a key in the store.
#[derive(Debug, Default)]
struct PackageEntry {
    deps: HashSet<String>,
    dependents: HashSet<String>,
}

/// The package dependency index
///
/// All three operations are atomic with respect to each other: `index`
/// and `remove` execute inside the write lock, `query` inside the read
/// lock. Clients never observe a state where the forward and reverse
/// edge sets disagree.
pub struct IndexStore {
    /// Package name -> entry, with concurrent access
    packages: RwLock<HashMap<String, PackageEntry>>,
}

impl IndexStore {
    /// Create a new empty index
    pub fn new() -> Self {
        IndexStore {
            packages: RwLock::new(HashMap::new()),
        }
    }

    /// Index a package with its declared dependencies (write lock)
    ///
    /// Returns false if any dependency is not currently indexed; the
    /// store is unchanged in that case. Duplicate names in `deps`
    /// collapse into a set.
    ///
    /// Re-indexing an existing package replaces its dependency set and
    /// patches the reverse edges on both the dropped and the added
    /// dependencies. A self-dependency follows the same rule as any
    /// other: it succeeds only if the package is already indexed.
    pub fn index(&self, package: &str, deps: &[String]) -> bool {
        let mut packages = self.packages.write();

        let new_deps: HashSet<String> = deps.iter().cloned().collect();
        if new_deps.iter().any(|d| !packages.contains_key(d)) {
            return false;
        }

        match packages.get(package).map(|e| e.deps.clone()) {
            None => {
                for dep in &new_deps {
                    entry_mut(&mut packages, dep).dependents.insert(package.to_string());
                }
                packages.insert(
                    package.to_string(),
                    PackageEntry {
                        deps: new_deps,
                        dependents: HashSet::new(),
                    },
                );
            }
            Some(old_deps) => {
                for dep in old_deps.difference(&new_deps) {
                    entry_mut(&mut packages, dep).dependents.remove(package);
                }
                for dep in new_deps.difference(&old_deps) {
                    entry_mut(&mut packages, dep).dependents.insert(package.to_string());
                }
                entry_mut(&mut packages, package).deps = new_deps;
            }
        }

        true
    }

    /// Remove a package from the index (write lock)
    ///
    /// Returns true if the package was removed or was never indexed.
    /// Returns false, leaving the store unchanged, while any indexed
    /// package still depends on it.
    pub fn remove(&self, package: &str) -> bool {
        let mut packages = self.packages.write();

        let deps = match packages.get(package) {
            None => return true,
            Some(entry) => {
                if !entry.dependents.is_empty() {
                    return false;
                }
                entry.deps.clone()
            }
        };

        for dep in &deps {
            entry_mut(&mut packages, dep).dependents.remove(package);
        }
        packages.remove(package);

        true
    }

    /// Check whether a package is currently indexed (read lock)
    pub fn query(&self, package: &str) -> bool {
        self.packages.read().contains_key(package)
    }

    /// Number of indexed packages
    pub fn len(&self) -> usize {
        self.packages.read().len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Validate referential integrity over the whole graph
    ///
    /// Panics with a diagnostic if any edge refers to a package that is
    /// not indexed or the forward and reverse edge sets disagree. A
    /// failure here means the data model is corrupt and correctness is
    /// already lost.
    pub fn verify_integrity(&self) {
        let packages = self.packages.read();

        for (name, entry) in packages.iter() {
            for dep in &entry.deps {
                let dep_entry = packages
                    .get(dep)
                    .unwrap_or_else(|| panic!("index corrupt: {name} depends on unindexed {dep}"));
                assert!(
                    dep_entry.dependents.contains(name),
                    "index corrupt: {dep} missing reverse edge for {name}"
                );
            }
            for dependent in &entry.dependents {
                let rev_entry = packages.get(dependent).unwrap_or_else(|| {
                    panic!("index corrupt: unindexed {dependent} listed as dependent of {name}")
                });
                assert!(
                    rev_entry.deps.contains(name),
                    "index corrupt: {dependent} listed as dependent of {name} without forward edge"
                );
            }
        }
    }
}

impl Default for IndexStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Look up an entry that referential integrity guarantees to exist.
/// A miss is an internal invariant violation, so abort loudly.
fn entry_mut<'a>(
    packages: &'a mut HashMap<String, PackageEntry>,
    name: &str,
) -> &'a mut PackageEntry {
    packages
        .get_mut(name)
        .unwrap_or_else(|| panic!("index corrupt: missing entry for {name}"))
}
