//! Command definitions
//!
//! Represents commands from clients.

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Index a package with its declared dependencies
    Index { package: String, deps: Vec<String> },

    /// Remove a package from the index
    Remove { package: String },

    /// Query whether a package is indexed
    Query { package: String },
}

impl Command {
    /// The package name the command refers to
    pub fn package(&self) -> &str {
        match self {
            Command::Index { package, .. } => package,
            Command::Remove { package } => package,
            Command::Query { package } => package,
        }
    }
}
