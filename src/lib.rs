//! # pkgindex
//!
//! A concurrent TCP package dependency index with:
//! - Referential-integrity-preserving INDEX / REMOVE / QUERY operations
//! - A strict line-oriented wire protocol
//! - One session thread per client, scaling to hundreds of connections
//! - Graceful shutdown with a bounded drain period
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │                  (Multiple Clients)                          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one session thread per connection
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Session Handler                             │
//! │          (line framing, dispatch, response)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │  Protocol   │          │ IndexStore  │
//!   │   Codec     │          │  (RwLock)   │
//!   └─────────────┘          └─────────────┘
//! ```
//!
//! The index is volatile: a restart yields an empty store.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod index;
pub mod network;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{IndexerError, Result};
pub use index::IndexStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pkgindex
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
