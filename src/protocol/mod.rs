//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format (line-oriented)
//!
//! ### Request Format
//! ```text
//! <COMMAND>|<package>|<deps>\n
//! ```
//!
//! - `<COMMAND>` is `INDEX`, `REMOVE`, or `QUERY` (case-sensitive)
//! - `<package>` is a non-empty package name with no whitespace and no `|`
//! - `<deps>` is empty, or a comma-separated list of package names; only
//!   meaningful for `INDEX`, and must be empty for `REMOVE` and `QUERY`
//! - exactly two `|` separators, terminated by a single `\n`
//!
//! ### Sample Requests
//! ```text
//! INDEX|cloog|gmp,isl,pkg-config\n
//! INDEX|ceylon|\n
//! REMOVE|cloog|\n
//! QUERY|cloog|\n
//! ```
//!
//! ### Responses
//! - `OK\n`    - the operation succeeded
//! - `FAIL\n`  - the operation was rejected by dependency rules
//! - `ERROR\n` - the request line was malformed

mod codec;
mod command;
mod response;

pub use codec::{parse_request, ParseError};
pub use command::Command;
pub use response::Response;
