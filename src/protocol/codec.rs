//! Protocol codec
//!
//! Pure parsing of request lines into commands. Performs no I/O; the
//! session handler owns framing and hands in a single line with the
//! terminator already stripped.

use thiserror::Error;

use super::Command;

/// Why a request line failed to parse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected exactly two '|' separators")]
    Separators,

    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    #[error("empty package name")]
    EmptyName,

    #[error("whitespace in package name or dependency list")]
    Whitespace,

    #[error("empty dependency name")]
    EmptyDep,

    #[error("{0} does not take dependencies")]
    UnexpectedDeps(&'static str),
}

/// Parse a single request line (terminator already stripped)
///
/// The grammar is strict: exactly two `|` separators, an uppercase
/// command token, a non-empty package name, and for `INDEX` an optional
/// comma-separated dependency list with no empty segments. Whitespace
/// anywhere in the name or dependency fields is malformed.
pub fn parse_request(line: &str) -> Result<Command, ParseError> {
    let mut fields = line.split('|');
    let (command, package, deps_field) = match (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) {
        (Some(cmd), Some(pkg), Some(deps), None) => (cmd, pkg, deps),
        _ => return Err(ParseError::Separators),
    };

    if package.is_empty() {
        return Err(ParseError::EmptyName);
    }
    if package.chars().any(char::is_whitespace) || deps_field.chars().any(char::is_whitespace) {
        return Err(ParseError::Whitespace);
    }

    match command {
        "INDEX" => {
            let deps = parse_deps(deps_field)?;
            Ok(Command::Index {
                package: package.to_string(),
                deps,
            })
        }
        "REMOVE" => {
            if !deps_field.is_empty() {
                return Err(ParseError::UnexpectedDeps("REMOVE"));
            }
            Ok(Command::Remove {
                package: package.to_string(),
            })
        }
        "QUERY" => {
            if !deps_field.is_empty() {
                return Err(ParseError::UnexpectedDeps("QUERY"));
            }
            Ok(Command::Query {
                package: package.to_string(),
            })
        }
        other => Err(ParseError::UnknownCommand(other.to_string())),
    }
}

/// Split a dependency field into names
///
/// An empty field means no dependencies. A non-empty field must be a
/// comma-separated list of non-empty names; duplicates are allowed here
/// and collapse in the store.
fn parse_deps(field: &str) -> Result<Vec<String>, ParseError> {
    if field.is_empty() {
        return Ok(Vec::new());
    }

    field
        .split(',')
        .map(|dep| {
            if dep.is_empty() {
                Err(ParseError::EmptyDep)
            } else {
                Ok(dep.to_string())
            }
        })
        .collect()
}
