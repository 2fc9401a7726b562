//! Codec Tests
//!
//! Tests for request parsing and response formatting.

use pkgindex::protocol::{parse_request, Command, ParseError, Response};

// =============================================================================
// Well-formed Request Tests
// =============================================================================

#[test]
fn test_parse_index_no_deps() {
    let cmd = parse_request("INDEX|mypkg|").unwrap();
    assert_eq!(
        cmd,
        Command::Index {
            package: "mypkg".to_string(),
            deps: vec![],
        }
    );
}

#[test]
fn test_parse_index_one_dep() {
    let cmd = parse_request("INDEX|mypkg|mydep").unwrap();
    assert_eq!(
        cmd,
        Command::Index {
            package: "mypkg".to_string(),
            deps: vec!["mydep".to_string()],
        }
    );
}

#[test]
fn test_parse_index_multi_deps() {
    let cmd = parse_request("INDEX|cloog|gmp,isl,pkg-config").unwrap();
    assert_eq!(
        cmd,
        Command::Index {
            package: "cloog".to_string(),
            deps: vec!["gmp".to_string(), "isl".to_string(), "pkg-config".to_string()],
        }
    );
}

#[test]
fn test_parse_index_duplicate_deps_allowed() {
    let cmd = parse_request("INDEX|a|b,b").unwrap();
    assert_eq!(
        cmd,
        Command::Index {
            package: "a".to_string(),
            deps: vec!["b".to_string(), "b".to_string()],
        }
    );
}

#[test]
fn test_parse_remove() {
    let cmd = parse_request("REMOVE|mypkg|").unwrap();
    assert_eq!(
        cmd,
        Command::Remove {
            package: "mypkg".to_string(),
        }
    );
}

#[test]
fn test_parse_query() {
    let cmd = parse_request("QUERY|mypkg|").unwrap();
    assert_eq!(
        cmd,
        Command::Query {
            package: "mypkg".to_string(),
        }
    );
    assert_eq!(cmd.package(), "mypkg");
}

#[test]
fn test_parse_non_ascii_name() {
    // Names are arbitrary non-whitespace characters, not just ASCII
    let cmd = parse_request("INDEX|emacs☃elisp|").unwrap();
    assert_eq!(cmd.package(), "emacs☃elisp");
}

// =============================================================================
// Malformed Request Tests
// =============================================================================

#[test]
fn test_parse_empty_line() {
    assert_eq!(parse_request(""), Err(ParseError::Separators));
}

#[test]
fn test_parse_no_separators() {
    assert_eq!(parse_request("foo"), Err(ParseError::Separators));
    assert_eq!(parse_request("HELLO"), Err(ParseError::Separators));
}

#[test]
fn test_parse_one_separator() {
    // A broken character can eat the second separator
    assert_eq!(
        parse_request("INDEX|emacs☃elisp"),
        Err(ParseError::Separators)
    );
    assert_eq!(parse_request("INDEX|a"), Err(ParseError::Separators));
}

#[test]
fn test_parse_too_many_separators() {
    assert_eq!(parse_request("INDEX|a|b|c"), Err(ParseError::Separators));
    assert_eq!(parse_request("INDEX|a||"), Err(ParseError::Separators));
}

#[test]
fn test_parse_unknown_command() {
    for line in [
        "BLINDEX|a|b",
        "REMOVES|a|",
        "QUER|a|",
        "LIZARD|a|b",
        "I|a|",
        "UPDATE|mypkg|dep1,dep2",
        "index|a|",
    ] {
        match parse_request(line) {
            Err(ParseError::UnknownCommand(_)) => {}
            other => panic!("expected UnknownCommand for {line:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_parse_empty_name() {
    assert_eq!(parse_request("INDEX||a"), Err(ParseError::EmptyName));
    assert_eq!(parse_request("QUERY||"), Err(ParseError::EmptyName));
}

#[test]
fn test_parse_whitespace_rejected() {
    assert_eq!(parse_request("INDEX|a b|"), Err(ParseError::Whitespace));
    assert_eq!(parse_request("INDEX|a|b c"), Err(ParseError::Whitespace));
    assert_eq!(parse_request("INDEX|a\t|"), Err(ParseError::Whitespace));
    assert_eq!(parse_request("QUERY|a |"), Err(ParseError::Whitespace));
    assert_eq!(parse_request("INDEX|a|b,\rc"), Err(ParseError::Whitespace));
}

#[test]
fn test_parse_empty_dep_segment() {
    assert_eq!(parse_request("INDEX|a|b,"), Err(ParseError::EmptyDep));
    assert_eq!(parse_request("INDEX|a|,b"), Err(ParseError::EmptyDep));
    assert_eq!(parse_request("INDEX|a|b,,c"), Err(ParseError::EmptyDep));
    assert_eq!(parse_request("INDEX|a|,"), Err(ParseError::EmptyDep));
}

#[test]
fn test_parse_deps_on_remove_and_query() {
    assert_eq!(
        parse_request("REMOVE|a|b"),
        Err(ParseError::UnexpectedDeps("REMOVE"))
    );
    assert_eq!(
        parse_request("QUERY|a|b,c"),
        Err(ParseError::UnexpectedDeps("QUERY"))
    );
}

// =============================================================================
// Response Formatting Tests
// =============================================================================

#[test]
fn test_response_lines() {
    assert_eq!(Response::Ok.as_line(), "OK\n");
    assert_eq!(Response::Fail.as_line(), "FAIL\n");
    assert_eq!(Response::Error.as_line(), "ERROR\n");
}

#[test]
fn test_response_from_outcome() {
    assert_eq!(Response::from_outcome(true), Response::Ok);
    assert_eq!(Response::from_outcome(false), Response::Fail);
}
