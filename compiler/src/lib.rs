//! Provides the compilation of rexl patterns into flat runtime programs,
//! plus the one-call matching front used by drivers.
//!
//! The pattern language is small: `.` matches any non-NUL byte, `X*` zero
//! or more of `X`, `X?` zero or one, `X|Y` either side, `(…)` groups,
//! `[…]` matches one byte out of a set, and `{…}` reverses the success and
//! failure of its content. Matching is anchored to the first byte of the
//! input; prepend `.*` to search and append `{.}` to demand the end of the
//! input.
//!
//! # Example
//!
//! ```rust
//! // Compilation of a pattern into an evaluatable program is a single
//! // call; the program then runs against any number of inputs via the
//! // `rexl-runtime` crate.
//! use rexl_compiler::compile;
//! use rexl_runtime::{run, Match};
//!
//! let program = compile(".*ab").expect("pattern failed to compile");
//!
//! // The reported range is leftmost: the `.*` prefix claims the input
//! // from its first byte.
//! assert_eq!(Some(Match::new(0, 4)), run(&program, "xyab"));
//! assert_eq!(None, run(&program, "xyz"));
//! ```

use std::fmt;

pub mod compiler;
pub mod parser;

pub use compiler::compile;
pub use parser::{ErrorKind, PatternError};
pub use rexl_runtime::{Match, Program};

/// Sentinel stored in the `end` slot of [`match_offsets`] when the input
/// is empty. Distinct from every negated [`ErrorKind::code`].
pub const EMPTY_INPUT: i32 = -6;

/// Everything [`find`] can report short of a clean "no match".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The pattern was rejected by the compiler.
    Pattern(PatternError),
    /// The input was empty; the matcher requires at least one byte.
    EmptyInput,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Pattern(err) => write!(f, "invalid pattern: {}", err),
            Error::EmptyInput => write!(f, "empty input"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Pattern(err) => Some(err),
            Error::EmptyInput => None,
        }
    }
}

impl From<PatternError> for Error {
    fn from(err: PatternError) -> Self {
        Error::Pattern(err)
    }
}

/// Compiles `pattern` and runs it against `input`, returning the leftmost
/// match. The input is inspected before the pattern, so an empty input
/// reports [`Error::EmptyInput`] even when the pattern is malformed.
pub fn find(pattern: &str, input: &str) -> Result<Option<Match>, Error> {
    if input.is_empty() {
        return Err(Error::EmptyInput);
    }

    let program = compile(pattern)?;
    Ok(rexl_runtime::run(&program, input))
}

/// The raw integer contract over [`find`], for callers that want the
/// classic pair instead of a `Result`:
///
/// | outcome       | start        | end               |
/// |---------------|--------------|-------------------|
/// | match         | `m.start`    | `m.end`           |
/// | no match      | `-1`         | `0`               |
/// | empty input   | `-1`         | [`EMPTY_INPUT`]   |
/// | pattern error | `-(pos + 1)` | `-kind.code()`    |
pub fn match_offsets(pattern: &str, input: &str) -> (i32, i32) {
    match find(pattern, input) {
        Ok(Some(m)) => (m.start as i32, m.end as i32),
        Ok(None) => (-1, 0),
        Err(Error::EmptyInput) => (-1, EMPTY_INPUT),
        Err(Error::Pattern(err)) => (-(err.pos as i32) - 1, -err.kind.code()),
    }
}
