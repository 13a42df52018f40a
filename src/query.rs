//! Path queries over model documents.
//!
//! A path starts at the document root (`$`) and applies a sequence of steps:
//!
//! - `.field` projects objects onto one of their fields
//! - `[3]` selects an element of an array
//! - `[*]` expands an array into its elements
//! - `[?(@.adjacent_to = "EXTERIOR" and @.id = X)]` keeps only elements whose
//!   fields equal the given literals
//!
//! Paths are parsed once (see [`Path::from_str`]) and can then be evaluated
//! any number of times against any document. Missing fields and out-of-range
//! indices are not errors; they simply shrink the result.
//!
//! ```
//! use rpd_match::query::evaluate_path;
//! use serde_json::json;
//!
//! let document = json!({"zones": [{"id": "A"}, {"id": "B"}]});
//! let ids = evaluate_path("$.zones[*].id", &document).unwrap();
//! assert_eq!(ids, vec![&json!("A"), &json!("B")]);
//! ```

use std::{fmt, str::FromStr};

use serde_json::Value;

mod eval;
mod parser;

pub(crate) use eval::child_pointer;
pub use eval::Match;
pub use parser::SyntaxError;

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    steps: Vec<Step>,
}

/// A single step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// `.name`
    Field(String),
    /// `[i]`
    Index(usize),
    /// `[*]`
    Wildcard,
    /// `[?(clause and clause ...)]`
    Filter(Vec<Clause>),
}

/// One `@.field = literal` comparison inside a filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// Field path relative to the candidate element (`@.a.b` is `["a", "b"]`).
    pub field: Vec<String>,
    /// The value the field must equal.
    pub literal: Literal,
}

/// The right-hand side of a filter clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// A single- or double-quoted string. Only equal to JSON strings.
    Quoted(String),
    /// An unquoted token. Matches `true`/`false`/`null`, numbers by value, or a
    /// string with the same text.
    Bare(String),
}

impl Path {
    /// Parses a path expression.
    ///
    /// # Errors
    ///
    /// Returns a [`SyntaxError`] if the expression is malformed.
    pub fn parse(expression: &str) -> Result<Self, SyntaxError> {
        parser::parse(expression)
    }

    /// The steps following the root anchor.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Returns a new path with `step` appended.
    #[must_use]
    pub fn then(&self, step: Step) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }
}

impl FromStr for Path {
    type Err = SyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for step in &self.steps {
            match step {
                Step::Field(name) => write!(f, ".{name}")?,
                Step::Index(index) => write!(f, "[{index}]")?,
                Step::Wildcard => f.write_str("[*]")?,
                Step::Filter(clauses) => {
                    f.write_str("[?(")?;
                    for (i, clause) in clauses.iter().enumerate() {
                        if i > 0 {
                            f.write_str(" and ")?;
                        }
                        write!(f, "@.{} = {}", clause.field.join("."), clause.literal)?;
                    }
                    f.write_str(")]")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quoted(text) => {
                f.write_str("\"")?;
                for c in text.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
            Self::Bare(token) => f.write_str(token),
        }
    }
}

/// Parses `expression` and evaluates it against `document`.
///
/// # Errors
///
/// Returns a [`SyntaxError`] if the expression is malformed. The document is
/// not inspected in that case.
pub fn evaluate_path<'a>(expression: &str, document: &'a Value) -> Result<Vec<&'a Value>, SyntaxError> {
    Ok(Path::parse(expression)?.evaluate(document))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test_case("$" ; "root only")]
    #[test_case("$.zones[*].surfaces[0]" ; "index and wildcard")]
    #[test_case("$.zones[*][?(@.adjacent_to = \"EXTERIOR\" and @.id = X)].area" ; "filter mid path")]
    #[test_case("$.a[?(@.b.c = \"say \\\"hi\\\"\")]" ; "escaped quotes")]
    fn display_round_trips(expression: &str) {
        let path = Path::parse(expression).unwrap();
        let reparsed = Path::parse(&path.to_string()).unwrap();
        assert_eq!(path, reparsed);
    }

    #[test]
    fn evaluate_path_reports_syntax_errors() {
        let document = json!({});
        assert!(evaluate_path("zones", &document).is_err());
    }

    #[test]
    fn then_appends_a_step() {
        let path = Path::parse("$.zones[*]").unwrap();
        let surfaces = path
            .then(Step::Field("surfaces".to_string()))
            .then(Step::Wildcard);
        assert_eq!(surfaces.to_string(), "$.zones[*].surfaces[*]");
    }
}
