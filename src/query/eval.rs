//! Evaluation of parsed paths against a document.

use serde_json::Value;

use super::{Clause, Literal, Path, Step};

/// A value selected by a path, together with its location in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct Match<'a> {
    /// JSON pointer (RFC 6901) of the value, `""` for the root.
    pub pointer: String,
    /// The selected value.
    pub value: &'a Value,
}

impl Path {
    /// Evaluates the path, returning the selected values in document order.
    #[must_use]
    pub fn evaluate<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        self.locate(document)
            .into_iter()
            .map(|found| found.value)
            .collect()
    }

    /// Evaluates the path, returning each selected value with its JSON
    /// pointer.
    #[must_use]
    pub fn locate<'a>(&self, document: &'a Value) -> Vec<Match<'a>> {
        let mut active = vec![Match {
            pointer: String::new(),
            value: document,
        }];

        for step in &self.steps {
            active = match step {
                Step::Field(name) => project(active, name),
                Step::Index(index) => select(active, *index),
                Step::Wildcard => expand(active),
                Step::Filter(clauses) => filter(active, clauses),
            };
            if active.is_empty() {
                break;
            }
        }

        active
    }
}

fn project<'a>(active: Vec<Match<'a>>, name: &str) -> Vec<Match<'a>> {
    active
        .into_iter()
        .filter_map(|found| {
            let value = found.value.as_object()?.get(name)?;
            Some(Match {
                pointer: child_pointer(&found.pointer, name),
                value,
            })
        })
        .collect()
}

fn select(active: Vec<Match<'_>>, index: usize) -> Vec<Match<'_>> {
    active
        .into_iter()
        .filter_map(|found| {
            let value = found.value.as_array()?.get(index)?;
            Some(Match {
                pointer: child_pointer(&found.pointer, &index.to_string()),
                value,
            })
        })
        .collect()
}

fn expand(active: Vec<Match<'_>>) -> Vec<Match<'_>> {
    active.into_iter().flat_map(elements).collect()
}

/// Arrays keep the elements satisfying every clause. Any other value is kept
/// when it satisfies every clause itself, so `items[*][?(...)]` filters the
/// expanded items.
fn filter<'a>(active: Vec<Match<'a>>, clauses: &[Clause]) -> Vec<Match<'a>> {
    let mut kept = Vec::new();
    for found in active {
        if found.value.is_array() {
            kept.extend(
                elements(found)
                    .into_iter()
                    .filter(|element| satisfies(element.value, clauses)),
            );
        } else if satisfies(found.value, clauses) {
            kept.push(found);
        }
    }
    kept
}

fn elements(found: Match<'_>) -> Vec<Match<'_>> {
    let Some(items) = found.value.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .enumerate()
        .map(|(i, value)| Match {
            pointer: child_pointer(&found.pointer, &i.to_string()),
            value,
        })
        .collect()
}

fn satisfies(value: &Value, clauses: &[Clause]) -> bool {
    clauses.iter().all(|clause| {
        clause
            .field
            .iter()
            .try_fold(value, |current, name| current.as_object()?.get(name))
            .is_some_and(|field| clause.literal.matches(field))
    })
}

impl Literal {
    /// Whether a document value equals this literal.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Quoted(text) | Self::Bare(text), Value::String(s)) => s == text,
            (Self::Bare(token), Value::Bool(b)) => token == if *b { "true" } else { "false" },
            (Self::Bare(token), Value::Null) => token == "null",
            (Self::Bare(token), Value::Number(number)) => {
                #[allow(clippy::float_cmp)]
                let equal = token
                    .parse::<f64>()
                    .ok()
                    .zip(number.as_f64())
                    .is_some_and(|(wanted, actual)| wanted == actual);
                equal
            }
            _ => false,
        }
    }
}

/// Appends `token` to a JSON pointer, escaping `~` and `/`.
pub(crate) fn child_pointer(parent: &str, token: &str) -> String {
    let mut pointer = String::with_capacity(parent.len() + token.len() + 1);
    pointer.push_str(parent);
    pointer.push('/');
    for c in token.chars() {
        match c {
            '~' => pointer.push_str("~0"),
            '/' => pointer.push_str("~1"),
            other => pointer.push(other),
        }
    }
    pointer
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    fn surface(id: &str, adjacent_to: &str) -> Value {
        json!({
            "id": id,
            "adjacent_to": adjacent_to,
            "optical_properties": {"absorptance_thermal_exterior": 0.9},
        })
    }

    fn document() -> Value {
        json!({
            "zones": [
                {"id": "Z1", "surfaces": [surface("X", "EXTERIOR"), surface("W1", "INTERIOR")]},
                {"id": "Z2", "surfaces": [surface("X", "INTERIOR"), surface("W2", "EXTERIOR")]},
                {"id": "Z3"},
            ]
        })
    }

    fn eval<'a>(expression: &str, document: &'a Value) -> Vec<&'a Value> {
        Path::parse(expression).unwrap().evaluate(document)
    }

    #[test]
    fn root_selects_the_document() {
        let document = document();
        assert_eq!(eval("$", &document), vec![&document]);
    }

    #[test]
    fn missing_fields_shrink_the_result() {
        let document = document();
        let surfaces = eval("$.zones[*].surfaces[*].id", &document);
        assert_eq!(surfaces.len(), 4);
        assert!(eval("$.buildings[*]", &document).is_empty());
    }

    #[test]
    fn out_of_range_index_drops_the_branch() {
        let document = document();
        assert_eq!(eval("$.zones[*].surfaces[1].id", &document), vec![&json!("W1"), &json!("W2")]);
        assert!(eval("$.zones[7]", &document).is_empty());
    }

    #[test]
    fn filter_on_array_keeps_matching_elements() {
        let document = document();
        let ids = eval("$.zones[*].surfaces[?(@.adjacent_to = EXTERIOR)].id", &document);
        assert_eq!(ids, vec![&json!("X"), &json!("W2")]);
    }

    #[test]
    fn filter_after_wildcard_tests_each_element() {
        let document = document();
        let ids = eval(
            "$.zones[*].surfaces[*][?(@.adjacent_to = \"EXTERIOR\" and @.id = \"X\")].optical_properties.absorptance_thermal_exterior",
            &document,
        );
        assert_eq!(ids, vec![&json!(0.9)]);
    }

    #[test_case("@.n = 3", true ; "integer")]
    #[test_case("@.n = 3.0", true ; "float spelling")]
    #[test_case("@.n = '3'", false ; "quoted number")]
    #[test_case("@.flag = true", true ; "boolean")]
    #[test_case("@.nothing = null", true ; "null")]
    #[test_case("@.name = \"true\"", true ; "quoted string")]
    #[test_case("@.name = true", true ; "bare token against string")]
    #[test_case("@.nested.k = v", true ; "nested field")]
    #[test_case("@.missing = v", false ; "missing field")]
    fn literal_comparison(predicate: &str, expected: bool) {
        let document = json!({"items": [{
            "n": 3, "flag": true, "nothing": null, "name": "true", "nested": {"k": "v"}
        }]});
        let found = eval(&format!("$.items[?({predicate})]"), &document);
        assert_eq!(found.len(), usize::from(expected));
    }

    #[test]
    fn locate_reports_json_pointers() {
        let document = json!({"zones": [{"id": "A"}, {"id": "B"}]});
        let pointers: Vec<_> = Path::parse("$.zones[*]")
            .unwrap()
            .locate(&document)
            .into_iter()
            .map(|found| found.pointer)
            .collect();
        assert_eq!(pointers, vec!["/zones/0", "/zones/1"]);
        assert_eq!(document.pointer("/zones/1"), Some(&json!({"id": "B"})));
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        assert_eq!(child_pointer("", "a/b~c"), "/a~1b~0c");
    }

    #[test]
    fn evaluation_is_repeatable() {
        let document = document();
        let path = Path::parse("$.zones[*].surfaces[*][?(@.adjacent_to = INTERIOR)].id").unwrap();
        assert_eq!(path.evaluate(&document), path.evaluate(&document));
    }
}
