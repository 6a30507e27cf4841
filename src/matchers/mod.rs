//! Structural equality helpers for assertions on key-value records

use serde_json::{Map, Value};
use std::fmt;

/// Same key set and structurally equal values, regardless of insertion order
pub fn maps_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| values_equal(value, other)))
}

/// Recursive equality: objects by key, arrays element-wise, scalars by value
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => maps_equal(a, b),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

/// Whether any element of `items` is structurally equal to `expected`
pub fn contains_map<'a, I>(items: I, expected: &Map<String, Value>) -> bool
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    items.into_iter().any(|item| maps_equal(item, expected))
}

/// Matcher for "sequence contains a map equal to X"
#[derive(Debug, Clone)]
pub struct ContainsMap {
    expected: Map<String, Value>,
}

impl ContainsMap {
    pub fn new(expected: Map<String, Value>) -> Self {
        Self { expected }
    }

    pub fn matches<'a, I>(&self, items: I) -> bool
    where
        I: IntoIterator<Item = &'a Map<String, Value>>,
    {
        contains_map(items, &self.expected)
    }
}

impl fmt::Display for ContainsMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "a sequence containing {}",
            Value::Object(self.expected.clone())
        )
    }
}

/// Matcher constructor reading as `contains(expected)` at call sites
pub fn contains(expected: Map<String, Value>) -> ContainsMap {
    ContainsMap::new(expected)
}

/// Assert that a sequence of maps contains one structurally equal to `expected`
#[macro_export]
macro_rules! assert_contains_map {
    ($items:expr, $expected:expr $(,)?) => {{
        let items: Vec<&::serde_json::Map<String, ::serde_json::Value>> =
            ::std::iter::IntoIterator::into_iter($items).collect();
        let matcher = $crate::matchers::ContainsMap::new(::std::clone::Clone::clone(&$expected));
        if !matcher.matches(items.iter().copied()) {
            panic!(
                "assertion failed: expected {}, got {:?}",
                matcher,
                items
                    .iter()
                    .map(|item| ::serde_json::Value::Object((*item).clone()).to_string())
                    .collect::<Vec<_>>()
            );
        }
    }};
}
