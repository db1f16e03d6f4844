//! Query-string construction.
//!
//! Turns a structured parameter map into a canonical percent-encoded query
//! string. Entries with a null value are dropped, array values expand into
//! repeated `key=value` pairs in array order.

use url::form_urlencoded;

/// A single query parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(String),
    List(Vec<QueryValue>),
}

impl QueryValue {
    fn scalar(&self) -> Option<String> {
        match self {
            QueryValue::Null | QueryValue::List(_) => None,
            QueryValue::Bool(value) => Some(value.to_string()),
            QueryValue::Int(value) => Some(value.to_string()),
            QueryValue::UInt(value) => Some(value.to_string()),
            QueryValue::Str(value) => Some(value.clone()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Int(value as i64)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        QueryValue::UInt(value)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(values: Vec<T>) -> Self {
        QueryValue::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

/// Ordered query parameter map.
///
/// Insertion order is preserved so the encoded string is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryMap {
    entries: Vec<(String, QueryValue)>,
}

impl QueryMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        self.entries.push((key.into(), value.into()));
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Encodes the map into a query string without a leading `?`.
    ///
    /// An empty or all-null map encodes to an empty string; the caller must
    /// only append `?` when the result is non-empty.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            match value {
                QueryValue::Null => {}
                QueryValue::List(values) => {
                    for item in values {
                        if let Some(text) = item.scalar() {
                            serializer.append_pair(key, &text);
                        }
                    }
                }
                scalar => {
                    if let Some(text) = scalar.scalar() {
                        serializer.append_pair(key, &text);
                    }
                }
            }
        }
        serializer.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_entries_are_dropped() {
        let query = QueryMap::new()
            .with("flag", QueryValue::Null)
            .with("missing", None::<i64>);
        assert!(query.encode().is_empty());
    }

    #[test]
    fn arrays_expand_in_order() {
        let query = QueryMap::new().with("ids", vec![1i64, 2i64]);
        assert_eq!(query.encode(), "ids=1&ids=2");
    }

    #[test]
    fn mixed_values_encode_in_insertion_order() {
        let query = QueryMap::new()
            .with("limit", 50i64)
            .with("around", "1015")
            .with("pinned", true);
        assert_eq!(query.encode(), "limit=50&around=1015&pinned=true");
    }

    #[test]
    fn reserved_characters_are_escaped() {
        let query = QueryMap::new().with("q", "a b&c");
        assert_eq!(query.encode(), "q=a+b%26c");
    }

    #[test]
    fn nulls_inside_arrays_are_skipped() {
        let query = QueryMap::new().with(
            "ids",
            QueryValue::List(vec![QueryValue::Int(1), QueryValue::Null, QueryValue::Int(3)]),
        );
        assert_eq!(query.encode(), "ids=1&ids=3");
    }
}
