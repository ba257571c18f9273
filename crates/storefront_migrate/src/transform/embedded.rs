//! Structured columns that may hold JSON text.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::FieldIssue;

/// Result of decoding a column that may contain a JSON-encoded string or
/// already structured JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Embedded<T> {
    Parsed(T),
    /// Null, missing, or an empty string
    Absent,
    /// Present but not decodable as `T`
    Malformed(String),
}

impl<T: DeserializeOwned> Embedded<T> {
    pub fn decode(value: Option<&Value>) -> Self {
        let parsed = match value {
            None | Some(Value::Null) => return Self::Absent,
            Some(Value::String(text)) if text.trim().is_empty() => return Self::Absent,
            Some(Value::String(text)) => serde_json::from_str::<T>(text),
            Some(other) => T::deserialize(other),
        };

        match parsed {
            Ok(value) => Self::Parsed(value),
            Err(e) => Self::Malformed(e.to_string()),
        }
    }

    /// The decoded value, or `T::default()` with a warning if malformed.
    pub fn or_default(self, field: &str, issues: &mut Vec<FieldIssue>) -> T
    where
        T: Default,
    {
        match self {
            Self::Parsed(value) => value,
            Self::Absent => T::default(),
            Self::Malformed(error) => {
                issues.push(FieldIssue::new(
                    field,
                    format!("malformed embedded JSON: {error}"),
                    "replaced with empty default",
                ));
                T::default()
            }
        }
    }
}
