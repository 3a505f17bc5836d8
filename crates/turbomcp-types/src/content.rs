//! Tool output values and the content items built from them.

use serde_json::Value;

use crate::PropertyType;

/// A typed value for one field of a tool's output schema.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Serializes unquoted.
    Number(f64),
    /// Serializes quoted, with backslashes/quotes escaped in the flattened text form.
    Text(String),
    /// An arbitrary JSON value, passed through as-is.
    Object(Value),
}

impl PropertyValue {
    /// The `PropertyType` this value corresponds to, for schema cross-checks.
    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        match self {
            Self::Number(_) => PropertyType::Number,
            Self::Text(_) => PropertyType::Text,
            Self::Object(_) => PropertyType::Object,
        }
    }

    /// Render as a `serde_json::Value` for `structuredContent`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(s) => Value::String(s.clone()),
            Self::Object(v) => v.clone(),
        }
    }
}

/// The result of one tool invocation's content.
///
/// An empty output schema produces the scalar `Text` form; a non-empty
/// schema produces the `Structured` form, which the transport must render
/// as both a human-readable `content[].text` and a typed `structuredContent`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentItem {
    /// Scalar text payload (tools with an empty output schema).
    Text(String),
    /// Ordered `{name, value}` pairs drawn from the tool's output schema.
    Structured(Vec<(String, PropertyValue)>),
}

impl ContentItem {
    /// Build a scalar text item.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Build a structured item from field/value pairs.
    #[must_use]
    pub fn structured(fields: Vec<(String, PropertyValue)>) -> Self {
        Self::Structured(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn number_serializes_to_json_number() {
        let v = PropertyValue::Number(2.0);
        assert_eq!(v.to_json(), serde_json::json!(2.0));
    }

    #[test]
    fn text_serializes_to_json_string() {
        let v = PropertyValue::Text("hi".into());
        assert_eq!(v.to_json(), serde_json::json!("hi"));
    }
}
