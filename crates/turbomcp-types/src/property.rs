//! Schema-level property descriptions for tool inputs and outputs.

use serde::{Deserialize, Serialize};

/// The closed set of value types a tool property can take.
///
/// `Unknown` is a parse-failure sentinel only: it is never produced by a
/// well-formed schema and never serialized back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    /// A numeric value, serialized without quotes.
    Number,
    /// Free-form text, serialized quoted and escaped.
    Text,
    /// An alias some schemas use interchangeably with `Text`.
    String,
    /// An arbitrary JSON object.
    Object,
    /// Parse-failure sentinel; never serialized.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl PropertyType {
    /// Whether values of this type serialize unquoted in the flattened text form.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Number)
    }

    /// The JSON Schema `type` keyword this property type maps to.
    #[must_use]
    pub const fn json_schema_type(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Text | Self::String => "string",
            Self::Object => "object",
            Self::Unknown => "string",
        }
    }
}

/// One field of a tool's input or output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Field name, unique within the owning schema.
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub r#type: PropertyType,
    /// Human-readable description, shown in `tools/list`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the field must be present (and non-empty) on input.
    #[serde(default)]
    pub required: bool,
}

impl PropertySpec {
    /// Build a required property.
    #[must_use]
    pub fn required(name: impl Into<String>, r#type: PropertyType) -> Self {
        Self {
            name: name.into(),
            r#type,
            description: None,
            required: true,
        }
    }

    /// Build an optional property.
    #[must_use]
    pub fn optional(name: impl Into<String>, r#type: PropertyType) -> Self {
        Self {
            name: name.into(),
            r#type,
            description: None,
            required: false,
        }
    }

    /// Attach a description, builder-style.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn property_type_round_trips() {
        let json = serde_json::to_value(PropertyType::Number).unwrap();
        assert_eq!(json, serde_json::json!("number"));
        let back: PropertyType = serde_json::from_value(json).unwrap();
        assert_eq!(back, PropertyType::Number);
    }

    #[test]
    fn unknown_is_a_parse_fallback_not_a_wire_value() {
        let parsed: PropertyType = serde_json::from_value(serde_json::json!("bogus")).unwrap();
        assert_eq!(parsed, PropertyType::Unknown);
    }

    #[test]
    fn builder_sets_required_flag() {
        let p = PropertySpec::required("value", PropertyType::String).with_description("desc");
        assert!(p.required);
        assert_eq!(p.description.as_deref(), Some("desc"));
    }
}
