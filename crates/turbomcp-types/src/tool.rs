//! Tool registration, its wire-level schema projection, and argument validation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{ContentItem, PropertySpec, PropertyType, TypesError};

/// A JSON Schema `{type: "object", properties: {...}, required: [...]}` fragment.
///
/// Thin wrapper around `serde_json::Value` so callers can serialize it
/// directly or inspect it without a bespoke schema type.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaObject(pub Value);

impl SchemaObject {
    /// Build the input-schema fragment: a plain object schema over the fields.
    #[must_use]
    pub fn from_input_fields(fields: &[PropertySpec]) -> Self {
        Self(object_schema(fields))
    }

    /// Build the output-schema fragment: wraps the fields as the item shape
    /// of a `content` array; the outer required list names only `content`.
    #[must_use]
    pub fn from_output_fields(fields: &[PropertySpec]) -> Self {
        let item_schema = object_schema(fields);
        let mut content_items = Map::new();
        content_items.insert("type".into(), Value::String("array".into()));
        content_items.insert("items".into(), item_schema);

        let mut properties = Map::new();
        properties.insert("content".into(), Value::Object(content_items));

        let mut root = Map::new();
        root.insert("type".into(), Value::String("object".into()));
        root.insert("properties".into(), Value::Object(properties));
        root.insert(
            "required".into(),
            Value::Array(vec![Value::String("content".into())]),
        );
        Self(Value::Object(root))
    }

    /// Recover the flat field list from an input-schema fragment (round-trip
    /// support for `tools/list` on the client side). Property ordering is not
    /// guaranteed to match the original registration order.
    #[must_use]
    pub fn to_input_fields(&self) -> Vec<PropertySpec> {
        fields_from_object_schema(&self.0)
    }

    /// Recover the flat field list from an output-schema fragment (the
    /// `properties.content.items` level).
    #[must_use]
    pub fn to_output_fields(&self) -> Vec<PropertySpec> {
        let items = self
            .0
            .get("properties")
            .and_then(|p| p.get("content"))
            .and_then(|c| c.get("items"));
        match items {
            Some(items) => fields_from_object_schema(items),
            None => Vec::new(),
        }
    }
}

fn object_schema(fields: &[PropertySpec]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in fields {
        let mut prop = Map::new();
        prop.insert(
            "type".into(),
            Value::String(field.r#type.json_schema_type().into()),
        );
        if let Some(desc) = &field.description {
            prop.insert("description".into(), Value::String(desc.clone()));
        }
        properties.insert(field.name.clone(), Value::Object(prop));
        if field.required {
            required.push(Value::String(field.name.clone()));
        }
    }
    let mut root = Map::new();
    root.insert("type".into(), Value::String("object".into()));
    root.insert("properties".into(), Value::Object(properties));
    root.insert("required".into(), Value::Array(required));
    Value::Object(root)
}

fn fields_from_object_schema(schema: &Value) -> Vec<PropertySpec> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(name, def)| {
                    let type_str = def.get("type").and_then(Value::as_str).unwrap_or("string");
                    let r#type = match type_str {
                        "number" | "integer" => PropertyType::Number,
                        "object" => PropertyType::Object,
                        "string" => PropertyType::String,
                        _ => PropertyType::Unknown,
                    };
                    PropertySpec {
                        name: name.clone(),
                        r#type,
                        description: def
                            .get("description")
                            .and_then(Value::as_str)
                            .map(String::from),
                        required: required.contains(&name.as_str()),
                    }
                })
                .collect()
        })
        .unwrap_or_default()
}

/// The `tools/list` wire projection of a [`Tool`] — no handler, just schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    /// Tool name, unique within a server.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Input schema, absent when the tool takes no arguments.
    pub input_schema: Option<SchemaObject>,
    /// Output schema, absent when the tool returns scalar text.
    pub output_schema: Option<SchemaObject>,
}

impl ToolDescriptor {
    /// Project a registered [`Tool`] down to its wire-level descriptor.
    #[must_use]
    pub fn from_tool(tool: &Tool) -> Self {
        Self {
            name: tool.name.clone(),
            description: tool.description.clone(),
            input_schema: (!tool.input_schema.is_empty())
                .then(|| SchemaObject::from_input_fields(&tool.input_schema)),
            output_schema: (!tool.output_schema.is_empty())
                .then(|| SchemaObject::from_output_fields(&tool.output_schema)),
        }
    }

    /// Serialize to the `tools/list` entry shape `{name, description,
    /// inputSchema?, outputSchema?}`.
    #[must_use]
    pub fn to_wire_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("name".into(), Value::String(self.name.clone()));
        obj.insert(
            "description".into(),
            Value::String(self.description.clone()),
        );
        if let Some(schema) = &self.input_schema {
            obj.insert("inputSchema".into(), schema.0.clone());
        }
        if let Some(schema) = &self.output_schema {
            obj.insert("outputSchema".into(), schema.0.clone());
        }
        Value::Object(obj)
    }

    /// Parse one `tools/list` entry back into a descriptor (client-side
    /// round-trip; field order within a schema is not preserved).
    #[must_use]
    pub fn from_wire_json(value: &Value) -> Option<Self> {
        let name = value.get("name")?.as_str()?.to_string();
        let description = value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let input_schema = value.get("inputSchema").cloned().map(SchemaObject);
        let output_schema = value.get("outputSchema").cloned().map(SchemaObject);
        Some(Self {
            name,
            description,
            input_schema,
            output_schema,
        })
    }
}

/// Where a running tool handler sends progress and its final result.
///
/// Kept as a trait here rather than a concrete type so this crate never
/// needs to depend on a transport or session registry: the server crate
/// supplies the implementation, handlers only ever see this narrow seam.
#[async_trait]
pub trait ToolSink: Send + Sync {
    /// Emit a `notifications/{method}` progress message tied to this call.
    async fn notify(&self, method: &str, params: Value);

    /// Emit the tool's result and close out the call. Handlers call this
    /// exactly once; a handler that never calls it leaves its caller's
    /// request hanging.
    async fn finish(&self, content: Vec<ContentItem>);
}

/// The name-to-string argument map, originating session id, and emission
/// sink handed to a tool handler. Handlers receive only this — never the
/// transport's internals.
#[derive(Clone)]
pub struct ToolInvocation {
    /// Resolved arguments, one entry per schema field that was supplied.
    pub arguments: HashMap<String, String>,
    /// The session this call arrived on, opaque to the handler.
    pub session_id: Arc<str>,
    /// Where to send progress notifications and the final result.
    pub sink: Arc<dyn ToolSink>,
}

impl std::fmt::Debug for ToolInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolInvocation")
            .field("arguments", &self.arguments)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

/// An async tool handler. Handlers talk back through the emission sink they
/// receive via the server's dispatcher rather than returning a value.
pub type ToolHandler = Arc<
    dyn Fn(ToolInvocation) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync,
>;

/// A named operation advertised by an MCP server.
#[derive(Clone)]
pub struct Tool {
    /// Unique name within the owning server.
    pub name: String,
    /// Human-readable description, shown in `tools/list`.
    pub description: String,
    /// Ordered input fields.
    pub input_schema: Vec<PropertySpec>,
    /// Ordered output fields; empty means scalar text output.
    pub output_schema: Vec<PropertySpec>,
    /// The callback invoked on `tools/call`.
    pub handler: ToolHandler,
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("output_schema", &self.output_schema)
            .finish_non_exhaustive()
    }
}

impl Tool {
    /// Project the input schema over supplied arguments, returning the
    /// resolved name→string map or a `missing_required_params` error when a
    /// required field is absent or empty.
    pub fn validate_arguments(
        &self,
        args: &Map<String, Value>,
    ) -> Result<HashMap<String, String>, TypesError> {
        let mut resolved = HashMap::new();
        for field in &self.input_schema {
            let value = args.get(&field.name);
            let as_text = value.and_then(value_as_text);
            let is_empty = as_text.as_deref().map(str::is_empty).unwrap_or(true);
            if field.required && (value.is_none() || is_empty) {
                return Err(TypesError::MissingRequiredParam(field.name.clone()));
            }
            if let Some(text) = as_text {
                resolved.insert(field.name.clone(), text);
            }
        }
        Ok(resolved)
    }
}

fn value_as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn noop_tool(input: Vec<PropertySpec>, output: Vec<PropertySpec>) -> Tool {
        Tool {
            name: "t".into(),
            description: "d".into(),
            input_schema: input,
            output_schema: output,
            handler: Arc::new(|_| Box::pin(async {})),
        }
    }

    #[test]
    fn empty_schema_is_absent_from_descriptor() {
        let tool = noop_tool(vec![], vec![]);
        let desc = ToolDescriptor::from_tool(&tool);
        assert!(desc.input_schema.is_none());
        assert!(desc.output_schema.is_none());
    }

    #[test]
    fn output_schema_wraps_content_array_with_required_content() {
        let tool = noop_tool(
            vec![],
            vec![
                PropertySpec::required("date", PropertyType::String),
                PropertySpec::required("time", PropertyType::String),
            ],
        );
        let desc = ToolDescriptor::from_tool(&tool);
        let schema = desc.output_schema.unwrap().0;
        assert_eq!(schema["required"], serde_json::json!(["content"]));
        let items_required = &schema["properties"]["content"]["items"]["required"];
        let mut names: Vec<&str> = items_required
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        names.sort_unstable();
        assert_eq!(names, vec!["date", "time"]);
    }

    #[test]
    fn missing_required_param_is_rejected() {
        let tool = noop_tool(vec![PropertySpec::required("value", PropertyType::String)], vec![]);
        let err = tool.validate_arguments(&Map::new()).unwrap_err();
        assert!(matches!(err, TypesError::MissingRequiredParam(_)));
    }

    #[test]
    fn empty_required_string_is_rejected() {
        let tool = noop_tool(vec![PropertySpec::required("value", PropertyType::String)], vec![]);
        let mut args = Map::new();
        args.insert("value".into(), Value::String(String::new()));
        assert!(tool.validate_arguments(&args).is_err());
    }

    #[test]
    fn present_required_value_resolves() {
        let tool = noop_tool(vec![PropertySpec::required("value", PropertyType::String)], vec![]);
        let mut args = Map::new();
        args.insert("value".into(), Value::String("3".into()));
        let resolved = tool.validate_arguments(&args).unwrap();
        assert_eq!(resolved.get("value"), Some(&"3".to_string()));
    }

    #[test]
    fn descriptor_wire_round_trip_preserves_names_types_required() {
        let tool = noop_tool(
            vec![PropertySpec::required("value", PropertyType::String)],
            vec![],
        );
        let desc = ToolDescriptor::from_tool(&tool);
        let wire = desc.to_wire_json();
        let back = ToolDescriptor::from_wire_json(&wire).unwrap();
        assert_eq!(back.name, desc.name);
        assert_eq!(back.description, desc.description);
        let fields = back.input_schema.unwrap().to_input_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "value");
        assert!(fields[0].required);
    }
}
