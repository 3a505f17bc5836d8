//! Tool registration storage and the transport-backed emission sink handed
//! to running tool handlers.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};
use turbomcp_core::{Frame, RequestId};
use turbomcp_transport_traits::{SessionId, Transport};
use turbomcp_types::{ContentItem, PropertyValue, Tool, ToolSink};

use crate::session::Session;

/// Registered tools, keyed by name. A `dashmap::DashMap` so registration can
/// happen concurrently with in-flight `tools/list`/`tools/call` dispatch —
/// a tool added mid-flight is invisible to requests already in progress and
/// visible to the next one, by construction (no snapshot is taken early).
pub type ToolRegistry = DashMap<String, Tool>;

/// The concrete [`ToolSink`] a running tool handler talks back through.
///
/// Holds exactly what a handler needs to emit on its own session and
/// request id — nothing about how the transport is wired underneath.
pub struct TransportSink {
    session: SessionId,
    request_id: RequestId,
    transport: Arc<dyn Transport>,
    session_record: Arc<Session>,
}

impl TransportSink {
    #[must_use]
    pub fn new(
        session: SessionId,
        request_id: RequestId,
        transport: Arc<dyn Transport>,
        session_record: Arc<Session>,
    ) -> Self {
        Self {
            session,
            request_id,
            transport,
            session_record,
        }
    }
}

#[async_trait]
impl ToolSink for TransportSink {
    async fn notify(&self, method: &str, params: Value) {
        let frame = Frame::notification(format!("notifications/{method}"), Some(params));
        if let Err(e) = self.transport.emit(&self.session, frame.to_bytes().into(), false).await {
            tracing::warn!(session = %self.session, error = %e, "failed to emit tool notification");
        }
    }

    async fn finish(&self, content: Vec<ContentItem>) {
        let result = build_result(&content);
        let frame = Frame::response(self.request_id.clone(), result);
        if let Err(e) = self.transport.emit(&self.session, frame.to_bytes().into(), true).await {
            tracing::warn!(session = %self.session, error = %e, "failed to emit tool result");
        }
        *self.session_record.current_request_id.lock().await = None;
    }
}

/// Build `{content: [...], structuredContent?: {...}}` from a tool's content
/// items. Each structured item contributes both a flattened `content[].text`
/// (the field/value pairs rendered as a JSON object) and one entry in
/// `structuredContent.content`.
fn build_result(content: &[ContentItem]) -> Value {
    let mut content_array = Vec::with_capacity(content.len());
    let mut structured_array = Vec::new();
    let mut any_structured = false;

    for item in content {
        match item {
            ContentItem::Text(text) => {
                content_array.push(serde_json::json!({"type": "text", "text": text}));
            }
            ContentItem::Structured(fields) => {
                any_structured = true;
                let mut object = Map::new();
                for (name, value) in fields {
                    object.insert(name.clone(), value.to_json());
                }
                let text = serde_json::to_string(&Value::Object(object.clone()))
                    .unwrap_or_default();
                content_array.push(serde_json::json!({"type": "text", "text": text}));
                structured_array.push(Value::Object(object));
            }
        }
    }

    let mut result = Map::new();
    result.insert("content".into(), Value::Array(content_array));
    if any_structured {
        result.insert(
            "structuredContent".into(),
            serde_json::json!({"content": structured_array}),
        );
    }
    Value::Object(result)
}

/// Project the input schema over raw JSON-RPC `arguments`, returning the
/// resolved name→string map or the JSON-RPC error that `tools/call` should
/// reply with.
pub fn validate_arguments(
    tool: &Tool,
    arguments: &Map<String, Value>,
) -> Result<std::collections::HashMap<String, String>, turbomcp_core::RpcError> {
    tool.validate_arguments(arguments)
        .map_err(|e| turbomcp_core::RpcError::invalid_params(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use turbomcp_types::{PropertySpec, PropertyType};

    #[test]
    fn scalar_content_has_no_structured_content() {
        let content = vec![ContentItem::text("finish!")];
        let result = build_result(&content);
        assert_eq!(result["content"][0]["text"], "finish!");
        assert!(result.get("structuredContent").is_none());
    }

    #[test]
    fn structured_content_mirrors_text_and_structured_content() {
        let content = vec![ContentItem::structured(vec![
            ("date".to_string(), PropertyValue::Text("2026-07-28".into())),
            ("count".to_string(), PropertyValue::Number(3.0)),
        ])];
        let result = build_result(&content);
        let text = result["content"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, result["structuredContent"]["content"][0]);
    }

    #[test]
    fn missing_required_argument_is_invalid_params() {
        let tool = Tool {
            name: "count_down".into(),
            description: "d".into(),
            input_schema: vec![PropertySpec::required("value", PropertyType::String)],
            output_schema: vec![],
            handler: std::sync::Arc::new(|_| Box::pin(async {})),
        };
        let err = validate_arguments(&tool, &Map::new()).unwrap_err();
        assert_eq!(err.code, -32602);
    }
}
