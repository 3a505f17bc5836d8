//! A two-tool MCP server over stdio: `get_current_time` (scalar-free
//! structured output) and `count_down` (streams progress notifications
//! before replying). Run directly, or spawned by `time_client`.

use std::sync::Arc;

use turbomcp::{ContentItem, PropertySpec, PropertyType, PropertyValue, ServerBuilder, Tool, ToolInvocation};

async fn get_current_time(invocation: ToolInvocation) {
    let now = chrono::Utc::now();
    let content = vec![ContentItem::structured(vec![
        ("date".to_string(), PropertyValue::Text(now.format("%Y-%m-%d").to_string())),
        ("time".to_string(), PropertyValue::Text(now.format("%H:%M:%S").to_string())),
    ])];
    invocation.sink.finish(content).await;
}

async fn count_down(invocation: ToolInvocation) {
    let start: i64 = invocation
        .arguments
        .get("value")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut n = start;
    while n > 0 {
        invocation
            .sink
            .notify("count_down", serde_json::json!({"value": n}))
            .await;
        n -= 1;
    }
    invocation.sink.finish(vec![ContentItem::text("finish!")]).await;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    turbomcp::init_tracing();

    let get_current_time_tool = Tool {
        name: "get_current_time".to_string(),
        description: "Returns the current UTC date and time.".to_string(),
        input_schema: vec![],
        output_schema: vec![
            PropertySpec::required("date", PropertyType::String),
            PropertySpec::required("time", PropertyType::String),
        ],
        handler: Arc::new(|invocation| Box::pin(get_current_time(invocation))),
    };

    let count_down_tool = Tool {
        name: "count_down".to_string(),
        description: "Counts down from value to 1, then replies \"finish!\".".to_string(),
        input_schema: vec![PropertySpec::required("value", PropertyType::String)],
        output_schema: vec![],
        handler: Arc::new(|invocation| Box::pin(count_down(invocation))),
    };

    let server = ServerBuilder::new("time-server", "0.1.0")
        .stdio()
        .register_tool(get_current_time_tool)
        .register_tool(count_down_tool)
        .build()?;

    server.run().await?;
    Ok(())
}
