//! Spawns `time_server` over stdio and walks through initialize, tools/list,
//! a streaming tools/call, and the two tools/call error paths.
//!
//! Usage: `time_client [path-to-time_server]` — defaults to the sibling
//! binary built alongside this one.

use turbomcp::{Client, StdioClientConfig, StdioClientTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    turbomcp::init_tracing();

    let server_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| default_server_path());

    let transport = StdioClientTransport::spawn(&server_path, &[], StdioClientConfig::default()).await?;
    let client = Client::new("time-client", "0.1.0", transport);

    let init = client.initialize().await?;
    println!(
        "initialized against {} {} (protocol {})",
        init.server_info.name, init.server_info.version, init.protocol_version
    );

    let tools = client.tools_list().await?;
    for tool in &tools {
        println!("tool: {} — {}", tool.name, tool.description);
    }

    let result = client
        .tools_call("count_down", serde_json::json!({"value": "3"}), |method, params| {
            println!("notification {method}: {params:?}");
            true
        })
        .await?;
    println!("count_down result: {result:?}");

    match client.tools_call("nope", serde_json::json!({}), |_, _| true).await {
        Ok(_) => println!("unexpected success calling an unknown tool"),
        Err(e) => println!("unknown tool rejected as expected: {e}"),
    }

    match client.tools_call("count_down", serde_json::json!({}), |_, _| true).await {
        Ok(_) => println!("unexpected success calling count_down with no arguments"),
        Err(e) => println!("missing required param rejected as expected: {e}"),
    }

    client.shutdown().await?;
    Ok(())
}

fn default_server_path() -> String {
    let mut path = std::env::current_exe().expect("current executable path");
    path.pop();
    path.push(if cfg!(windows) { "time_server.exe" } else { "time_server" });
    path.to_string_lossy().into_owned()
}
