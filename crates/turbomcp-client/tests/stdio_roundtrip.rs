//! End-to-end `initialize` over a real child process speaking one canned
//! reply, exercising the stdio leg of `ClientTransport` without a real
//! MCP server binary.

use turbomcp_client::Client;
use turbomcp_stdio::{StdioClientConfig, StdioClientTransport};

const CANNED_REPLY: &str = r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2025-06-18","capabilities":{"logging":{},"tools":{}},"serverInfo":{"name":"echo-server","version":"9.9.9"}}}"#;

#[tokio::test]
async fn initialize_round_trips_through_a_shell_child() {
    let script = format!("read _line; printf '%s\\n' '{CANNED_REPLY}'; sleep 0.3");
    let transport = StdioClientTransport::spawn(
        "sh",
        &["-c".to_string(), script],
        StdioClientConfig::default(),
    )
    .await
    .unwrap();

    let client = Client::new("test-client", "0.1.0", transport);
    let result = client.initialize().await.unwrap();

    assert_eq!(result.protocol_version, "2025-06-18");
    assert_eq!(result.server_info.name, "echo-server");
    assert_eq!(result.server_info.version, "9.9.9");

    client.shutdown().await.unwrap();
}
