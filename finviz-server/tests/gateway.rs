//! Gateway dispatch tests over a stub runner, plus end-to-end checks
//! against the real snippet executor.

use async_trait::async_trait;
use serde_json::{json, Value};

use finviz_protocol::{JsonRpcMessage, JsonRpcRequest, JsonRpcResponse, RequestId};
use finviz_sandbox::{
    CapabilityNamespace, CapturedValue, CodeRunner, ExecutionError, ExecutionLimits, ModulePolicy,
    Outcome, SnippetExecutor,
};
use finviz_server::{Gateway, GatewayConfig, RESOURCE_URI, TOOL_NAME};

/// Runner that answers with the snippet length, or fails when the
/// snippet contains "boom".
struct StubRunner;

#[async_trait]
impl CodeRunner for StubRunner {
    async fn run(&self, code: &str) -> Outcome {
        if code.contains("boom") {
            Outcome::Failure(ExecutionError::Runtime {
                message: "boom".to_string(),
            })
        } else {
            Outcome::Success(CapturedValue::Json(json!(code.len())))
        }
    }
}

fn stub_gateway() -> Gateway<StubRunner> {
    Gateway::new(StubRunner, GatewayConfig::default())
}

async fn request<R: CodeRunner>(
    gateway: &Gateway<R>,
    method: &str,
    params: Option<Value>,
) -> JsonRpcResponse {
    let req = JsonRpcRequest::new(RequestId::Number(1), method, params);
    gateway
        .handle_message(JsonRpcMessage::Request(req))
        .await
        .expect("request must produce a response")
}

#[tokio::test]
async fn test_initialize_handshake() {
    let resp = request(&stub_gateway(), "initialize", Some(json!({}))).await;
    let result = resp.result.unwrap();
    assert_eq!(result["protocolVersion"], json!("2024-11-05"));
    assert_eq!(result["serverInfo"]["name"], json!("mcp_finviz"));
    assert!(result["capabilities"]["tools"].is_object());
    assert!(result["capabilities"]["resources"].is_object());
}

#[tokio::test]
async fn test_tools_list_declares_one_tool() {
    let resp = request(&stub_gateway(), "tools/list", None).await;
    let result = resp.result.unwrap();
    let tools = result["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0]["name"], json!(TOOL_NAME));
    assert_eq!(tools[0]["inputSchema"]["properties"]["code"]["type"], json!("string"));
    assert_eq!(tools[0]["inputSchema"]["required"], json!(["code"]));
}

#[tokio::test]
async fn test_tools_call_success() {
    let params = json!({"name": TOOL_NAME, "arguments": {"code": "result = 2 + 2"}});
    let resp = request(&stub_gateway(), "tools/call", Some(params)).await;
    let result = resp.result.unwrap();
    assert_eq!(result["content"][0]["type"], json!("text"));
    assert_eq!(result["content"][0]["text"], json!("14"));
    assert!(result.get("isError").is_none());
}

#[tokio::test]
async fn test_tools_call_failure_is_text_not_error() {
    let params = json!({"name": TOOL_NAME, "arguments": {"code": "boom"}});
    let resp = request(&stub_gateway(), "tools/call", Some(params)).await;
    assert!(resp.error.is_none());
    let result = resp.result.unwrap();
    assert_eq!(
        result["content"][0]["text"],
        json!("RuntimeExecutionError: boom")
    );
    assert_eq!(result["isError"], json!(true));
}

#[tokio::test]
async fn test_tools_call_unknown_tool() {
    let params = json!({"name": "bogus", "arguments": {"code": "result = 1"}});
    let resp = request(&stub_gateway(), "tools/call", Some(params)).await;
    let error = resp.error.unwrap();
    assert!(error.message.contains("Unknown tool: bogus"));
}

#[tokio::test]
async fn test_tools_call_rejects_missing_or_empty_code() {
    let resp = request(
        &stub_gateway(),
        "tools/call",
        Some(json!({"name": TOOL_NAME, "arguments": {}})),
    )
    .await;
    assert!(resp.error.unwrap().message.contains("'code'"));

    let resp = request(
        &stub_gateway(),
        "tools/call",
        Some(json!({"name": TOOL_NAME, "arguments": {"code": "   "}})),
    )
    .await;
    assert!(resp.error.unwrap().message.contains("non-empty"));
}

#[tokio::test]
async fn test_resources_list() {
    let resp = request(&stub_gateway(), "resources/list", None).await;
    let result = resp.result.unwrap();
    let resources = result["resources"].as_array().unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0]["uri"], json!(RESOURCE_URI));
    assert_eq!(resources[0]["mimeType"], json!("application/json"));
}

#[tokio::test]
async fn test_resources_read_well_known_uri() {
    let resp = request(
        &stub_gateway(),
        "resources/read",
        Some(json!({"uri": RESOURCE_URI})),
    )
    .await;
    let result = resp.result.unwrap();
    let text = result["contents"][0]["text"].as_str().unwrap();
    let body: Value = serde_json::from_str(text).unwrap();
    assert!(body["message"].as_str().unwrap().contains(TOOL_NAME));
}

#[tokio::test]
async fn test_resources_read_rejects_foreign_scheme() {
    let resp = request(
        &stub_gateway(),
        "resources/read",
        Some(json!({"uri": "http://x"})),
    )
    .await;
    assert!(resp
        .error
        .unwrap()
        .message
        .contains("Unsupported URI scheme: http"));
}

#[tokio::test]
async fn test_resources_read_rejects_unknown_path() {
    let resp = request(
        &stub_gateway(),
        "resources/read",
        Some(json!({"uri": "finvizfinance://bogus"})),
    )
    .await;
    assert!(resp
        .error
        .unwrap()
        .message
        .contains("Unknown resource path: bogus"));
}

#[tokio::test]
async fn test_unknown_method() {
    let resp = request(&stub_gateway(), "prompts/list", None).await;
    assert_eq!(resp.error.unwrap().code, -32601);
}

#[tokio::test]
async fn test_notification_produces_no_response() {
    let raw = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
    let msg: JsonRpcMessage = serde_json::from_value(raw).unwrap();
    assert!(stub_gateway().handle_message(msg).await.is_none());
}

fn sandbox_gateway() -> Gateway<SnippetExecutor> {
    let executor = SnippetExecutor::new(
        CapabilityNamespace::empty(),
        ModulePolicy::baseline(),
        ExecutionLimits::default(),
    );
    Gateway::new(executor, GatewayConfig::default())
}

#[tokio::test]
async fn test_end_to_end_arithmetic() {
    let params = json!({"name": TOOL_NAME, "arguments": {"code": "result = 2 + 2"}});
    let resp = request(&sandbox_gateway(), "tools/call", Some(params)).await;
    let result = resp.result.unwrap();
    assert_eq!(result["content"][0]["text"], json!("4"));
}

#[tokio::test]
async fn test_end_to_end_denied_import() {
    let params = json!({
        "name": TOOL_NAME,
        "arguments": {"code": "import os\nresult = os.listdir('/')"}
    });
    let resp = request(&sandbox_gateway(), "tools/call", Some(params)).await;
    let result = resp.result.unwrap();
    assert_eq!(
        result["content"][0]["text"],
        json!("CapabilityDeniedError: module 'os' is not allowed")
    );
    assert_eq!(result["isError"], json!(true));
}
