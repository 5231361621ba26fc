//! Request dispatch: tool and resource surface of the server.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use finviz_protocol::{
    CallToolResult, Implementation, InitializeResult, JsonRpcError, JsonRpcMessage,
    JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, ListResourcesResult, ListToolsResult,
    ReadResourceResult, Resource, ResourceCapabilities, ServerCapabilities, TextContent,
    TextResourceContents, Tool, ToolCapabilities, PROTOCOL_VERSION,
};
use finviz_sandbox::{code_snippet_schema, serialize, CodeRunner};

/// The single invocable tool.
pub const TOOL_NAME: &str = "analyse-stocks-forex-crypto";

/// The single readable resource.
pub const RESOURCE_URI: &str = "finvizfinance://query_resources";

const URI_PREFIX: &str = "finvizfinance://";

const RESOURCE_MIME_TYPE: &str = "application/json";

/// Server identity and instructions. The source system carried a no-op
/// session object at this spot; all fields default.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server_name: String,
    pub server_version: String,
    pub instructions: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            server_name: "mcp_finviz".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
        }
    }
}

/// Stateless per-request dispatcher. Shared read-only across the tasks
/// the stdio loop spawns.
pub struct Gateway<R> {
    config: GatewayConfig,
    runner: Arc<R>,
}

impl<R: CodeRunner> Gateway<R> {
    pub fn new(runner: R, config: GatewayConfig) -> Self {
        Self {
            config,
            runner: Arc::new(runner),
        }
    }

    /// Handle one inbound frame. Requests produce a response;
    /// notifications and stray responses produce none.
    pub async fn handle_message(&self, message: JsonRpcMessage) -> Option<JsonRpcResponse> {
        match message {
            JsonRpcMessage::Request(req) => Some(self.handle_request(req).await),
            JsonRpcMessage::Notification(notif) => {
                self.handle_notification(notif);
                None
            }
            JsonRpcMessage::Response(resp) => {
                warn!(id = %resp.id, "ignoring unexpected response frame");
                None
            }
        }
    }

    async fn handle_request(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        debug!(method = %req.method, id = %req.id, "handling request");

        let result = match req.method.as_str() {
            "initialize" => self.handle_initialize(),
            "ping" => Ok(json!({})),
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tools_call(req.params).await,
            "resources/list" => self.handle_resources_list(),
            "resources/read" => self.handle_resources_read(req.params),
            other => Err(JsonRpcError::method_not_found(other)),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(req.id, value),
            Err(error) => JsonRpcResponse::error(req.id, error),
        }
    }

    fn handle_notification(&self, notif: JsonRpcNotification) {
        match notif.method.as_str() {
            "notifications/initialized" => info!("client initialized"),
            other => debug!(method = %other, "ignoring notification"),
        }
    }

    fn handle_initialize(&self) -> Result<Value, JsonRpcError> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolCapabilities {
                    list_changed: Some(false),
                }),
                resources: Some(ResourceCapabilities {
                    list_changed: Some(false),
                    subscribe: Some(false),
                }),
            },
            server_info: Implementation::new(&self.config.server_name, &self.config.server_version),
            instructions: self.config.instructions.clone(),
        };
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::internal_error(format!("encoding failed: {e}")))
    }

    fn handle_tools_list(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult {
            tools: vec![Tool {
                name: TOOL_NAME.to_string(),
                description: "Execute a code snippet using the finvizfinance SDK.".to_string(),
                input_schema: code_snippet_schema(
                    "Python code using finvizfinance SDK. \
                     Assign the result to a variable named 'result'.",
                ),
            }],
        };
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::internal_error(format!("encoding failed: {e}")))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;
        if name != TOOL_NAME {
            return Err(JsonRpcError::invalid_params(format!("Unknown tool: {name}")));
        }

        let code = params
            .get("arguments")
            .and_then(|args| args.get("code"))
            .and_then(Value::as_str)
            .ok_or_else(|| {
                JsonRpcError::invalid_params("Missing required argument 'code' (string)")
            })?;
        if code.trim().is_empty() {
            return Err(JsonRpcError::invalid_params(
                "Argument 'code' must be a non-empty string",
            ));
        }

        let outcome = self.runner.run(code).await;
        let result = CallToolResult {
            content: vec![TextContent::new(serialize(&outcome))],
            is_error: if outcome.is_success() {
                None
            } else {
                Some(true)
            },
        };
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::internal_error(format!("encoding failed: {e}")))
    }

    fn handle_resources_list(&self) -> Result<Value, JsonRpcError> {
        let result = ListResourcesResult {
            resources: vec![Resource {
                uri: RESOURCE_URI.to_string(),
                name: "Finviz SDK Query".to_string(),
                description: "Execute code snippets using finvizfinance".to_string(),
                mime_type: RESOURCE_MIME_TYPE.to_string(),
            }],
        };
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::internal_error(format!("encoding failed: {e}")))
    }

    fn handle_resources_read(&self, params: Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params.ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcError::invalid_params("Missing resource uri"))?;

        let Some(path) = uri.strip_prefix(URI_PREFIX) else {
            let scheme = uri.split("://").next().unwrap_or(uri);
            return Err(JsonRpcError::invalid_params(format!(
                "Unsupported URI scheme: {scheme}"
            )));
        };
        if path != "query_resources" {
            return Err(JsonRpcError::invalid_params(format!(
                "Unknown resource path: {path}"
            )));
        }

        let message = json!({
            "message": format!(
                "Use the tool {TOOL_NAME} to submit a finvizfinance SDK code snippet."
            )
        });
        let result = ReadResourceResult {
            contents: vec![TextResourceContents {
                uri: RESOURCE_URI.to_string(),
                mime_type: RESOURCE_MIME_TYPE.to_string(),
                text: message.to_string(),
            }],
        };
        serde_json::to_value(result)
            .map_err(|e| JsonRpcError::internal_error(format!("encoding failed: {e}")))
    }
}
