//! Wire types for the mcp-finviz server.
//!
//! JSON-RPC 2.0 framing plus the subset of MCP (Model Context Protocol)
//! structures this server speaks: the initialize handshake, tool and
//! resource listings, tool-call results and resource contents.

mod jsonrpc;
mod mcp;

pub use jsonrpc::{
    JsonRpcError, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse, RequestId,
    JSONRPC_VERSION,
};
pub use mcp::{
    CallToolResult, Implementation, InitializeResult, ListResourcesResult, ListToolsResult,
    ReadResourceResult, Resource, ResourceCapabilities, ServerCapabilities, TextContent,
    TextResourceContents, Tool, ToolCapabilities, PROTOCOL_VERSION,
};
