//! The mcp-finviz protocol gateway.
//!
//! Declares the single `analyse-stocks-forex-crypto` tool and the single
//! `finvizfinance://query_resources` resource, and dispatches inbound
//! JSON-RPC requests from the stdio stream to the snippet executor.

mod gateway;
mod stdio;

pub use gateway::{Gateway, GatewayConfig, RESOURCE_URI, TOOL_NAME};
pub use stdio::serve;
