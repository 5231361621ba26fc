//! Line-framed JSON-RPC over the process stdio streams.
//!
//! The reader parses one frame per line and spawns a task per request,
//! so a long-running snippet never blocks unrelated requests. Responses
//! are funneled through a channel to a single writer task; stdout is the
//! protocol stream and nothing else may write to it.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use finviz_protocol::{JsonRpcError, JsonRpcMessage, JsonRpcResponse, RequestId};
use finviz_sandbox::CodeRunner;

use crate::gateway::Gateway;

/// Serve the gateway over stdin/stdout until the input stream closes.
pub async fn serve<R: CodeRunner + 'static>(gateway: Gateway<R>) -> Result<()> {
    let gateway = Arc::new(gateway);
    let (response_tx, mut response_rx) = mpsc::channel::<String>(32);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(frame) = response_rx.recv().await {
            stdout.write_all(frame.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read from stdin")?
    {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<JsonRpcMessage>(&line) {
            Ok(message) => {
                let gateway = Arc::clone(&gateway);
                let response_tx = response_tx.clone();
                tokio::spawn(async move {
                    if let Some(response) = gateway.handle_message(message).await {
                        send_response(&response_tx, &response).await;
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "discarding unparsable frame");
                let response = JsonRpcResponse::error(
                    RequestId::Null,
                    JsonRpcError::parse_error(format!("invalid JSON-RPC frame: {e}")),
                );
                send_response(&response_tx, &response).await;
            }
        }
    }

    debug!("stdin closed, shutting down");
    drop(response_tx);
    writer
        .await
        .context("writer task panicked")?
        .context("failed to write to stdout")?;
    Ok(())
}

async fn send_response(tx: &mpsc::Sender<String>, response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(frame) => {
            if tx.send(frame).await.is_err() {
                error!("response writer is gone");
            }
        }
        Err(e) => error!(error = %e, "failed to encode response"),
    }
}
