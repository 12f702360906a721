//! Stream transport: line-delimited JSON-RPC on stdin/stdout
//!
//! One session for the life of the process. Nothing but protocol frames is
//! written to stdout.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use agent_core::{Agent, SessionId};

use crate::protocol::{JsonRpcError, JsonRpcResponse};
use crate::session::{CHANNEL_CAPACITY, SessionChannel, run_session};

pub async fn serve(agent: Arc<Agent>) -> anyhow::Result<()> {
    tracing::info!("Serving MCP over stdio");
    serve_io(agent, tokio::io::stdin(), tokio::io::stdout()).await
}

/// Run one session over any reader/writer pair; returns at EOF
pub async fn serve_io<R, W>(agent: Arc<Agent>, reader: R, writer: W) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (inbound_tx, inbound_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(CHANNEL_CAPACITY);

    // parse errors are answered here, on a clone of the outbound side
    let replies = outbound_tx.clone();
    let channel = SessionChannel::new(inbound_rx, outbound_tx);
    let session = tokio::spawn(run_session(agent, SessionId::new(), channel));
    let writer = tokio::spawn(write_frames(writer, outbound_rx));

    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut read_error = None;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "Reading stdin failed");
                read_error = Some(e);
                break;
            }
        }

        let frame = buf.trim_ascii();
        if frame.is_empty() {
            continue;
        }

        match serde_json::from_slice::<Value>(frame) {
            Ok(message) => {
                if inbound_tx.send(message).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unparsable frame on stdin");
                let reply = JsonRpcResponse::failure(None, JsonRpcError::parse_error(&e));
                if replies.send(reply.into_value()).await.is_err() {
                    break;
                }
            }
        }
    }

    // let the session finish and flush its replies before returning
    tracing::debug!("stdin closed");
    drop(inbound_tx);
    drop(replies);
    session.await?;
    writer.await??;

    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

async fn write_frames<W>(mut writer: W, mut frames: mpsc::Receiver<Value>) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = frames.recv().await {
        let mut line = serde_json::to_string(&frame)?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
    }
    Ok(())
}
