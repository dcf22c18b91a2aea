//! QUIC point-cloud streaming client and viewer relay.
//!
//! Connects to the streaming server, reassembles frames from the raw
//! stream, and fans each one out to WebSocket viewers. No CLI surface:
//! the transport target and local relay port are fixed.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pointstream::{Relay, assembler, codec, transport};

/// Fixed server endpoint this client pairs with.
const SERVER_ADDR: &str = "127.0.0.1:4242";
const SERVER_NAME: &str = "localhost";

/// Local WebSocket endpoint viewers subscribe to.
const RELAY_ADDR: &str = "127.0.0.1:8080";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let relay = Relay::bind(RELAY_ADDR.parse().context("relay address")?).await?;
    let relay_handle = relay.handle();

    let endpoint = transport::client_endpoint()?;
    info!("connecting to QUIC server at {SERVER_ADDR}");
    let conn = endpoint
        .connect(SERVER_ADDR.parse().context("server address")?, SERVER_NAME)
        .context("connection setup")?
        .await
        .context("QUIC handshake")?;
    info!("QUIC connection established");

    let (_send, mut recv) = conn.accept_bi().await.context("accepting data stream")?;
    info!("data stream open");

    // Recovered frames are re-serialized through the canonical codec and
    // handed to the relay for viewer fan-out.
    let (frames_tx, mut frames_rx) = mpsc::channel::<pointstream::Frame>(16);
    let forward = tokio::spawn(async move {
        while let Some(frame) = frames_rx.recv().await {
            debug!("relaying frame with {} points", frame.len());
            if !relay_handle.publish(codec::serialize(&frame)).await {
                break;
            }
        }
    });

    assembler::run(&mut recv, &frames_tx).await?;
    drop(frames_tx);
    forward.await.context("relay forwarding task")?;

    info!("stream ended");
    Ok(())
}
