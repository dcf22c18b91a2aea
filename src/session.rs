//! Server-side session handler.
//!
//! One independent handler runs per accepted connection and walks the
//! lifecycle `Accepted → StreamOpened → Streaming → Closed`. Sessions
//! share nothing: each constructs its own frame source, so playback
//! restarts from the first file independently per session. Any read,
//! filter, encode, or write failure closes only the session it happened
//! on.

use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, trace};

use crate::codec;
use crate::compress;
use crate::error::{Result, StreamError};
use crate::filter;
use crate::provider::FrameProvider;
use crate::source::FrameSource;
use crate::types::Frame;
use crate::wire;

/// Stream-setup budget: a session that cannot open its outbound stream
/// within this window is discarded.
pub const STREAM_OPEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Streaming settings shared by every session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory of `.bin` frame files.
    pub frame_dir: PathBuf,
    /// Target emission rate, frames per second.
    pub fps: f64,
    /// Voxel leaf size applied before encoding.
    pub leaf_size: f32,
}

/// Turn one frame into its on-wire bytes: voxel filter, point record
/// encode, zstd unit, wire envelope.
pub fn encode_wire_frame(frame: &Frame, leaf_size: f32) -> Result<Vec<u8>> {
    let filtered = filter::voxel_filter(frame, leaf_size)?;
    let encoded = codec::serialize(&filtered);
    let compressed = compress::compress(&encoded)?;
    wire::encode(&compressed)
}

/// Streaming loop: pull paced frames from `source` and write their wire
/// encoding back-to-back onto `sink` until the source ends or any step
/// fails.
///
/// A compression failure aborts the session like every other encode
/// failure; nothing partial is ever written. The sink write blocks on
/// transport flow control, which in turn blocks frame production - that
/// is the only backpressure in the system.
pub async fn stream_frames<P, W>(source: &mut P, sink: &mut W, leaf_size: f32) -> Result<()>
where
    P: FrameProvider,
    W: AsyncWrite + Unpin,
{
    let mut frame_count = 0u64;
    loop {
        let frame = match source.next_frame().await? {
            Some(frame) => frame,
            None => {
                debug!("frame source ended after {frame_count} frames");
                return Ok(());
            }
        };

        let bytes = encode_wire_frame(&frame, leaf_size)?;
        sink.write_all(&bytes)
            .await
            .map_err(|e| StreamError::transport_with_source("stream write", Box::new(e)))?;

        frame_count += 1;
        trace!("frame {frame_count}: {} points, {} bytes on wire", frame.len(), bytes.len());
    }
}

/// Drive one accepted connection through its full lifecycle.
///
/// Opens exactly one outbound bidirectional stream (bounded by
/// [`STREAM_OPEN_TIMEOUT`]), then streams until a failure ends the
/// session. There is no reconnect or resume.
pub async fn handle_session(conn: quinn::Connection, config: SessionConfig) {
    let remote = conn.remote_address();
    info!("session accepted from {remote}");

    let open = tokio::time::timeout(STREAM_OPEN_TIMEOUT, conn.open_bi()).await;
    let (mut send, _recv) = match open {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            error!("session {remote}: stream open failed: {e}");
            return;
        }
        Err(_) => {
            error!(
                "session {remote}: stream open timed out after {:?}",
                STREAM_OPEN_TIMEOUT
            );
            return;
        }
    };
    debug!("session {remote}: stream opened");

    let mut source = match FrameSource::new(&config.frame_dir, config.fps) {
        Ok(source) => source,
        Err(e) => {
            error!("session {remote}: frame source: {e}");
            return;
        }
    };

    match stream_frames(&mut source, &mut send, config.leaf_size).await {
        Ok(()) => {
            let _ = send.finish();
            info!("session {remote}: closed");
        }
        Err(e) => {
            error!("session {remote}: closed: {e}");
        }
    }
}
