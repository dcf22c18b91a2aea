//! Client-side stream reassembly.
//!
//! The transport carries an unbroken concatenation of wire envelopes;
//! nothing else marks where one frame ends. The assembler accumulates raw
//! chunks and drains every envelope that has become complete, so a frame
//! split across arbitrary chunk boundaries decodes identically to one
//! delivered whole.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::codec;
use crate::compress;
use crate::error::{Result, StreamError};
use crate::types::Frame;
use crate::wire;

/// Transport read granularity.
pub const READ_CHUNK_LEN: usize = 32 * 1024;

/// Incremental frame reassembler over the accumulation buffer.
///
/// The buffer grows only while an envelope is incomplete and is drained
/// as each one completes; [`wire::MAX_PAYLOAD`] bounds how large it can
/// get before the stream is declared broken.
#[derive(Debug, Default)]
pub struct StreamAssembler {
    buf: Vec<u8>,
}

impl StreamAssembler {
    /// Create an assembler with an empty accumulation buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes waiting for their envelope to complete.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Append `chunk` and decode every frame now complete.
    ///
    /// A decompression or decode failure on a complete envelope is
    /// corruption, not a request for more bytes, and fails the stream.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(payload) = wire::try_take(&mut self.buf)? {
            let raw = compress::decompress(&payload)?;
            frames.push(codec::deserialize(&raw)?);
        }
        Ok(frames)
    }
}

/// Per-connection read loop.
///
/// Reads up to [`READ_CHUNK_LEN`] bytes at a time into the assembler and
/// forwards each recovered frame into `frames`. Stream closure by the
/// peer terminates cleanly; any other read failure is a transport error.
/// A dropped receiver also ends the loop cleanly.
pub async fn run<R>(transport: &mut R, frames: &mpsc::Sender<Frame>) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut assembler = StreamAssembler::new();
    let mut chunk = vec![0u8; READ_CHUNK_LEN];

    loop {
        let n = transport
            .read(&mut chunk)
            .await
            .map_err(|e| StreamError::transport_with_source("stream read", Box::new(e)))?;
        if n == 0 {
            debug!("stream closed by peer ({} bytes left buffered)", assembler.buffered());
            return Ok(());
        }
        trace!("received {n} bytes");

        for frame in assembler.push(&chunk[..n])? {
            trace!("recovered frame with {} points", frame.len());
            if frames.send(frame).await.is_err() {
                debug!("frame receiver dropped, shutting down");
                return Ok(());
            }
        }
    }
}
