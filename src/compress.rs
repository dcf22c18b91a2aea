//! One-shot zstd compression units.
//!
//! Every call compresses or decompresses a complete, self-contained unit:
//! the entire serialized frame goes in as one buffer and comes out as one
//! buffer. There is no intra-frame streaming state.

use std::io::Cursor;

use crate::error::{Result, StreamError};

/// zstd level used for every frame. Level 3 balances ratio against the
/// per-frame latency budget.
const COMPRESSION_LEVEL: i32 = 3;

/// Upper bound on a single decompressed frame payload. Anything larger is
/// treated as malformed rather than decoded.
pub const MAX_DECOMPRESSED_LEN: usize = 64 * 1024 * 1024;

/// Compress one frame payload into a standalone zstd unit.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    zstd::encode_all(Cursor::new(data), COMPRESSION_LEVEL)
        .map_err(|e| StreamError::compression("zstd encode", e))
}

/// Decompress one standalone zstd unit.
///
/// Fails with a compression error on truncated or non-conforming input,
/// and with a malformed-payload error when the decompressed size exceeds
/// [`MAX_DECOMPRESSED_LEN`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let out = zstd::decode_all(Cursor::new(data))
        .map_err(|e| StreamError::compression("zstd decode", e))?;
    if out.len() > MAX_DECOMPRESSED_LEN {
        return Err(StreamError::malformed(
            "zstd decode",
            format!("decompressed size {} exceeds cap {}", out.len(), MAX_DECOMPRESSED_LEN),
        ));
    }
    Ok(out)
}
