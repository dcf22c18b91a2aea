//! Provider trait for frame sources

use crate::error::Result;
use crate::types::Frame;

/// Trait for paced frame sources.
///
/// Providers own their timing: `next_frame` returns no sooner than the
/// source's emission schedule allows. The session loop depends on this
/// seam rather than on a concrete reader, so tests can substitute
/// scripted sources.
#[async_trait::async_trait]
pub trait FrameProvider: Send + 'static {
    /// Get the next frame, honoring the source's pacing.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` - next frame, ready to encode
    /// - `Ok(None)` - source ended (a cyclic disk source never does)
    /// - `Err(e)` - fatal read failure; the caller does not retry
    async fn next_frame(&mut self) -> Result<Option<Frame>>;
}
