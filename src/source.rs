//! Paced cyclic frame reader over a directory of frame files.

use std::path::{Path, PathBuf};

use tokio::time::{Duration, Instant, sleep};
use tracing::{info, trace};

use crate::codec;
use crate::error::{Result, StreamError};
use crate::provider::FrameProvider;
use crate::types::Frame;

/// Reads `.bin` frame files from a directory in name order, cycling back
/// to the first file after the last, at no more than a target frame rate.
///
/// The file set is discovered once at construction and fixed for the
/// source's lifetime. Pacing compensates for variable per-frame
/// processing cost: each call sleeps only the remainder of the frame
/// interval since the previous successful emission.
#[derive(Debug)]
pub struct FrameSource {
    files: Vec<PathBuf>,
    next_index: usize,
    frame_interval: Duration,
    last_emit: Option<Instant>,
}

impl FrameSource {
    /// Scan `dir` for frame files and build a source pacing at `fps`
    /// frames per second.
    ///
    /// An empty file set or a non-positive frame rate is a configuration
    /// error.
    pub fn new<P: AsRef<Path>>(dir: P, fps: f64) -> Result<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(StreamError::config(format!(
                "frame rate must be positive and finite, got {fps}"
            )));
        }

        let dir = dir.as_ref();
        let mut files = list_frame_files(dir)?;
        if files.is_empty() {
            return Err(StreamError::config(format!(
                "no .bin frame files in {}",
                dir.display()
            )));
        }
        files.sort();

        info!("{} frame files in {}", files.len(), dir.display());

        Ok(Self {
            files,
            next_index: 0,
            frame_interval: Duration::from_secs_f64(1.0 / fps),
            last_emit: None,
        })
    }

    /// Number of frame files in the cycle.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Minimum interval between consecutive emissions.
    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    async fn pace(&mut self) {
        if let Some(last) = self.last_emit {
            let elapsed = last.elapsed();
            if elapsed < self.frame_interval {
                sleep(self.frame_interval - elapsed).await;
            }
        }
    }
}

#[async_trait::async_trait]
impl FrameProvider for FrameSource {
    async fn next_frame(&mut self) -> Result<Option<Frame>> {
        self.pace().await;

        if self.next_index >= self.files.len() {
            self.next_index = 0;
        }
        let path = &self.files[self.next_index];

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| StreamError::file_error(path.clone(), e))?;
        let frame = codec::deserialize(&bytes)?;

        trace!("frame {} from {} ({} points)", self.next_index, path.display(), frame.len());

        // The emission clock moves only on success.
        self.next_index += 1;
        self.last_emit = Some(Instant::now());

        Ok(Some(frame))
    }
}

fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| StreamError::config(format!("cannot read frame directory {}: {e}", dir.display())))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry =
            entry.map_err(|e| StreamError::config(format!("cannot list {}: {e}", dir.display())))?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "bin") {
            files.push(path);
        }
    }
    Ok(files)
}
