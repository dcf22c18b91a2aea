//! Voxel-grid spatial downsampling.

use std::collections::HashSet;

use crate::error::{Result, StreamError};
use crate::types::{Frame, Point};

/// Downsample a frame to at most one point per occupied voxel cell.
///
/// Cell keys are computed by independent per-axis floor division by
/// `leaf_size`. The first point seen in a cell is kept as that cell's
/// representative; there is no averaging or centroid computation.
///
/// Retained points are emitted in input order, so the output is
/// deterministic across runs for identical input.
///
/// A non-finite or non-positive leaf size is a configuration error.
pub fn voxel_filter(frame: &Frame, leaf_size: f32) -> Result<Frame> {
    if !leaf_size.is_finite() || leaf_size <= 0.0 {
        return Err(StreamError::config(format!(
            "voxel leaf size must be positive and finite, got {leaf_size}"
        )));
    }

    let mut occupied: HashSet<[i64; 3]> = HashSet::with_capacity(frame.len());
    let mut kept = Vec::new();
    for p in frame {
        if occupied.insert(cell_key(p, leaf_size)) {
            kept.push(*p);
        }
    }
    Ok(Frame::new(kept))
}

fn cell_key(p: &Point, leaf_size: f32) -> [i64; 3] {
    [
        (p.x / leaf_size).floor() as i64,
        (p.y / leaf_size).floor() as i64,
        (p.z / leaf_size).floor() as i64,
    ]
}
