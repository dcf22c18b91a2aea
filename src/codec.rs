//! Canonical point record byte layout.
//!
//! Every point occupies exactly 16 bytes: four consecutive little-endian
//! `f32` fields `[x, y, z, intensity]`. This layout is shared by frame
//! files on disk, pre-compression transport payloads, and in-memory bench
//! buffers; nothing else in the system defines a second encoding.

use crate::error::{Result, StreamError};
use crate::types::{Frame, Point};

/// Serialize a frame into its canonical byte layout.
///
/// Frame-record order is preserved exactly as given; this step never
/// reorders.
pub fn serialize(frame: &Frame) -> Vec<u8> {
    let mut buf = Vec::with_capacity(frame.len() * Point::RECORD_LEN);
    for p in frame {
        buf.extend_from_slice(&p.x.to_le_bytes());
        buf.extend_from_slice(&p.y.to_le_bytes());
        buf.extend_from_slice(&p.z.to_le_bytes());
        buf.extend_from_slice(&p.intensity.to_le_bytes());
    }
    buf
}

/// Deserialize a canonical byte payload back into a frame.
///
/// The input length must be an exact multiple of [`Point::RECORD_LEN`];
/// any remainder is a malformed-payload error.
pub fn deserialize(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() % Point::RECORD_LEN != 0 {
        return Err(StreamError::malformed(
            "point record decode",
            format!(
                "payload length {} is not a multiple of {}",
                bytes.len(),
                Point::RECORD_LEN
            ),
        ));
    }

    let mut points = Vec::with_capacity(bytes.len() / Point::RECORD_LEN);
    for rec in bytes.chunks_exact(Point::RECORD_LEN) {
        points.push(Point {
            x: f32::from_le_bytes([rec[0], rec[1], rec[2], rec[3]]),
            y: f32::from_le_bytes([rec[4], rec[5], rec[6], rec[7]]),
            z: f32::from_le_bytes([rec[8], rec[9], rec[10], rec[11]]),
            intensity: f32::from_le_bytes([rec[12], rec[13], rec[14], rec[15]]),
        });
    }
    Ok(Frame::new(points))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn roundtrip_preserves_order_and_values() {
        let frame = Frame::new(vec![
            Point::new(1.0, -2.5, 3.25, 10.0),
            Point::new(0.0, 0.0, 0.0, 0.0),
            Point::new(-100.5, 42.0, 7.125, 255.0),
        ]);

        let bytes = serialize(&frame);
        assert_eq!(bytes.len(), frame.len() * Point::RECORD_LEN);

        let decoded = deserialize(&bytes).expect("valid payload");
        assert_eq!(decoded, frame);
    }

    #[test]
    fn empty_payload_is_an_empty_frame() {
        let decoded = deserialize(&[]).expect("empty payload is valid");
        assert!(decoded.is_empty());
    }

    #[test]
    fn trailing_remainder_is_rejected() {
        let frame = Frame::new(vec![Point::new(1.0, 2.0, 3.0, 4.0)]);
        let mut bytes = serialize(&frame);
        bytes.push(0xAB);

        let err = deserialize(&bytes).unwrap_err();
        assert!(matches!(err, StreamError::MalformedFrame { .. }));
    }

    #[test]
    fn known_layout_is_little_endian() {
        let frame = Frame::new(vec![Point::new(1.0, 2.0, 3.0, 4.0)]);
        let bytes = serialize(&frame);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[4..8], &2.0f32.to_le_bytes());
        assert_eq!(&bytes[8..12], &3.0f32.to_le_bytes());
        assert_eq!(&bytes[12..16], &4.0f32.to_le_bytes());
    }

    proptest! {
        #[test]
        fn roundtrip_is_exact_for_arbitrary_frames(
            raw in prop::collection::vec((-1e6f32..1e6, -1e6f32..1e6, -1e6f32..1e6, 0f32..65536.0), 0..256)
        ) {
            let frame: Frame = raw
                .into_iter()
                .map(|(x, y, z, i)| Point::new(x, y, z, i))
                .collect();

            let decoded = deserialize(&serialize(&frame)).expect("valid payload");
            prop_assert_eq!(decoded, frame);
        }
    }
}
