//! Wire envelope for compressed frames.
//!
//! Each frame travels as a fixed-width little-endian `u32` payload length
//! followed by exactly that many compressed bytes:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ payload_len  (u32, little-endian)       │
//! │ payload      [payload_len bytes]        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Envelopes are written back-to-back on the stream; the length field is
//! the only delimiter. An advertised length above [`MAX_PAYLOAD`] is a
//! protocol violation, not a frame worth waiting for, which keeps the
//! receiver's accumulation buffer bounded.

use crate::error::{Result, StreamError};

/// Envelope header size in bytes.
pub const HEADER_LEN: usize = 4;

/// Largest payload length a peer may advertise.
pub const MAX_PAYLOAD: usize = 64 * 1024 * 1024;

/// Wrap a compressed payload in its wire envelope.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD {
        return Err(StreamError::malformed(
            "envelope encode",
            format!("payload length {} exceeds {}", payload.len(), MAX_PAYLOAD),
        ));
    }
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    Ok(out)
}

/// Try to take one complete envelope off the front of `buf`.
///
/// Returns `Ok(Some(payload))` and drains the consumed bytes when a whole
/// envelope is buffered, `Ok(None)` when more bytes are needed, and an
/// error when the advertised length exceeds [`MAX_PAYLOAD`].
pub fn try_take(buf: &mut Vec<u8>) -> Result<Option<Vec<u8>>> {
    if buf.len() < HEADER_LEN {
        return Ok(None);
    }
    let len = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > MAX_PAYLOAD {
        return Err(StreamError::malformed(
            "envelope header",
            format!("advertised payload length {len} exceeds {MAX_PAYLOAD}"),
        ));
    }
    if buf.len() < HEADER_LEN + len {
        return Ok(None);
    }
    let payload = buf[HEADER_LEN..HEADER_LEN + len].to_vec();
    buf.drain(..HEADER_LEN + len);
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_through_the_envelope() {
        let payload = b"compressed frame bytes".to_vec();
        let mut buf = encode(&payload).expect("encode");
        let taken = try_take(&mut buf).expect("well-formed").expect("complete");
        assert_eq!(taken, payload);
        assert!(buf.is_empty());
    }

    #[test]
    fn partial_envelopes_wait_for_more_bytes() {
        let encoded = encode(b"0123456789").expect("encode");

        // Header alone, then header plus a partial body.
        let mut buf = encoded[..3].to_vec();
        assert!(try_take(&mut buf).expect("well-formed").is_none());
        assert_eq!(buf.len(), 3);

        buf.extend_from_slice(&encoded[3..8]);
        assert!(try_take(&mut buf).expect("well-formed").is_none());
        assert_eq!(buf.len(), 8);

        buf.extend_from_slice(&encoded[8..]);
        let taken = try_take(&mut buf).expect("well-formed").expect("complete");
        assert_eq!(taken, b"0123456789");
    }

    #[test]
    fn back_to_back_envelopes_drain_in_order() {
        let mut buf = encode(b"first").expect("encode");
        buf.extend(encode(b"second").expect("encode"));

        assert_eq!(try_take(&mut buf).unwrap().unwrap(), b"first");
        assert_eq!(try_take(&mut buf).unwrap().unwrap(), b"second");
        assert!(try_take(&mut buf).unwrap().is_none());
    }

    #[test]
    fn oversized_length_is_a_protocol_error() {
        let mut buf = ((MAX_PAYLOAD + 1) as u32).to_le_bytes().to_vec();
        let err = try_take(&mut buf).unwrap_err();
        assert!(matches!(err, StreamError::MalformedFrame { .. }));
    }
}
