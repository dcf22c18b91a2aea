//! Paced point-cloud frame streaming over QUIC.
//!
//! The server reads point-cloud frames from disk at a bounded rate, voxel
//! downsamples each one, encodes and zstd-compresses it, and writes it to
//! one bidirectional QUIC stream per session. The client reassembles
//! frames from the raw byte stream and fans them out to WebSocket viewer
//! subscribers.
//!
//! # Pipeline
//!
//! ```text
//! frame files → FrameSource → voxel_filter → codec → zstd → envelope
//!             → QUIC stream → StreamAssembler → Relay → viewers
//! ```
//!
//! # Example (frame encoding path)
//!
//! ```rust
//! use pointstream::session::encode_wire_frame;
//! use pointstream::{Frame, Point};
//!
//! let frame = Frame::new(vec![
//!     Point::new(0.0, 0.0, 0.0, 1.0),
//!     Point::new(2.0, 0.0, 0.0, 3.0),
//! ]);
//! let wire_bytes = encode_wire_frame(&frame, 0.1)?;
//! assert!(!wire_bytes.is_empty());
//! # Ok::<(), pointstream::StreamError>(())
//! ```

// Core types and error handling
mod error;
pub mod types;

// Frame processing pipeline
pub mod codec;
pub mod compress;
pub mod filter;
pub mod wire;

// Frame production
pub mod provider;
pub mod source;

// Server and client loops
pub mod assembler;
pub mod relay;
pub mod session;
pub mod transport;

// Core exports
pub use error::{Result, StreamError};
pub use provider::FrameProvider;
pub use relay::{Relay, RelayHandle};
pub use source::FrameSource;
pub use types::{Frame, Point};
