//! Error types for the streaming pipeline.
//!
//! ## Error Categories
//!
//! - **Configuration errors**: bad frame directory, bad leaf size or frame
//!   rate, unloadable TLS material. Fatal at startup; the process does not
//!   proceed.
//! - **File errors**: a frame file could not be read. Fatal for the owning
//!   session only.
//! - **Malformed frame errors**: a byte payload that does not describe a
//!   whole number of point records, or a wire envelope violating its bounds.
//! - **Compression errors**: zstd failed to produce or consume a
//!   compression unit.
//! - **Transport errors**: connection, stream, or relay socket failures.
//!   Terminate the session; there is no retry or reconnect anywhere.
//! - **Timeouts**: a bounded setup step (stream open) did not finish.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for streaming operations.
pub type Result<T, E = StreamError> = std::result::Result<T, E>;

/// Main error type for the frame streaming pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StreamError {
    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("frame file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed frame payload in {context}: {details}")]
    MalformedFrame { context: String, details: String },

    #[error("compression error in {context}")]
    Compression {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("operation timed out after {duration:?}")]
    Timeout { duration: Duration },
}

impl StreamError {
    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        StreamError::Config { reason: reason.into() }
    }

    /// Helper constructor for frame file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        StreamError::File { path, source }
    }

    /// Helper constructor for malformed payload errors.
    pub fn malformed(context: impl Into<String>, details: impl Into<String>) -> Self {
        StreamError::MalformedFrame { context: context.into(), details: details.into() }
    }

    /// Helper constructor for compression errors.
    pub fn compression(context: impl Into<String>, source: std::io::Error) -> Self {
        StreamError::Compression { context: context.into(), source }
    }

    /// Helper constructor for transport errors.
    pub fn transport(reason: impl Into<String>) -> Self {
        StreamError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport errors with a source.
    pub fn transport_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        StreamError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Whether the error ends one session rather than the process.
    ///
    /// Configuration errors abort startup; everything else terminates only
    /// the session (or client connection) it occurred on.
    pub fn is_session_scoped(&self) -> bool {
        match self {
            StreamError::Config { .. } => false,
            StreamError::File { .. } => true,
            StreamError::MalformedFrame { .. } => true,
            StreamError::Compression { .. } => true,
            StreamError::Transport { .. } => true,
            StreamError::Timeout { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::PathBuf;

    #[test]
    fn error_constructors_validation() {
        let file_error = StreamError::file_error(
            PathBuf::from("/frames/000000.bin"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(matches!(file_error, StreamError::File { .. }));

        let config_error = StreamError::config("no frame files");
        assert!(matches!(config_error, StreamError::Config { .. }));

        let transport_error = StreamError::transport("stream reset");
        assert!(matches!(transport_error, StreamError::Transport { .. }));
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<StreamError>();

        let error = StreamError::config("test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn only_config_errors_abort_the_process() {
        assert!(!StreamError::config("bad dir").is_session_scoped());
        assert!(StreamError::transport("reset").is_session_scoped());
        assert!(
            StreamError::Timeout { duration: Duration::from_secs(10) }.is_session_scoped()
        );
    }

    proptest! {
        #[test]
        fn error_messages_contain_their_context(
            reason in "[a-zA-Z0-9 ._/-]{1,40}",
            context in "[a-zA-Z0-9 ._/-]{1,40}",
            details in "[a-zA-Z0-9 ._/-]{1,40}",
        ) {
            let config = StreamError::config(reason.clone());
            prop_assert!(config.to_string().contains(&reason));

            let malformed = StreamError::malformed(context.clone(), details.clone());
            let msg = malformed.to_string();
            prop_assert!(msg.contains(&context));
            prop_assert!(msg.contains(&details));

            let transport = StreamError::transport(reason.clone());
            prop_assert!(transport.to_string().contains(&reason));
        }
    }
}
