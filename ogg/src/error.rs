//! Error types for giztoy-ogg.

use std::io;

/// Result type alias for giztoy-ogg.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Ogg muxing and demuxing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The staged bytes do not start with the `OggS` capture pattern.
    #[error("framing error: capture pattern not found at page boundary")]
    Framing,

    /// A fully buffered page failed checksum verification.
    #[error("checksum mismatch: page carries {expected:#010x}, computed {computed:#010x}")]
    Checksum { expected: u32, computed: u32 },

    /// The stream structure version byte is not 0.
    #[error("unsupported stream structure version: {0}")]
    UnsupportedVersion(u8),

    /// Page sequence numbers are not contiguous (strict mode only).
    #[error("page sequence gap: expected {expected}, got {got}")]
    SequenceGap { expected: u32, got: u32 },

    /// The muxer already emitted its end-of-stream page.
    #[error("muxer closed")]
    Closed,

    /// Closing would truncate a packet that has not been fully added.
    #[error("packet in progress")]
    PacketInProgress,

    /// IO error from a reader/writer adapter.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
