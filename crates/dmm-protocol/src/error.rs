//! Error types for multimeter frame decoding and command encoding

use thiserror::Error;

/// Reasons a candidate frame was dropped without touching the snapshot
///
/// None of these are fatal. The meter streams a new frame every few hundred
/// milliseconds, so a dropped frame just means "wait for the next one".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Not enough bytes to even hold the header
    #[error("frame too short: {len} bytes")]
    TooShort { len: usize },

    /// First two bytes are not the `AB CD` magic
    #[error("bad magic: 0x{first:02X} 0x{second:02X}")]
    BadMagic { first: u8, second: u8 },

    /// Declared payload length does not match the bytes that follow it
    #[error("length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: i8, actual: usize },

    /// Header is consistent but the frame ends before the status bytes
    #[error("truncated frame: {len} bytes, need at least {needed}")]
    Truncated { len: usize, needed: usize },
}

/// Errors that can occur while handling host-to-meter commands
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Command code not known to this protocol version
    #[error("unknown command code: 0x{0:02X}")]
    UnknownCode(u8),

    /// Command name not known to this protocol version
    #[error("unknown command name: {0}")]
    UnknownName(String),

    /// Bytes do not form a command frame
    #[error("invalid command frame: {0}")]
    InvalidFrame(String),

    /// Trailer does not match the sum of the preceding bytes
    #[error("checksum mismatch: expected 0x{expected:04X}, got 0x{actual:04X}")]
    ChecksumMismatch { expected: u16, actual: u16 },
}
