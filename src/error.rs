//! Error types for KL-G2 printer operations.
//!
//! Errors split into two tiers: transport failures (USB trouble, short
//! transfers) are fatal and abort the job outright, while protocol-level
//! rejections (bad acknowledge, unexpected reply) are recoverable in the
//! sense that an orderly cancel is still sent before giving up.

use rusb;
use thiserror::Error;

/// Main error type for KL-G2 printer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// USB communication error.
    ///
    /// Wraps underlying rusb errors for device communication issues
    /// or permission problems.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    /// Printer is not connected.
    ///
    /// No device on the bus matched the KL-G2 vendor and product ids.
    #[error("Device is offline")]
    DeviceOffline,

    #[error("Can't read device list, permission issue ?")]
    DeviceListNotReadable,

    #[error("Device is missing a bulk endpoint")]
    MissingEndpoint,

    /// Bulk write transferred fewer bytes than the frame holds.
    ///
    /// The device never accepts partial frames, so a short write leaves
    /// it in an unknown state and the job is abandoned unconditionally.
    #[error("Short write: sent {wrote} of {expected} bytes")]
    IncompleteTransfer { wrote: usize, expected: usize },

    #[error("Payload of {len} bytes exceeds {limit}-byte frame")]
    FrameOverflow { len: usize, limit: usize },

    /// Command rejected or answered out of shape by the printer.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Bitmap(#[from] BitmapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether further traffic to the device is pointless.
    ///
    /// Protocol rejections leave the link itself healthy, so the job
    /// abort command can still be delivered. Everything else means the
    /// transfer path is broken and the job stops where it stands.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Protocol(_))
    }
}

/// Command-level rejections reported over a healthy link.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The single-byte acknowledge was missing or wrong.
    #[error("{command}: expected ACK, got {response:02X?}")]
    NoAck {
        command: &'static str,
        response: Vec<u8>,
    },

    #[error("{command}: response of {len} bytes has unexpected length")]
    BadLength { command: &'static str, len: usize },

    #[error("{command}: unexpected response {response:02X?}")]
    Mismatch {
        command: &'static str,
        response: Vec<u8>,
    },
}

/// Failures while reading a packed PBM image.
#[derive(Error, Debug)]
pub enum BitmapError {
    #[error("Not a packed PBM file (expected P4 signature)")]
    BadSignature,

    #[error("Malformed width or height in PBM header")]
    BadDimensions,

    #[error("Image has zero width or height")]
    EmptyImage,

    #[error("Pixel data ends short of width x height")]
    Truncated,
}
