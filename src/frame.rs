//! Wire framing for the KL-G2 bulk protocol.
//!
//! The device accepts exactly three transfer lengths: 1 byte for bare
//! opcodes, 16 bytes for STX-prefixed commands, and 64 bytes for raster
//! data. Payloads shorter than the wire size are padded with zeros;
//! nothing is ever sent at any other length.

use crate::error::Error;

/// Start-of-text marker opening every structured command.
pub const STX: u8 = 0x02;

/// Positive acknowledge, the entire response to most commands.
pub const ACK: u8 = 0x06;

/// Negative acknowledge.
pub const NAK: u8 = 0x1E;

/// The three transfer lengths the device accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireSize {
    /// Bare single-byte opcode.
    Opcode,
    /// STX-prefixed structured command.
    Command,
    /// Raster data block. Always travels at the full endpoint size,
    /// even when the payload is shorter.
    Raster,
}

impl WireSize {
    pub fn bytes(self) -> usize {
        match self {
            WireSize::Opcode => 1,
            WireSize::Command => 16,
            WireSize::Raster => 64,
        }
    }
}

/// One outbound transfer: payload bytes first, zero padding after.
#[derive(Debug)]
pub struct Frame {
    buf: [u8; 64],
    wire: WireSize,
}

impl Frame {
    /// Lay `payload` into a zeroed buffer of the given wire size.
    ///
    /// Fails with [`Error::FrameOverflow`] if the payload does not fit;
    /// command builders keep payloads in bounds, so hitting this means
    /// a bug upstream rather than bad device input.
    pub fn encode(payload: &[u8], wire: WireSize) -> Result<Frame, Error> {
        let limit = wire.bytes();
        if payload.len() > limit {
            return Err(Error::FrameOverflow {
                len: payload.len(),
                limit,
            });
        }
        let mut buf = [0u8; 64];
        buf[..payload.len()].copy_from_slice(payload);
        Ok(Frame { buf, wire })
    }

    /// The bytes that travel on the bus, exactly `wire.bytes()` long.
    pub fn as_wire(&self) -> &[u8] {
        &self.buf[..self.wire.bytes()]
    }
}
