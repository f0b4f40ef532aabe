//! The KL-G2 command set.
//!
//! Every transaction the printer understands maps to exactly one wire
//! encoding and one expected response shape. Most commands answer with
//! a bare ACK byte; the query commands answer with short STX-prefixed
//! reports that are matched against canned literals. The structured
//! payloads were captured from the vendor driver and are replayed
//! verbatim, fields with unknown meaning included.

use crate::error::{Error, ProtocolError};
use crate::frame::{Frame, WireSize, ACK, STX};
use crate::media::Tape;
use crate::settings::{CutMode, Density, Margin};

/// Single-byte opcodes, sent as 1-byte transfers.
pub const OP_TAPE_CUT: u8 = 0x08;
pub const OP_TAPE_HALFCUT: u8 = 0x09;
pub const OP_TAPE_FEED: u8 = 0x0A;
pub const OP_PRINT_PAGE: u8 = 0x0C;
pub const OP_CANCEL_JOB: u8 = 0x18;

/// Status report of an idle, ready printer.
pub const STATUS_READY: [u8; 6] = [0x02, 0x80, 0x02, 0x00, 0x00, 0xA6];

/// Report closing the pre-job configuration exchange.
pub const PREJOB_READY: [u8; 5] = [0x02, 0x80, 0x01, 0x00, 0x01];

/// Raster payload cap: a 64-byte frame minus the 4-byte block header.
pub const RASTER_BLOCK_LIMIT: usize = 60;

#[derive(Debug)]
pub enum Command<'a> {
    StatusCheck,
    Reset,
    TapeCut,
    TapeHalfCut,
    TapeFeed,
    CancelJob,
    PrejobConfig,
    PrejobCheck,
    SetSpeed,
    CheckTape(Tape),
    SetMargin(Margin),
    SetDensity(Density),
    SetCutter(CutMode),
    GetTape,
    PrefeedTape(u8),
    RasterBlock(&'a [u8]),
    RasterEnd,
    PrintPage,
}

impl<'a> Command<'a> {
    /// Meaningful bytes of the outbound frame, before zero padding.
    pub fn payload(&self) -> Vec<u8> {
        match self {
            Command::StatusCheck => vec![STX, 0x1D],
            Command::Reset => vec![STX, 0x01],
            Command::TapeCut => vec![OP_TAPE_CUT],
            Command::TapeHalfCut => vec![OP_TAPE_HALFCUT],
            Command::TapeFeed => vec![OP_TAPE_FEED],
            Command::CancelJob => vec![OP_CANCEL_JOB],
            Command::PrejobConfig => {
                vec![STX, 0x02, 0x04, 0x00, 0x00, 0x09, 0x09, 0x01]
            }
            Command::PrejobCheck => vec![STX, 0x82],
            Command::SetSpeed => vec![STX, 0x1C, 0x01, 0x00, 0x00],
            // The tape code lands big-endian in bytes 4 and 5.
            Command::CheckTape(tape) => {
                let code = tape.code();
                vec![STX, 0x17, 0x02, 0x00, (code >> 8) as u8, code as u8]
            }
            Command::SetMargin(margin) => vec![STX, 0x0D, 0x01, 0x00, margin.code()],
            Command::SetDensity(density) => vec![
                STX,
                0x09,
                0x06,
                0x00,
                0x00,
                0x00,
                0x01,
                0x00,
                density.code(),
                0x00,
            ],
            Command::SetCutter(mode) => vec![STX, 0x19, 0x01, 0x00, mode.code()],
            Command::GetTape => vec![STX, 0x1A],
            Command::PrefeedTape(amount) => vec![STX, 0x1B, 0x01, 0x00, *amount],
            Command::RasterBlock(data) => {
                let mut payload = Vec::with_capacity(4 + data.len());
                payload.extend_from_slice(&[STX, 0xFE, data.len() as u8, 0x00]);
                payload.extend_from_slice(data);
                payload
            }
            Command::RasterEnd => vec![STX, 0x04],
            Command::PrintPage => vec![OP_PRINT_PAGE],
        }
    }

    /// The transfer size this command legally travels at. The device
    /// keys on the transfer length, not on the payload length, so a
    /// raster block is a 64-byte transfer even when nearly empty.
    pub fn wire_size(&self) -> WireSize {
        match self {
            Command::TapeCut
            | Command::TapeHalfCut
            | Command::TapeFeed
            | Command::CancelJob
            | Command::PrintPage => WireSize::Opcode,
            Command::RasterBlock(_) => WireSize::Raster,
            _ => WireSize::Command,
        }
    }

    /// Label used in protocol error reports.
    pub fn name(&self) -> &'static str {
        match self {
            Command::StatusCheck => "status check",
            Command::Reset => "printer reset",
            Command::TapeCut => "tape cut",
            Command::TapeHalfCut => "tape half cut",
            Command::TapeFeed => "tape feed",
            Command::CancelJob => "cancel job",
            Command::PrejobConfig => "prejob config",
            Command::PrejobCheck => "prejob check",
            Command::SetSpeed => "speed adjust",
            Command::CheckTape(_) => "tape check",
            Command::SetMargin(_) => "margin select",
            Command::SetDensity(_) => "density select",
            Command::SetCutter(_) => "cutter mode select",
            Command::GetTape => "get tape",
            Command::PrefeedTape(_) => "prefeed",
            Command::RasterBlock(_) => "raster block",
            Command::RasterEnd => "raster end",
            Command::PrintPage => "print page",
        }
    }

    pub fn encode(&self) -> Result<Frame, Error> {
        Frame::encode(&self.payload(), self.wire_size())
    }
}

/// Accept nothing but the single ACK byte.
pub fn expect_ack(command: &'static str, response: &[u8]) -> Result<(), ProtocolError> {
    if response == [ACK] {
        Ok(())
    } else {
        Err(ProtocolError::NoAck {
            command,
            response: response.to_vec(),
        })
    }
}

/// Match a response against a canned report, length first.
pub fn expect_exact(
    command: &'static str,
    response: &[u8],
    expected: &[u8],
) -> Result<(), ProtocolError> {
    if response.len() != expected.len() {
        return Err(ProtocolError::BadLength {
            command,
            len: response.len(),
        });
    }
    if response != expected {
        return Err(ProtocolError::Mismatch {
            command,
            response: response.to_vec(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_byte_opcodes() {
        for (cmd, op) in [
            (Command::TapeCut, 0x08),
            (Command::TapeHalfCut, 0x09),
            (Command::TapeFeed, 0x0A),
            (Command::PrintPage, 0x0C),
            (Command::CancelJob, 0x18),
        ]
        .iter()
        {
            assert_eq!(cmd.payload(), vec![*op]);
            assert_eq!(cmd.wire_size(), WireSize::Opcode);
        }
    }

    #[test]
    fn status_check_payload() {
        assert_eq!(Command::StatusCheck.payload(), vec![0x02, 0x1D]);
        assert_eq!(Command::StatusCheck.wire_size(), WireSize::Command);
    }

    #[test]
    fn reset_payload() {
        assert_eq!(Command::Reset.payload(), vec![0x02, 0x01]);
    }

    #[test]
    fn prejob_payloads() {
        assert_eq!(
            Command::PrejobConfig.payload(),
            vec![0x02, 0x02, 0x04, 0x00, 0x00, 0x09, 0x09, 0x01]
        );
        assert_eq!(Command::PrejobCheck.payload(), vec![0x02, 0x82]);
    }

    #[test]
    fn speed_adjust_payload() {
        assert_eq!(
            Command::SetSpeed.payload(),
            vec![0x02, 0x1C, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn tape_check_carries_code_big_endian() {
        assert_eq!(
            Command::CheckTape(Tape::W12).payload(),
            vec![0x02, 0x17, 0x02, 0x00, 0x83, 0x03]
        );
        assert_eq!(
            Command::CheckTape(Tape::W6).payload(),
            vec![0x02, 0x17, 0x02, 0x00, 0x81, 0x00]
        );
    }

    #[test]
    fn margin_select_frame_is_padded_to_sixteen() {
        let cmd = Command::SetMargin(Margin::Small);
        assert_eq!(cmd.payload(), vec![0x02, 0x0D, 0x01, 0x00, 0x40]);

        let frame = cmd.encode().unwrap();
        let mut expected = vec![0x02, 0x0D, 0x01, 0x00, 0x40];
        expected.resize(16, 0x00);
        assert_eq!(frame.as_wire(), &expected[..]);
    }

    #[test]
    fn density_select_payload() {
        assert_eq!(
            Command::SetDensity(Density::Level3).payload(),
            vec![0x02, 0x09, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
        assert_eq!(Command::SetDensity(Density::Level1).payload()[8], 0xFE);
        assert_eq!(Command::SetDensity(Density::Level5).payload()[8], 0x02);
    }

    #[test]
    fn cutter_mode_payload() {
        assert_eq!(
            Command::SetCutter(CutMode::Half).payload(),
            vec![0x02, 0x19, 0x01, 0x00, 0x01]
        );
        assert_eq!(Command::SetCutter(CutMode::None).payload()[4], 0xFF);
        assert_eq!(Command::SetCutter(CutMode::Full).payload()[4], 0x00);
    }

    #[test]
    fn tape_queries() {
        assert_eq!(Command::GetTape.payload(), vec![0x02, 0x1A]);
        assert_eq!(
            Command::PrefeedTape(5).payload(),
            vec![0x02, 0x1B, 0x01, 0x00, 0x05]
        );
    }

    #[test]
    fn raster_block_header_carries_payload_length() {
        let cmd = Command::RasterBlock(&[0xAA, 0xBB, 0xCC]);
        assert_eq!(
            cmd.payload(),
            vec![0x02, 0xFE, 0x03, 0x00, 0xAA, 0xBB, 0xCC]
        );
        assert_eq!(cmd.wire_size(), WireSize::Raster);

        let frame = cmd.encode().unwrap();
        assert_eq!(frame.as_wire().len(), 64);
        assert!(frame.as_wire()[7..].iter().all(|&b| b == 0));
    }

    #[test]
    fn raster_end_is_a_structured_command() {
        assert_eq!(Command::RasterEnd.payload(), vec![0x02, 0x04]);
        assert_eq!(Command::RasterEnd.wire_size(), WireSize::Command);
    }

    #[test]
    fn ack_validation_is_exact() {
        assert!(expect_ack("tape cut", &[0x06]).is_ok());
        assert!(expect_ack("tape cut", &[0x1E]).is_err());
        assert!(expect_ack("tape cut", &[]).is_err());
        assert!(expect_ack("tape cut", &[0x06, 0x06]).is_err());
        assert!(expect_ack("tape cut", &[0x05]).is_err());
    }

    #[test]
    fn exact_match_checks_length_before_content() {
        match expect_exact("status check", &STATUS_READY[..4], &STATUS_READY) {
            Err(ProtocolError::BadLength { command, len }) => {
                assert_eq!(command, "status check");
                assert_eq!(len, 4);
            }
            other => panic!("expected BadLength, got {:?}", other),
        }

        let mut twisted = STATUS_READY;
        twisted[5] = 0x00;
        match expect_exact("status check", &twisted, &STATUS_READY) {
            Err(ProtocolError::Mismatch { .. }) => {}
            other => panic!("expected Mismatch, got {:?}", other),
        }

        assert!(expect_exact("status check", &STATUS_READY, &STATUS_READY).is_ok());
    }
}
