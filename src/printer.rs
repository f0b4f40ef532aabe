//! Job sequencing for the KL-G2.
//!
//! The printer expects a fixed preamble before raster data and an
//! explicit cancel afterwards. The stock driver sends the cancel even
//! when everything succeeded; without it the printer stays in job mode
//! instead of returning to its idle screen, so this driver does too.

use log::info;

use crate::commands::{expect_ack, expect_exact, Command, PREJOB_READY, STATUS_READY};
use crate::error::{Error, ProtocolError};
use crate::media::Tape;
use crate::pbm::Pattern;
use crate::settings::{CutMode, Density, Margin};
use crate::transport::{Transport, UsbTransport};

/// Parameters for a print run, defaulting to the stock tool's choices:
/// 12 mm tape, small margin, middle density, half-cut.
#[derive(Debug, Clone, Copy)]
pub struct PrintOptions {
    pub(crate) tape: Tape,
    pub(crate) margin: Margin,
    pub(crate) density: Density,
    pub(crate) cutter: CutMode,
}

impl PrintOptions {
    pub fn new() -> PrintOptions {
        PrintOptions {
            tape: Tape::W12,
            margin: Margin::Small,
            density: Density::Level3,
            cutter: CutMode::Half,
        }
    }

    pub fn tape(self, tape: Tape) -> Self {
        PrintOptions { tape, ..self }
    }

    pub fn margin(self, margin: Margin) -> Self {
        PrintOptions { margin, ..self }
    }

    pub fn density(self, density: Density) -> Self {
        PrintOptions { density, ..self }
    }

    pub fn cutter(self, cutter: CutMode) -> Self {
        PrintOptions { cutter, ..self }
    }
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Driver for one printer, generic over the link so jobs can run
/// against a scripted transport in tests.
pub struct Printer<T: Transport> {
    pub(crate) transport: T,
}

impl Printer<UsbTransport> {
    /// Open the first KL-G2 on the bus and claim it.
    pub fn open() -> Result<Self, Error> {
        Ok(Printer {
            transport: UsbTransport::open()?,
        })
    }
}

impl<T: Transport> Printer<T> {
    pub fn new(transport: T) -> Self {
        Printer { transport }
    }

    /// Send one command and collect whatever comes back.
    pub(crate) fn transact(&mut self, command: &Command) -> Result<Vec<u8>, Error> {
        let frame = command.encode()?;
        self.transport.send(frame.as_wire())?;
        self.transport.receive()
    }

    /// Send one command and require the bare ACK.
    pub(crate) fn transact_ack(&mut self, command: &Command) -> Result<(), Error> {
        let response = self.transact(command)?;
        expect_ack(command.name(), &response)?;
        Ok(())
    }

    fn transact_exact(&mut self, command: &Command, expected: &[u8]) -> Result<(), Error> {
        let response = self.transact(command)?;
        expect_exact(command.name(), &response, expected)?;
        Ok(())
    }

    /// Ask the printer whether it is idle and ready. Can take a while
    /// when the mechanics are still moving.
    pub fn check_status(&mut self) -> Result<(), Error> {
        self.transact_exact(&Command::StatusCheck, &STATUS_READY)
    }

    pub fn reset(&mut self) -> Result<(), Error> {
        self.transact_ack(&Command::Reset)
    }

    /// Feed blank tape out of the slot.
    pub fn feed(&mut self) -> Result<(), Error> {
        self.transact_ack(&Command::TapeFeed)
    }

    /// Cut clean through tape and backing.
    pub fn cut(&mut self) -> Result<(), Error> {
        self.transact_ack(&Command::TapeCut)
    }

    /// Cut the tape but leave the backing attached.
    pub fn half_cut(&mut self) -> Result<(), Error> {
        self.transact_ack(&Command::TapeHalfCut)
    }

    /// Advance the tape by `amount` steps before printing.
    pub fn prefeed(&mut self, amount: u8) -> Result<(), Error> {
        self.transact_ack(&Command::PrefeedTape(amount))
    }

    /// Abort whatever job is in flight. The printer never answers
    /// this, so only the send can fail.
    pub fn cancel(&mut self) -> Result<(), Error> {
        let frame = Command::CancelJob.encode()?;
        self.transport.send(frame.as_wire())
    }

    /// Ask which tape cartridge is mounted, `None` when the bay is
    /// empty or the cartridge is unknown.
    pub fn query_tape(&mut self) -> Result<Option<Tape>, Error> {
        let response = self.transact(&Command::GetTape)?;
        if response.len() != 5 {
            return Err(ProtocolError::BadLength {
                command: Command::GetTape.name(),
                len: response.len(),
            }
            .into());
        }
        Ok(Tape::from_sensor(response[4]))
    }

    fn prejob(&mut self) -> Result<(), Error> {
        self.transact_ack(&Command::PrejobConfig)?;
        self.transact_exact(&Command::PrejobCheck, &PREJOB_READY)
    }

    /// Run a full print job.
    ///
    /// The setup chain is fail-fast: the first rejected step abandons
    /// everything after it. Whatever the outcome, one cancel follows —
    /// unless the transport itself broke, in which case nothing more
    /// is sent and the error propagates as it stands.
    pub fn print(&mut self, pattern: &Pattern, options: &PrintOptions) -> Result<(), Error> {
        info!(
            "Printing {} columns on {} mm tape",
            pattern.width(),
            options.tape.width_mm()
        );
        match self.run_job(pattern, options) {
            Err(err) if err.is_fatal() => Err(err),
            outcome => {
                self.cancel()?;
                outcome
            }
        }
    }

    fn run_job(&mut self, pattern: &Pattern, options: &PrintOptions) -> Result<(), Error> {
        self.check_status()?;
        self.reset()?;
        self.prejob()?;
        self.transact_ack(&Command::CheckTape(options.tape))?;
        self.reset()?;
        self.transact_ack(&Command::SetSpeed)?;
        self.transact_ack(&Command::SetMargin(options.margin))?;
        self.transact_ack(&Command::SetDensity(options.density))?;
        self.transact_ack(&Command::SetCutter(options.cutter))?;
        self.check_status()?;
        self.send_raster(pattern.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbm::Bitmap;
    use crate::transport::FakePrinter;

    fn tiny_pattern() -> Pattern {
        Bitmap::parse(b"P4\n4 2\n\xA0\x50").unwrap().to_pattern()
    }

    #[test]
    fn options_default_to_the_stock_settings() {
        let options = PrintOptions::new();
        assert_eq!(options.tape, Tape::W12);
        assert_eq!(options.margin, Margin::Small);
        assert_eq!(options.density, Density::Level3);
        assert_eq!(options.cutter, CutMode::Half);

        let options = PrintOptions::new().tape(Tape::W24).cutter(CutMode::Full);
        assert_eq!(options.tape, Tape::W24);
        assert_eq!(options.cutter, CutMode::Full);
        assert_eq!(options.margin, Margin::Small);
    }

    #[test]
    fn print_runs_the_full_sequence_in_order() {
        let mut printer = Printer::new(FakePrinter::new());
        printer
            .print(&tiny_pattern(), &PrintOptions::new())
            .unwrap();

        // The 64-byte pattern splits into a 60-byte and a 4-byte block.
        let prefixes: Vec<&[u8]> = vec![
            &[0x02, 0x1D], // status check
            &[0x02, 0x01], // reset
            &[0x02, 0x02], // prejob config
            &[0x02, 0x82], // prejob check
            &[0x02, 0x17], // tape check
            &[0x02, 0x01], // reset
            &[0x02, 0x1C], // speed adjust
            &[0x02, 0x0D], // margin select
            &[0x02, 0x09], // density select
            &[0x02, 0x19], // cutter mode select
            &[0x02, 0x1D], // status check
            &[0x02, 0xFE, 60],
            &[0x02, 0xFE, 4],
            &[0x02, 0x04], // raster end
            &[0x0C],       // print page
            &[0x18],       // cancel job
        ];
        let sent = &printer.transport.sent;
        assert_eq!(sent.len(), prefixes.len());
        for (frame, prefix) in sent.iter().zip(&prefixes) {
            assert!(
                frame.starts_with(prefix),
                "frame {:02X?} does not start with {:02X?}",
                frame,
                prefix
            );
        }

        assert_eq!(sent[0].len(), 16);
        assert_eq!(sent[11].len(), 64);
        assert_eq!(sent[12].len(), 64);
        assert_eq!(sent[14].len(), 1);
        assert_eq!(printer.transport.cancels_sent(), 1);
    }

    #[test]
    fn rejected_step_skips_the_rest_but_still_cancels() {
        let mut fake = FakePrinter::new();
        fake.answer_with = Some((&[0x02, 0x0D], vec![0x1E]));
        let mut printer = Printer::new(fake);

        let err = printer
            .print(&tiny_pattern(), &PrintOptions::new())
            .unwrap_err();
        assert!(!err.is_fatal());
        match err {
            Error::Protocol(ProtocolError::NoAck { command, response }) => {
                assert_eq!(command, "margin select");
                assert_eq!(response, vec![0x1E]);
            }
            other => panic!("expected NoAck, got {:?}", other),
        }

        let sent = &printer.transport.sent;
        assert!(sent.iter().all(|f| !f.starts_with(&[0x02, 0x09])));
        assert!(sent.iter().all(|f| !f.starts_with(&[0x02, 0x19])));
        assert!(sent.iter().all(|f| !f.starts_with(&[0x02, 0xFE])));
        assert!(sent.iter().all(|f| f.as_slice() != [0x0C]));
        assert_eq!(printer.transport.cancels_sent(), 1);
        assert!(sent[sent.len() - 2].starts_with(&[0x02, 0x0D]));
        assert_eq!(sent[sent.len() - 1], vec![0x18]);
    }

    #[test]
    fn broken_link_skips_the_cancel() {
        let mut fake = FakePrinter::new();
        fake.fail_send_on = Some(&[0x02, 0x0D]);
        let mut printer = Printer::new(fake);

        let err = printer
            .print(&tiny_pattern(), &PrintOptions::new())
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(printer.transport.cancels_sent(), 0);
    }

    #[test]
    fn short_status_report_is_a_length_error() {
        let mut fake = FakePrinter::new();
        fake.answer_with = Some((&[0x02, 0x1D], vec![0x02, 0x80]));
        let mut printer = Printer::new(fake);

        match printer.check_status().unwrap_err() {
            Error::Protocol(ProtocolError::BadLength { command, len }) => {
                assert_eq!(command, "status check");
                assert_eq!(len, 2);
            }
            other => panic!("expected BadLength, got {:?}", other),
        }
    }

    #[test]
    fn twisted_status_report_is_a_mismatch() {
        let mut fake = FakePrinter::new();
        fake.answer_with = Some((&[0x02, 0x1D], vec![0x02, 0x80, 0x02, 0x00, 0x00, 0x00]));
        let mut printer = Printer::new(fake);

        match printer.check_status().unwrap_err() {
            Error::Protocol(ProtocolError::Mismatch { .. }) => {}
            other => panic!("expected Mismatch, got {:?}", other),
        }
    }

    #[test]
    fn feed_is_a_single_opcode() {
        let mut printer = Printer::new(FakePrinter::new());
        printer.feed().unwrap();

        assert_eq!(printer.transport.sent.len(), 1);
        assert_eq!(printer.transport.sent[0], vec![0x0A]);
        assert_eq!(printer.transport.cancels_sent(), 0);
    }

    #[test]
    fn cuts_are_single_opcodes() {
        let mut printer = Printer::new(FakePrinter::new());
        printer.cut().unwrap();
        printer.half_cut().unwrap();

        assert_eq!(printer.transport.sent[0], vec![0x08]);
        assert_eq!(printer.transport.sent[1], vec![0x09]);
        assert_eq!(printer.transport.cancels_sent(), 0);
    }

    #[test]
    fn query_tape_reads_the_sensor_byte() {
        let mut printer = Printer::new(FakePrinter::new());
        assert_eq!(printer.query_tape().unwrap(), Some(Tape::W12));

        let mut fake = FakePrinter::new();
        fake.answer_with = Some((&[0x02, 0x1A], vec![0x02, 0x80, 0x02, 0x00, 0x00]));
        let mut printer = Printer::new(fake);
        assert_eq!(printer.query_tape().unwrap(), None);

        let mut fake = FakePrinter::new();
        fake.answer_with = Some((&[0x02, 0x1A], vec![0x06]));
        let mut printer = Printer::new(fake);
        assert!(printer.query_tape().is_err());
    }

    #[test]
    fn prefeed_carries_the_amount() {
        let mut printer = Printer::new(FakePrinter::new());
        printer.prefeed(7).unwrap();
        assert!(printer.transport.sent[0].starts_with(&[0x02, 0x1B, 0x01, 0x00, 0x07]));
    }
}
