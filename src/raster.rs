//! Raster streaming.
//!
//! Pattern bytes travel in blocks of at most 60 payload bytes (a
//! 64-byte frame minus the block header), grouped into pages of 8192
//! bytes. A page boundary flushes the pending block early, so a full
//! page goes out as 136 blocks of 60 and one of 32. Every page is
//! committed with a print-page opcode; the raster-end command goes out
//! exactly once, after the last block and before the last commit.

use crate::commands::{Command, RASTER_BLOCK_LIMIT};
use crate::error::Error;
use crate::printer::Printer;
use crate::transport::Transport;

/// Pattern bytes the printer buffers before wanting a page commit.
pub const PAGE_LIMIT: usize = 8192;

impl<T: Transport> Printer<T> {
    /// Stream raster bytes and commit them page by page.
    ///
    /// Any rejected block aborts the transfer on the spot. An empty
    /// pattern streams nothing at all.
    pub fn send_raster(&mut self, data: &[u8]) -> Result<(), Error> {
        let pages = data.chunks(PAGE_LIMIT);
        let page_count = pages.len();
        for (page_index, page) in pages.enumerate() {
            for block in page.chunks(RASTER_BLOCK_LIMIT) {
                self.transact_ack(&Command::RasterBlock(block))?;
            }
            if page_index + 1 == page_count {
                self.transact_ack(&Command::RasterEnd)?;
            }
            self.transact_ack(&Command::PrintPage)?;
        }
        Ok(())
    }
}
