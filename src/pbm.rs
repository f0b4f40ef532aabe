//! Packed PBM loading and conversion to the printer's native pattern.
//!
//! The KL-G2 print head is a fixed column of 128 dots (16 bytes).
//! Images are laid onto a 128-row canvas, centered vertically, then
//! transposed into column-major stripes, one 16-byte stripe per
//! horizontal dot of tape. The head gives 8 dots/mm, so a 24 mm tape
//! uses the full canvas and narrower tapes use the middle of it.

use std::io::Read;

use log::{log_enabled, trace, warn, Level};

use crate::error::{BitmapError, Error};

/// Dot rows on the print head, which is also the canvas height.
pub const HEAD_ROWS: usize = 128;

/// Bytes per pattern stripe (one tape column).
pub const STRIPE_BYTES: usize = HEAD_ROWS / 8;

/// A packed monochrome image: one bit per pixel, MSB first, each row
/// padded to a whole byte. Set bits print dark.
#[derive(Debug)]
pub struct Bitmap {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl Bitmap {
    /// Read a packed PBM (magic `P4`) from `input`.
    pub fn from_reader<R: Read>(mut input: R) -> Result<Bitmap, Error> {
        let mut raw = Vec::new();
        input.read_to_end(&mut raw)?;
        Ok(Bitmap::parse(&raw)?)
    }

    /// Parse a packed PBM image.
    ///
    /// Grammar: `P4`, one newline, zero or more `#` comment lines,
    /// decimal width and height, one single whitespace byte, then the
    /// packed rows. Exactly one separator byte is consumed before the
    /// pixel data; anything more would eat into raster bytes that
    /// happen to look like whitespace.
    pub fn parse(raw: &[u8]) -> Result<Bitmap, BitmapError> {
        if !raw.starts_with(b"P4\n") {
            return Err(BitmapError::BadSignature);
        }
        let mut scan = Scanner { raw, pos: 3 };
        scan.skip_comment_lines()?;
        let width = scan.read_decimal()?;
        let height = scan.read_decimal()?;
        match scan.bump() {
            Some(b) if b.is_ascii_whitespace() => {}
            _ => return Err(BitmapError::BadDimensions),
        }
        if width == 0 || height == 0 {
            return Err(BitmapError::EmptyImage);
        }
        let height = if height > HEAD_ROWS {
            warn!("Image truncated to {} rows", HEAD_ROWS);
            HEAD_ROWS
        } else {
            height
        };

        let row_bytes = (width + 7) / 8;
        let need = row_bytes
            .checked_mul(height)
            .ok_or(BitmapError::BadDimensions)?;
        let rest = scan.rest();
        if rest.len() < need {
            return Err(BitmapError::Truncated);
        }
        Ok(Bitmap {
            width,
            height,
            data: rest[..need].to_vec(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn row_bytes(&self) -> usize {
        (self.width + 7) / 8
    }

    /// Lay the image onto the 128-row canvas, vertically centered.
    fn canvas(&self) -> Vec<u8> {
        let row_bytes = self.row_bytes();
        let pad_top = (HEAD_ROWS - self.height) / 2;
        let mut canvas = vec![0u8; HEAD_ROWS * row_bytes];
        let start = pad_top * row_bytes;
        canvas[start..start + self.data.len()].copy_from_slice(&self.data);
        canvas
    }

    /// Transpose into the printer's column-major stripe layout.
    ///
    /// Pixel (row `i`, column `x`) lands in bit `i % 8` of byte `i / 8`
    /// of stripe `x`. The column loop is bounded by the image width, so
    /// set padding bits in the last row byte never reach the pattern.
    pub fn to_pattern(self) -> Pattern {
        let row_bytes = self.row_bytes();
        let canvas = self.canvas();
        let mut data = vec![0u8; self.width * STRIPE_BYTES];
        for i in 0..HEAD_ROWS {
            let row = &canvas[i * row_bytes..(i + 1) * row_bytes];
            for x in 0..self.width {
                if row[x / 8] & (0x80 >> (x % 8)) != 0 {
                    data[x * STRIPE_BYTES + i / 8] |= 1 << (i % 8);
                }
            }
        }
        let pattern = Pattern {
            width: self.width,
            data,
        };
        if log_enabled!(Level::Trace) {
            pattern.trace_stripes();
        }
        pattern
    }
}

/// Column-major print data, one 16-byte stripe per tape column.
#[derive(Debug)]
pub struct Pattern {
    width: usize,
    data: Vec<u8>,
}

impl Pattern {
    /// Tape columns, which is also the printed length in dots.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Raw stripe bytes in feed order.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The 16-byte head columns, left to right.
    pub fn stripes(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.data.chunks(STRIPE_BYTES)
    }

    fn trace_stripes(&self) {
        for (x, stripe) in self.stripes().enumerate() {
            let hex: String = stripe.iter().map(|b| format!("{:02X}", b)).collect();
            trace!("{:5} [{}]", x, hex);
        }
    }
}

struct Scanner<'a> {
    raw: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<u8> {
        self.raw.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek();
        if b.is_some() {
            self.pos += 1;
        }
        b
    }

    fn skip_comment_lines(&mut self) -> Result<(), BitmapError> {
        while self.peek() == Some(b'#') {
            loop {
                match self.bump() {
                    Some(b'\n') => break,
                    Some(_) => {}
                    None => return Err(BitmapError::BadDimensions),
                }
            }
        }
        Ok(())
    }

    fn read_decimal(&mut self) -> Result<usize, BitmapError> {
        while let Some(b) = self.peek() {
            if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let mut value: usize = 0;
        let mut digits = 0;
        while let Some(b) = self.peek() {
            if !b.is_ascii_digit() {
                break;
            }
            self.pos += 1;
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as usize))
                .ok_or(BitmapError::BadDimensions)?;
            digits += 1;
        }
        if digits == 0 {
            return Err(BitmapError::BadDimensions);
        }
        Ok(value)
    }

    fn rest(&self) -> &'a [u8] {
        &self.raw[self.pos..]
    }
}
