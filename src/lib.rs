//! KL-G2 Tape Printer Driver
//!
//! This crate drives the Casio KL-G2 thermal tape printer over USB.
//! It loads a packed monochrome bitmap (PBM `P4`), converts it into the
//! printer's column-major raster format and runs the job sequence of
//! the native protocol: setup commands, raster pages, job cancel.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::fs::File;
//! use kl_tape::{Bitmap, PrintOptions, Printer, Tape};
//!
//! let image = File::open("label.pbm").unwrap();
//! let pattern = Bitmap::from_reader(image).unwrap().to_pattern();
//!
//! let mut printer = Printer::open().unwrap();
//! let options = PrintOptions::new().tape(Tape::W18);
//! printer.print(&pattern, &options).unwrap();
//! ```

mod commands;
mod error;
mod frame;
mod media;
mod pbm;
mod printer;
mod raster;
mod settings;
mod transport;

pub use crate::{
    commands::RASTER_BLOCK_LIMIT,
    error::{BitmapError, Error, ProtocolError},
    media::Tape,
    pbm::{Bitmap, Pattern, HEAD_ROWS, STRIPE_BYTES},
    printer::{PrintOptions, Printer},
    raster::PAGE_LIMIT,
    settings::{CutMode, Density, Margin},
    transport::{Transport, UsbTransport, ENDPOINT_SIZE, PRODUCT_ID, VENDOR_ID},
};
