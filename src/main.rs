//! # klg2
//!
//! Command-line utility for the Casio KL-G2 tape printer.
//!
//! ## Usage
//!
//! ```bash
//! # Print a packed PBM from standard input on the default 12 mm tape
//! klg2 < label.pbm
//!
//! # Print a file on 18 mm tape, dark, full cut at the end
//! klg2 -t 18 -d 5 -c 2 label.pbm
//!
//! # Feed the tape and exit
//! klg2 -F
//!
//! # Watch the raw USB traffic
//! klg2 -v < label.pbm
//! ```

use std::fs::File;
use std::io;
use std::path::PathBuf;

use clap::{ArgGroup, Parser};

use kl_tape::{Bitmap, CutMode, Density, Error, Margin, Pattern, PrintOptions, Printer, Tape};

/// Print PBM images on a Casio KL-G2 tape printer.
#[derive(Parser, Debug)]
#[command(name = "klg2")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("operation").args(["feed", "cut", "halfcut"])))]
struct Cli {
    /// Feed the tape and exit
    #[arg(short = 'F', long)]
    feed: bool,

    /// Cut the tape and exit
    #[arg(short = 'C', long)]
    cut: bool,

    /// Half-cut the tape and exit
    #[arg(short = 'H', long)]
    halfcut: bool,

    /// Margin: 0 none, 1 small, 2 medium, 3 large
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        default_value = "1",
        value_parser = parse_margin
    )]
    margin: Margin,

    /// Tape width in mm: 6, 9, 12, 18 or 24
    #[arg(
        short,
        long,
        value_name = "MM",
        default_value = "12",
        value_parser = parse_tape
    )]
    tape: Tape,

    /// Cut mode: 0 no cut, 1 half-cut, 2 full cut
    #[arg(
        short,
        long,
        value_name = "MODE",
        default_value = "1",
        value_parser = parse_cutmode
    )]
    cutter: CutMode,

    /// Print density from 1 (light) to 5 (dark)
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        default_value = "3",
        value_parser = parse_density
    )]
    density: Density,

    /// Dump USB communications
    #[arg(short, long)]
    verbose: bool,

    /// PBM image to print (reads standard input when omitted)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,
}

fn parse_margin(s: &str) -> Result<Margin, String> {
    let level: u8 = s.parse().map_err(|_| "margin must be a number".to_string())?;
    Margin::from_level(level).ok_or_else(|| "margin goes from 0 (none) to 3 (large)".to_string())
}

fn parse_tape(s: &str) -> Result<Tape, String> {
    let mm: u8 = s
        .parse()
        .map_err(|_| "tape width must be a number".to_string())?;
    Tape::from_mm(mm).ok_or_else(|| "supported widths are 6, 9, 12, 18 and 24 mm".to_string())
}

fn parse_cutmode(s: &str) -> Result<CutMode, String> {
    let mode: u8 = s
        .parse()
        .map_err(|_| "cut mode must be a number".to_string())?;
    CutMode::from_mode(mode)
        .ok_or_else(|| "cut modes are 0 (none), 1 (half) and 2 (full)".to_string())
}

fn parse_density(s: &str) -> Result<Density, String> {
    let level: u8 = s
        .parse()
        .map_err(|_| "density must be a number".to_string())?;
    Density::from_level(level).ok_or_else(|| "density goes from 1 to 5".to_string())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Error> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.feed {
        return Printer::open()?.feed();
    }
    if cli.cut {
        return Printer::open()?.cut();
    }
    if cli.halfcut {
        return Printer::open()?.half_cut();
    }

    // Parse the image before touching the device, so a bad file never
    // leaves the printer claimed with a job half set up.
    let pattern = load_pattern(&cli)?;

    let options = PrintOptions::new()
        .tape(cli.tape)
        .margin(cli.margin)
        .density(cli.density)
        .cutter(cli.cutter);

    let mut printer = Printer::open()?;
    printer.print(&pattern, &options)
}

fn load_pattern(cli: &Cli) -> Result<Pattern, Error> {
    let bitmap = match &cli.file {
        Some(path) => Bitmap::from_reader(File::open(path)?)?,
        None => Bitmap::from_reader(io::stdin())?,
    };
    Ok(bitmap.to_pattern())
}
