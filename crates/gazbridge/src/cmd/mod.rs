use clap::{Args, Subcommand};

use crate::endpoint::{parse_endpoint, Endpoint};
use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod frame;
pub mod parse;
pub mod run;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bridge FDS timing events onto the GAZ scoreboard.
    Run(RunArgs),
    /// Send one manual test frame to the scoreboard.
    Send(SendArgs),
    /// Show a frame's ASCII and HEX without sending it.
    Frame(FrameArgs),
    /// Classify FDS lines and show the parsed token and time.
    Parse(ParseArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Frame(args) => frame::run(args, format),
        Command::Parse(args) => parse::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Runtime for the commands that talk to devices.
pub(crate) fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("runtime setup failed: {err}")))
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// FDS timing box device, or `-` for stdin.
    #[arg(long, env = "GAZBRIDGE_SOURCE", value_parser = parse_endpoint)]
    pub source: Endpoint,
    /// GAZ scoreboard device, or `-` for stdout.
    #[arg(long, env = "GAZBRIDGE_SINK", value_parser = parse_endpoint)]
    pub sink: Endpoint,
    /// FDS baud rate.
    #[arg(long, env = "GAZBRIDGE_SOURCE_BAUD", default_value_t = 9600)]
    pub source_baud: u32,
    /// GAZ baud rate.
    #[arg(long, env = "GAZBRIDGE_SINK_BAUD", default_value_t = 2400)]
    pub sink_baud: u32,
    /// Seconds the finish time stays up before clearing (clamped to 5..=10).
    #[arg(long, env = "GAZBRIDGE_HOLD", default_value_t = 7)]
    pub hold: u64,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// GAZ scoreboard device, or `-` for stdout.
    #[arg(long, env = "GAZBRIDGE_SINK", value_parser = parse_endpoint)]
    pub sink: Endpoint,
    /// GAZ baud rate.
    #[arg(long, env = "GAZBRIDGE_SINK_BAUD", default_value_t = 2400)]
    pub sink_baud: u32,
    /// Whole seconds to show (0..=999).
    pub seconds: u32,
    /// Centiseconds; omit for a frame without them (ticking style).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=99))]
    pub centis: Option<u8>,
}

#[derive(Args, Debug)]
pub struct FrameArgs {
    /// Whole seconds (0..=999).
    #[arg(required_unless_present = "clear", conflicts_with = "clear")]
    pub seconds: Option<u32>,
    /// Centiseconds; omit for a frame without them.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=99))]
    pub centis: Option<u8>,
    /// Show the clearing frame (0.00).
    #[arg(long)]
    pub clear: bool,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Lines to classify. Reads stdin when none are given.
    pub lines: Vec<String>,
    /// Unterminated stdin bytes beyond this are scanned in place.
    #[arg(long, default_value_t = gazbridge_frame::DEFAULT_SCAN_THRESHOLD)]
    pub scan_threshold: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
