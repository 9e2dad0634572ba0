use gazbridge_frame::DisplayFrame;

use crate::cmd::FrameArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frame, FrameReport, OutputFormat};

pub fn run(args: FrameArgs, format: OutputFormat) -> CliResult<i32> {
    let (frame, seconds, centis) = build(&args)?;
    print_frame(&FrameReport::new(&frame, seconds, centis), format);
    Ok(SUCCESS)
}

fn build(args: &FrameArgs) -> CliResult<(DisplayFrame, u32, Option<u8>)> {
    if args.clear {
        return Ok((DisplayFrame::clear(), 0, Some(0)));
    }
    let seconds = args.seconds.unwrap_or(0);
    let frame = match args.centis {
        Some(centis) => DisplayFrame::finish(seconds, centis),
        None => DisplayFrame::running(seconds),
    }
    .map_err(|err| frame_error("cannot build frame", err))?;
    Ok((frame, seconds, args.centis))
}
