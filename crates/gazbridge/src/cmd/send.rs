use gazbridge_bridge::{Bridge, BridgeConfig};

use crate::cmd::{runtime, SendArgs};
use crate::endpoint::open_sink;
use crate::exit::{bridge_error, CliResult, SUCCESS};
use crate::output::{print_frame, FrameReport, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let runtime = runtime()?;
    let frame = runtime.block_on(async {
        let sink = open_sink(&args.sink, args.sink_baud)?;
        let bridge = Bridge::new(sink, BridgeConfig::default());
        bridge
            .send_test_frame(args.seconds, args.centis)
            .await
            .map_err(|err| bridge_error("send failed", err))
    })?;

    // With `--sink -` stdout already carries the frame itself.
    if !args.sink.is_stdio() {
        print_frame(&FrameReport::new(&frame, args.seconds, args.centis), format);
    }
    Ok(SUCCESS)
}
