use std::time::Duration;

use gazbridge_bridge::{Bridge, BridgeConfig, BridgeEvent, HoldSeconds};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::cmd::{runtime, RunArgs};
use crate::endpoint::{open_sink, open_source};
use crate::exit::{bridge_error, CliError, CliResult, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_event, OutputFormat};

/// How the event loop ended.
#[derive(Clone, Copy)]
enum Outcome {
    Interrupted,
    SourceEnded,
    SourceFailed,
}

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let runtime = runtime()?;
    let result = runtime.block_on(run_bridge(args, format));
    // A blocking stdin read cannot be cancelled; do not wait on it.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn run_bridge(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = BridgeConfig {
        hold: HoldSeconds::new(args.hold),
        ..BridgeConfig::default()
    };
    // The scoreboard stream owns stdout when the sink is `-`.
    let report = Reporter {
        format,
        quiet: args.sink.is_stdio(),
    };

    let sink = open_sink(&args.sink, args.sink_baud)?;
    let source = open_source(&args.source, args.source_baud)?;
    info!(
        source = %args.source,
        sink = %args.sink,
        hold = %config.hold,
        "bridge starting"
    );

    let bridge = Bridge::new(sink, config);
    let mut events = bridge.subscribe();
    bridge
        .attach(source)
        .map_err(|err| bridge_error("cannot start reader", err))?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Outcome::Interrupted,
            event = events.recv() => match event {
                Ok(BridgeEvent::SourceStopped { failed }) => {
                    report.event(&BridgeEvent::SourceStopped { failed });
                    break if failed { Outcome::SourceFailed } else { Outcome::SourceEnded };
                }
                Ok(event) => report.event(&event),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event output fell behind"),
                Err(RecvError::Closed) => break Outcome::SourceEnded,
            },
        }
    };

    let finished = match outcome {
        Outcome::SourceEnded => {
            // Leave the display cleared, unless the operator interrupts.
            tokio::select! {
                result = bridge.settle() => result,
                _ = &mut ctrl_c => bridge.shutdown().await,
            }
        }
        Outcome::Interrupted | Outcome::SourceFailed => bridge.shutdown().await,
    };
    report.drain(&mut events);
    finished.map_err(|err| bridge_error("shutdown failed", err))?;

    match outcome {
        Outcome::SourceFailed => Err(CliError::new(
            TRANSPORT_ERROR,
            format!("FDS read failed on {}; reconnect and restart", args.source),
        )),
        Outcome::Interrupted => {
            info!("interrupted");
            Ok(SUCCESS)
        }
        Outcome::SourceEnded => Ok(SUCCESS),
    }
}

#[derive(Clone, Copy)]
struct Reporter {
    format: OutputFormat,
    quiet: bool,
}

impl Reporter {
    fn event(&self, event: &BridgeEvent) {
        if !self.quiet {
            print_event(event, self.format);
        }
    }

    fn drain(&self, events: &mut broadcast::Receiver<BridgeEvent>) {
        loop {
            match events.try_recv() {
                Ok(event) => self.event(&event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => break,
            }
        }
    }
}
