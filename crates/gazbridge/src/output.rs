use std::io::IsTerminal;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gazbridge_bridge::BridgeEvent;
use gazbridge_frame::DisplayFrame;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
pub struct FrameReport {
    pub seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centis: Option<u8>,
    pub text: String,
    pub ascii: String,
    pub hex: String,
    pub wire_size: usize,
}

impl FrameReport {
    pub fn new(frame: &DisplayFrame, seconds: u32, centis: Option<u8>) -> Self {
        Self {
            seconds,
            centis,
            text: frame.as_str().to_string(),
            ascii: frame.preview(),
            hex: frame.hex(),
            wire_size: frame.wire_size(),
        }
    }
}

pub fn print_frame(report: &FrameReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", to_json(report)),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["ASCII".to_string(), report.ascii.clone()])
                .add_row(vec!["HEX".to_string(), report.hex.clone()])
                .add_row(vec!["BYTES".to_string(), report.wire_size.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("ASCII: {}", report.ascii);
            println!("HEX:   {}", report.hex);
        }
    }
}

#[derive(Serialize)]
pub struct TokenReport {
    pub input: String,
    pub segment: &'static str,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centis: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matcher: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

pub fn print_tokens(reports: &[TokenReport], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for report in reports {
                println!("{}", to_json(report));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["INPUT", "SEGMENT", "TOKEN", "TIME", "MATCHER", "NOTE"]);
            for report in reports {
                table.add_row(vec![
                    report.input.clone(),
                    report.segment.to_string(),
                    report.kind.to_string(),
                    time_text(report),
                    report.matcher.unwrap_or("-").to_string(),
                    report.note.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for report in reports {
                let mut line = format!("{:<6} {:?}", report.kind, report.input);
                if report.seconds.is_some() {
                    line.push_str(&format!(" time={}", time_text(report)));
                }
                if let Some(note) = &report.note {
                    line.push_str(&format!(" ({note})"));
                }
                println!("{line}");
            }
        }
    }
}

fn time_text(report: &TokenReport) -> String {
    match (report.seconds, report.centis) {
        (Some(seconds), Some(centis)) => format!("{seconds}.{centis:02}"),
        _ => "-".to_string(),
    }
}

#[derive(Serialize, Debug, PartialEq)]
struct EventOutput<'a> {
    event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    level: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed: Option<bool>,
    timestamp: String,
}

impl<'a> EventOutput<'a> {
    fn from_event(event: &'a BridgeEvent) -> Self {
        let mut out = EventOutput {
            event: "",
            level: None,
            text: None,
            state: None,
            failed: None,
            timestamp: now_unix_seconds(),
        };
        match event {
            BridgeEvent::Log { level, text } => {
                out.event = "log";
                out.level = Some(level.as_str());
                out.text = Some(text);
            }
            BridgeEvent::FrameSent(text) => {
                out.event = "frame_sent";
                out.text = Some(text);
            }
            BridgeEvent::StateChanged(state) => {
                out.event = "state_changed";
                out.state = Some(state.as_str());
            }
            BridgeEvent::SourceStarted => out.event = "source_started",
            BridgeEvent::SourceStopped { failed } => {
                out.event = "source_stopped";
                out.failed = Some(*failed);
            }
        }
        out
    }
}

/// Print one bridge event. Events stream, so the table format falls back to
/// one line per event.
pub fn print_event(event: &BridgeEvent, format: OutputFormat) {
    let out = EventOutput::from_event(event);
    match format {
        OutputFormat::Json => println!("{}", to_json(&out)),
        OutputFormat::Table | OutputFormat::Pretty => {
            let detail = match event {
                BridgeEvent::Log { level, text } => format!("[{}] {text}", level.as_str()),
                BridgeEvent::FrameSent(text) => format!("Sent: {text:?} + CR"),
                BridgeEvent::StateChanged(state) => format!("State: {state}"),
                BridgeEvent::SourceStarted => "FDS reader started".to_string(),
                BridgeEvent::SourceStopped { failed: true } => {
                    "FDS reader stopped (reconnect needed)".to_string()
                }
                BridgeEvent::SourceStopped { failed: false } => "FDS reader stopped".to_string(),
            };
            println!("{} {detail}", out.timestamp);
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
