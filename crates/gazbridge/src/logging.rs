use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Crates whose events follow `--log-level`; everything else is capped at
/// warn so dependency chatter stays out of the operator log.
const OWN_TARGETS: [&str; 4] = [
    "gazbridge",
    "gazbridge_bridge",
    "gazbridge_frame",
    "gazbridge_transport",
];

pub fn log_filter(level: LogLevel) -> Targets {
    let own = level.as_filter();
    OWN_TARGETS
        .iter()
        .fold(Targets::new(), |targets, target| targets.with_target(*target, own))
        .with_default(own.min(LevelFilter::WARN))
}

/// Logs go to stderr; stdout carries command output (or the scoreboard
/// stream when the sink is `-`).
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);
    let registry = tracing_subscriber::registry().with(log_filter(level));

    match format {
        LogFormat::Text => {
            let _ = registry.with(layer).try_init();
        }
        LogFormat::Json => {
            let _ = registry.with(layer.json()).try_init();
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing::Level;

    use super::*;

    #[test]
    fn own_crates_follow_requested_level() {
        let filter = log_filter(LogLevel::Debug);
        assert!(filter.would_enable("gazbridge_bridge::machine", &Level::DEBUG));
        assert!(!filter.would_enable("gazbridge_bridge::machine", &Level::TRACE));
        assert!(filter.would_enable("gazbridge", &Level::DEBUG));
    }

    #[test]
    fn dependencies_capped_at_warn() {
        let filter = log_filter(LogLevel::Trace);
        assert!(!filter.would_enable("tokio::runtime", &Level::INFO));
        assert!(filter.would_enable("tokio::runtime", &Level::WARN));
    }

    #[test]
    fn quiet_level_applies_everywhere() {
        let filter = log_filter(LogLevel::Error);
        assert!(!filter.would_enable("gazbridge_transport::serial", &Level::WARN));
        assert!(!filter.would_enable("tokio::runtime", &Level::WARN));
    }
}
