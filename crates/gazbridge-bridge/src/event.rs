use std::fmt;

use tokio::sync::broadcast;

/// The run state. Owned by the state machine; everything else observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
}

impl RunState {
    pub fn as_str(self) -> &'static str {
        match self {
            RunState::Idle => "IDLE",
            RunState::Running => "RUNNING",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of an operator log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Notifications for a presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// Operator log line.
    Log { level: LogLevel, text: String },
    /// A frame went out on the sink; literal frame text without CR.
    FrameSent(String),
    StateChanged(RunState),
    /// The source reader started.
    SourceStarted,
    /// The source reader ended; `failed` means the device needs reconnecting.
    SourceStopped { failed: bool },
}

/// Fan-out of [`BridgeEvent`]s. Sending never blocks and never fails when
/// nobody is listening.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BridgeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BridgeEvent> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: BridgeEvent) {
        let _ = self.tx.send(event);
    }

    pub fn info(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::info!("{text}");
        self.log_event(LogLevel::Info, text);
    }

    pub fn warn(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::warn!("{text}");
        self.log_event(LogLevel::Warn, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        let text = text.into();
        tracing::error!("{text}");
        self.log_event(LogLevel::Error, text);
    }

    /// Forward a log line to observers only (already traced elsewhere).
    pub fn log_event(&self, level: LogLevel, text: String) {
        self.emit(BridgeEvent::Log { level, text });
    }
}
