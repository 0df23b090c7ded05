//! Danmu Core Library
//!
//! This library provides the danmaku event model, source-file parsing and the
//! frame-by-frame scheduling engine that decides which annotations are
//! visible, which lane they occupy and where they sit on screen.

pub mod event;
pub mod lane;
pub mod parse;
pub mod schedule;

pub use event::DanmakuEvent;
pub use lane::LaneBoard;
pub use parse::{Parsed, ParseWarning, SourceFormat};
pub use schedule::{ActiveDanmaku, Scheduler, SchedulerConfig, TextMeasure};

/// Result type for danmu-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for danmu-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported danmaku format: {0}")]
    UnsupportedFormat(String),

    #[error("Malformed danmaku input at line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
