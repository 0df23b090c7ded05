//! Danmu Video Library
//!
//! This library provides the ffmpeg-backed frame source and sink and the
//! frame loop that drives scheduling and compositing between them.

pub mod pipeline;
pub mod progress;
pub mod video_reader;
pub mod video_writer;

pub use pipeline::{overlay_video, OverlaySummary};
pub use video_reader::VideoReader;
pub use video_writer::VideoWriter;

use std::path::PathBuf;

/// Result type for danmu-video operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for danmu-video operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Danmu core error: {0}")]
    Core(#[from] danmu_core::Error),

    #[error("Danmu render error: {0}")]
    Render(#[from] danmu_render::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("No H.264 encoder available")]
    NoEncoder,
}

/// Overlay pipeline configuration
#[derive(Debug, Clone)]
pub struct OverlayConfig {
    /// Path to the TrueType/OpenType font used for danmaku text
    pub font_path: PathBuf,
    /// Font pixel size
    pub font_size: f32,
    /// Height of one danmaku lane in pixels
    pub lane_height: u32,
    /// Seconds an annotation takes to cross the full frame width
    pub crossing_secs: f64,
}

impl OverlayConfig {
    /// Creates a configuration with default sizing for the given font
    pub fn new(font_path: impl Into<PathBuf>) -> Self {
        Self {
            font_path: font_path.into(),
            font_size: 25.0,
            lane_height: 30,
            crossing_secs: 8.0,
        }
    }
}
