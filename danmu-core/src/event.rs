//! Danmaku event data structures

/// A single timed annotation as read from a danmaku source file
#[derive(Debug, Clone, PartialEq)]
pub struct DanmakuEvent {
    /// Text content to render (never empty)
    pub text: String,
    /// Time in seconds at which the annotation becomes eligible to appear
    pub start_secs: f64,
    /// RGB text color
    pub color: [u8; 3],
    /// Opacity, 255 = fully opaque
    pub alpha: u8,
}

/// Default danmaku color (opaque white)
pub const DEFAULT_COLOR: [u8; 3] = [255, 255, 255];

/// Default danmaku opacity
pub const DEFAULT_ALPHA: u8 = 255;

impl DanmakuEvent {
    /// Creates a new danmaku event
    pub fn new(text: impl Into<String>, start_secs: f64, color: [u8; 3], alpha: u8) -> Self {
        Self {
            text: text.into(),
            start_secs,
            color,
            alpha,
        }
    }

    /// Checks if this event is due to appear at the given playback time
    pub fn is_due(&self, current_secs: f64) -> bool {
        self.start_secs <= current_secs
    }
}
