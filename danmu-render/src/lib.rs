//! Danmu Render Library
//!
//! This library rasterizes danmaku text with fontdue and composites the
//! active set onto decoded video frames.

pub mod compositor;
pub mod font;

pub use compositor::Compositor;
pub use font::TextRenderer;

/// Result type for danmu-render operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for danmu-render operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Danmu core error: {0}")]
    Core(#[from] danmu_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Font error: {0}")]
    Font(String),
}
