//! Frame-by-frame overlay pipeline
//!
//! Decodes the source video one frame at a time, advances the danmaku
//! scheduler to the frame's nominal timestamp, composites the active set and
//! hands the result to the encoder. Strictly synchronous: each frame is a
//! complete step before the next is decoded.

use crate::progress::ProgressTracker;
use crate::{Error, OverlayConfig, Result, VideoReader, VideoWriter};
use danmu_core::{DanmakuEvent, Scheduler, SchedulerConfig};
use danmu_render::{Compositor, TextRenderer};
use std::path::Path;

/// What an overlay run produced
#[derive(Debug, Clone)]
pub struct OverlaySummary {
    /// Frames decoded, composited and written
    pub frames_written: u64,
    /// Events taken from the danmaku file
    pub events_total: usize,
    /// Largest number of annotations on screen at once
    pub peak_active: usize,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Nominal frame rate used for scheduling
    pub fps: f64,
}

/// Overlays `events` onto `input` and encodes the result to `output`
pub fn overlay_video(
    input: &Path,
    output: &Path,
    events: Vec<DanmakuEvent>,
    config: &OverlayConfig,
) -> Result<OverlaySummary> {
    let mut reader = VideoReader::open(input)?;
    let width = reader.width();
    let height = reader.height();
    let (fps_num, fps_den) = reader.frame_rate();
    let fps = reader.fps();
    if fps <= 0.0 {
        return Err(Error::InvalidVideo("source reports no frame rate".into()));
    }
    let total_frames = reader.total_frames();

    let events_total = events.len();
    let mut scheduler_config = SchedulerConfig::new(width, height, fps);
    scheduler_config.lane_height = config.lane_height;
    scheduler_config.crossing_secs = config.crossing_secs;
    let mut scheduler = Scheduler::new(events, scheduler_config)?;

    let text = TextRenderer::from_file(&config.font_path, config.font_size)?;
    let mut compositor = Compositor::new(text, config.lane_height);

    let mut writer = VideoWriter::create(output, width, height, (fps_num, fps_den))?;

    let mut progress = ProgressTracker::new(total_frames, "Overlaying");
    let mut peak_active = 0usize;

    reader.for_each_frame(|index, frame| {
        // Nominal playback time; never wall clock.
        let current_secs = index as f64 / fps;

        let active = scheduler.advance(current_secs, compositor.text());
        peak_active = peak_active.max(active.len());

        let composited = compositor.render(&frame, active);
        writer.write_frame(&composited)?;

        progress.increment_and_report(30);
        Ok(())
    })?;

    writer.finish()?;

    Ok(OverlaySummary {
        frames_written: writer.frames_written(),
        events_total,
        peak_active,
        width,
        height,
        fps,
    })
}
