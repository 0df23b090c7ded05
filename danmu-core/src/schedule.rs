//! Frame-by-frame danmaku scheduling
//!
//! The scheduler owns the full event list and the set of annotations
//! currently on screen. Each per-frame update moves visible annotations
//! left, drops the ones that have fully scrolled out, and admits events
//! whose start time has arrived.

use crate::event::DanmakuEvent;
use crate::lane::LaneBoard;
use crate::{Error, Result};

/// Width measurement for a line of text, provided by the font backend
pub trait TextMeasure {
    /// Width in pixels of `text` rendered on a single line
    fn line_width(&self, text: &str) -> f32;
}

/// Scheduler configuration, validated once at construction
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Frame width in pixels
    pub frame_width: u32,
    /// Frame height in pixels
    pub frame_height: u32,
    /// Nominal frame rate; per-frame motion uses `1 / fps`, not wall time
    pub fps: f64,
    /// Height of one danmaku lane in pixels
    pub lane_height: u32,
    /// Seconds an annotation takes to cross the full frame width
    pub crossing_secs: f64,
}

impl SchedulerConfig {
    /// Creates a configuration with the default lane height and crossing time
    pub fn new(frame_width: u32, frame_height: u32, fps: f64) -> Self {
        Self {
            frame_width,
            frame_height,
            fps,
            lane_height: 30,
            crossing_secs: 8.0,
        }
    }
}

/// An annotation currently visible on screen
///
/// Owned exclusively by the scheduler; `lane`, `width` and `speed` are fixed
/// at admission, only `x` changes afterwards.
#[derive(Debug, Clone)]
pub struct ActiveDanmaku {
    /// The source event
    pub event: DanmakuEvent,
    /// Current horizontal position of the text's left edge
    pub x: f32,
    /// Vertical lane index
    pub lane: usize,
    /// Measured text width in pixels
    pub width: f32,
    /// Leftward motion in pixels per second
    pub speed: f32,
}

impl ActiveDanmaku {
    /// Horizontal position of the text's right edge
    pub fn trailing_edge(&self) -> f32 {
        self.x + self.width
    }
}

/// Maintains the active set as playback time advances
pub struct Scheduler {
    /// All events, stably sorted by start time
    events: Vec<DanmakuEvent>,
    /// Index of the first event not yet admitted
    next_event: usize,
    active: Vec<ActiveDanmaku>,
    lanes: LaneBoard,
    frame_width: u32,
    frame_interval: f64,
    crossing_secs: f64,
}

impl Scheduler {
    /// Creates a scheduler for the given events and frame geometry.
    ///
    /// Events are stably sorted by start time, so events sharing a timestamp
    /// are admitted in input order. Degenerate geometry or rates are
    /// configuration errors and rejected here, never mid-run.
    pub fn new(mut events: Vec<DanmakuEvent>, config: SchedulerConfig) -> Result<Self> {
        if config.frame_width == 0 || config.frame_height == 0 {
            return Err(Error::InvalidConfig(format!(
                "frame dimensions must be non-zero, got {}x{}",
                config.frame_width, config.frame_height
            )));
        }
        if !(config.fps.is_finite() && config.fps > 0.0) {
            return Err(Error::InvalidConfig(format!("frame rate must be positive, got {}", config.fps)));
        }
        if !(config.crossing_secs.is_finite() && config.crossing_secs > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "crossing duration must be positive, got {}",
                config.crossing_secs
            )));
        }

        let lanes = LaneBoard::new(config.frame_height, config.lane_height)?;
        events.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));

        Ok(Self {
            events,
            next_event: 0,
            active: Vec::new(),
            lanes,
            frame_width: config.frame_width,
            frame_interval: 1.0 / config.fps,
            crossing_secs: config.crossing_secs,
        })
    }

    /// Advances playback to `current_secs` and returns the active set.
    ///
    /// Previously admitted annotations move left by one frame interval and
    /// are dropped once fully past the left edge. Due events are then
    /// admitted at the right edge; they first move on the following update,
    /// so the admitting frame renders them exactly at `frame_width`.
    pub fn advance<M: TextMeasure>(&mut self, current_secs: f64, measure: &M) -> &[ActiveDanmaku] {
        let step = self.frame_interval as f32;
        for danmaku in &mut self.active {
            danmaku.x -= danmaku.speed * step;
        }
        self.active.retain(|danmaku| danmaku.trailing_edge() >= 0.0);

        while self.next_event < self.events.len()
            && self.events[self.next_event].is_due(current_secs)
        {
            let event = self.events[self.next_event].clone();
            self.next_event += 1;
            self.admit(event, measure);
        }

        &self.active
    }

    fn admit<M: TextMeasure>(&mut self, event: DanmakuEvent, measure: &M) {
        let width = measure.line_width(&event.text);
        let frame_width = self.frame_width as f32;
        let occupied = self.active.iter().map(|d| (d.lane, d.trailing_edge()));
        let lane = self.lanes.assign(occupied, frame_width);
        let speed = (frame_width + width) / self.crossing_secs as f32;

        self.active.push(ActiveDanmaku {
            event,
            x: frame_width,
            lane,
            width,
            speed,
        });
    }

    /// Annotations currently on screen
    pub fn active(&self) -> &[ActiveDanmaku] {
        &self.active
    }

    /// Lane table backing this scheduler
    pub fn lanes(&self) -> &LaneBoard {
        &self.lanes
    }

    /// Number of events not yet admitted
    pub fn pending(&self) -> usize {
        self.events.len() - self.next_event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{DEFAULT_ALPHA, DEFAULT_COLOR};

    /// Measurer reporting the same width for every string
    struct FixedWidth(f32);

    impl TextMeasure for FixedWidth {
        fn line_width(&self, _text: &str) -> f32 {
            self.0
        }
    }

    fn event(text: &str, start_secs: f64) -> DanmakuEvent {
        DanmakuEvent::new(text, start_secs, DEFAULT_COLOR, DEFAULT_ALPHA)
    }

    fn scheduler(events: Vec<DanmakuEvent>) -> Scheduler {
        Scheduler::new(events, SchedulerConfig::new(640, 360, 30.0)).unwrap()
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(Scheduler::new(vec![], SchedulerConfig::new(0, 360, 30.0)).is_err());
        assert!(Scheduler::new(vec![], SchedulerConfig::new(640, 0, 30.0)).is_err());
        assert!(Scheduler::new(vec![], SchedulerConfig::new(640, 360, 0.0)).is_err());

        let mut config = SchedulerConfig::new(640, 360, 30.0);
        config.crossing_secs = 0.0;
        assert!(Scheduler::new(vec![], config).is_err());
    }

    #[test]
    fn test_not_active_before_start_time() {
        let mut scheduler = scheduler(vec![event("late", 1.0)]);
        let measure = FixedWidth(50.0);

        assert!(scheduler.advance(0.0, &measure).is_empty());
        assert!(scheduler.advance(0.5, &measure).is_empty());
        assert!(scheduler.advance(0.999, &measure).is_empty());

        // First update at or past the start time admits it, at the right edge.
        let active = scheduler.advance(1.0, &measure);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].x, 640.0);
    }

    #[test]
    fn test_admission_is_idempotent() {
        let mut scheduler = scheduler(vec![event("once", 0.0)]);
        let measure = FixedWidth(50.0);

        assert_eq!(scheduler.advance(0.0, &measure).len(), 1);
        assert_eq!(scheduler.advance(1.0 / 30.0, &measure).len(), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_x_strictly_decreasing_and_speed_fixed() {
        let mut scheduler = scheduler(vec![event("mover", 0.0)]);
        let measure = FixedWidth(100.0);

        scheduler.advance(0.0, &measure);
        let mut last_x = scheduler.active()[0].x;
        let speed = scheduler.active()[0].speed;
        assert_eq!(speed, (640.0 + 100.0) / 8.0);

        for frame in 1..40 {
            let now = frame as f64 / 30.0;
            let active = scheduler.advance(now, &measure);
            assert!(active[0].x < last_x);
            assert_eq!(active[0].speed, speed);
            assert_eq!(active[0].width, 100.0);
            last_x = active[0].x;
        }
    }

    #[test]
    fn test_expires_exactly_off_screen_and_never_returns() {
        // width 10, frame 100 wide, one-second crossing at 10 fps:
        // 11 px per update once moving.
        let config = SchedulerConfig {
            frame_width: 100,
            frame_height: 60,
            fps: 10.0,
            lane_height: 30,
            crossing_secs: 1.0,
        };
        let mut scheduler = Scheduler::new(vec![event("gone", 0.0)], config).unwrap();
        let measure = FixedWidth(10.0);

        scheduler.advance(0.0, &measure);
        // After 10 moves x = -10, trailing edge exactly 0: still visible.
        for frame in 1..=10 {
            let active = scheduler.advance(frame as f64 / 10.0, &measure);
            assert_eq!(active.len(), 1, "frame {frame}");
        }
        assert_eq!(scheduler.active()[0].trailing_edge(), 0.0);

        // One more move pushes the trailing edge below zero.
        assert!(scheduler.advance(1.1, &measure).is_empty());
        assert!(scheduler.advance(1.2, &measure).is_empty());
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_equal_timestamps_admitted_in_input_order() {
        let mut scheduler = scheduler(vec![
            event("third", 2.0),
            event("first", 1.0),
            event("second", 1.0),
        ]);
        let measure = FixedWidth(30.0);

        let active = scheduler.advance(1.0, &measure);
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].event.text, "first");
        assert_eq!(active[1].event.text, "second");

        let active = scheduler.advance(2.0, &measure);
        assert_eq!(active[2].event.text, "third");
    }

    #[test]
    fn test_empty_event_list_is_not_an_error() {
        let mut scheduler = scheduler(Vec::new());
        let measure = FixedWidth(10.0);
        for frame in 0..10 {
            assert!(scheduler.advance(frame as f64 / 30.0, &measure).is_empty());
        }
    }

    #[test]
    fn test_two_second_playback_scenario() {
        // 2 seconds of 30 fps 640x360 video with one annotation at t=0.
        let mut scheduler = scheduler(vec![DanmakuEvent::new("hi", 0.0, [255, 0, 0], 255)]);
        let measure = FixedWidth(100.0);
        let speed = (640.0 + 100.0) / 8.0;

        let first = scheduler.advance(0.0, &measure);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].x, 640.0);

        let mut final_x = first[0].x;
        for frame in 1..60 {
            let active = scheduler.advance(frame as f64 / 30.0, &measure);
            assert_eq!(active.len(), 1);
            final_x = active[0].x;
        }

        // 59 moves of speed/30 each: one admission frame short of the full
        // two-second travel.
        let expected = 640.0 - 59.0 * speed / 30.0;
        assert!((final_x - expected).abs() < 0.05);
        assert!(final_x < 640.0 - speed * 1.9);
    }
}
