//! Horizontal lane allocation for scrolling danmaku
//!
//! The frame height is partitioned into fixed-height lanes. A new annotation
//! always enters at the right edge, so a lane can take it without overlap as
//! soon as the lane's previous occupant has fully cleared that edge.

/// Fixed-size lane table with per-lane assignment bookkeeping
#[derive(Debug, Clone)]
pub struct LaneBoard {
    lane_height: u32,
    /// Tick at which each lane was last assigned, for rotation and fallback
    last_assigned: Vec<u64>,
    clock: u64,
}

impl LaneBoard {
    /// Creates a lane board covering the frame height.
    ///
    /// The lane count is `frame_height / lane_height`; both must be large
    /// enough to yield at least one lane.
    pub fn new(frame_height: u32, lane_height: u32) -> crate::Result<Self> {
        if lane_height == 0 {
            return Err(crate::Error::InvalidConfig("lane height must be non-zero".into()));
        }
        let count = (frame_height / lane_height) as usize;
        if count == 0 {
            return Err(crate::Error::InvalidConfig(format!(
                "frame height {frame_height} is smaller than one lane ({lane_height})"
            )));
        }

        Ok(Self {
            lane_height,
            last_assigned: vec![0; count],
            clock: 0,
        })
    }

    /// Number of lanes
    pub fn lane_count(&self) -> usize {
        self.last_assigned.len()
    }

    /// Vertical pixel offset of a lane
    pub fn y_offset(&self, lane: usize) -> u32 {
        lane as u32 * self.lane_height
    }

    /// Height of a single lane in pixels
    pub fn lane_height(&self) -> u32 {
        self.lane_height
    }

    /// Picks a lane for an annotation entering at the right edge.
    ///
    /// `occupied` yields `(lane, trailing_edge)` for every currently visible
    /// annotation, where the trailing edge is `x + width`. A lane is clear
    /// when none of its occupants still reach the right edge; the
    /// least-recently-assigned clear lane wins. When every lane is blocked
    /// the least-recently-assigned lane is reused, which can overlap.
    pub fn assign(
        &mut self,
        occupied: impl Iterator<Item = (usize, f32)>,
        frame_width: f32,
    ) -> usize {
        let mut blocked = vec![false; self.last_assigned.len()];
        for (lane, trailing_edge) in occupied {
            if lane < blocked.len() && trailing_edge >= frame_width {
                blocked[lane] = true;
            }
        }

        let lane = (0..self.last_assigned.len())
            .min_by_key(|&lane| (blocked[lane], self.last_assigned[lane]))
            .unwrap();

        self.clock += 1;
        self.last_assigned[lane] = self.clock;
        lane
    }
}
