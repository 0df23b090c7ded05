//! Progress reporting with ETA estimation

use std::time::Instant;

/// Frame-loop progress reporter with ETA estimation
pub struct ProgressTracker {
    total: u64,
    processed: u64,
    start_time: Instant,
    label: String,
}

impl ProgressTracker {
    /// Creates a new progress tracker
    pub fn new(total: u64, label: &str) -> Self {
        Self {
            total,
            processed: 0,
            start_time: Instant::now(),
            label: label.to_string(),
        }
    }

    /// Increments the processed count by one and prints progress every
    /// `report_interval` steps and on completion
    pub fn increment_and_report(&mut self, report_interval: u64) {
        self.processed += 1;
        if self.processed % report_interval == 0 || self.processed == self.total {
            self.print_progress();
        }
    }

    /// Prints current progress with ETA
    fn print_progress(&self) {
        let current = self.processed;
        let elapsed_secs = self.start_time.elapsed().as_secs_f64();

        let percent = if self.total > 0 {
            (current as f64 / self.total as f64) * 100.0
        } else {
            0.0
        };

        if current > 0 && current < self.total {
            let rate = current as f64 / elapsed_secs;
            let remaining = (self.total - current) as f64 / rate;
            println!(
                "  {} {}/{} ({:.1}%) - elapsed: {} - ETA: {}",
                self.label,
                current,
                self.total,
                percent,
                format_duration(elapsed_secs),
                format_duration(remaining),
            );
        } else if current == self.total {
            println!(
                "  {} {}/{} (100.0%) - completed in {}",
                self.label,
                current,
                self.total,
                format_duration(elapsed_secs),
            );
        }
    }
}

/// Formats seconds into a human-readable duration string
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{}m {:.0}s", mins, remaining)
    } else {
        let hours = (secs / 3600.0).floor() as u64;
        let remaining = secs - (hours as f64 * 3600.0);
        let mins = (remaining / 60.0).floor() as u64;
        let remaining_secs = remaining - (mins as f64 * 60.0);
        format!("{}h {}m {:.0}s", hours, mins, remaining_secs)
    }
}
