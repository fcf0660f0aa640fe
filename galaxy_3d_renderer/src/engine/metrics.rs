/// Rolling frame timing

use std::collections::VecDeque;

/// Number of frames averaged by `FrameMetrics`
pub const FRAME_TIME_WINDOW: usize = 30;

/// Frame-time average over the last `FRAME_TIME_WINDOW` ticks
#[derive(Debug, Clone, Default)]
pub struct FrameMetrics {
    frame_times: VecDeque<f64>,
    sum: f64,
    frames: u64,
}

impl FrameMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the duration of one tick (seconds). Negative values count as 0.
    pub fn update(&mut self, delta_time: f64) {
        let delta_time = delta_time.max(0.0);
        if self.frame_times.len() == FRAME_TIME_WINDOW {
            if let Some(oldest) = self.frame_times.pop_front() {
                self.sum -= oldest;
            }
        }
        self.frame_times.push_back(delta_time);
        self.sum += delta_time;
        self.frames += 1;
    }

    /// Average frame time in seconds (0 before the first update)
    pub fn average_frame_time(&self) -> f64 {
        if self.frame_times.is_empty() {
            0.0
        } else {
            self.sum / self.frame_times.len() as f64
        }
    }

    /// Frames per second derived from the average frame time
    pub fn fps(&self) -> f64 {
        let average = self.average_frame_time();
        if average > 0.0 { 1.0 / average } else { 0.0 }
    }

    /// Ticks recorded since creation
    pub fn frame_count(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
