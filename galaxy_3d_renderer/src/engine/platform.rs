/// Platform layer seen by the engine loop

use std::time::Duration;

use crate::engine::event::PlatformEvent;

/// Windowing/OS layer driving the engine
///
/// Window creation, destruction and resizes reach the renderer as
/// `PlatformEvent`s drained once per tick.
pub trait Platform {
    /// Process pending OS messages
    ///
    /// Returns false when the platform can no longer run (the loop stops).
    fn pump_messages(&mut self) -> bool;

    /// Monotonic time in seconds
    fn absolute_time(&self) -> f64;

    /// Events collected since the previous call
    fn drain_events(&mut self) -> Vec<PlatformEvent>;

    /// Block the calling thread for `seconds`
    fn sleep(&mut self, seconds: f64) {
        if seconds > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(seconds));
        }
    }
}
