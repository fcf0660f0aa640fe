/// Headless backend statistics - work counters shared with the code that registered the plugin
///
/// The counters are atomics so a `HeadlessCounters` can be read from any
/// thread while the backend lives inside a renderer.

use colored::*;
use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the headless backend counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeadlessStats {
    pub frames_submitted: u64,
    pub frames_presented: u64,
    /// Frames where `frame_prepare` answered `Skip`
    pub frames_skipped: u64,
    pub draw_calls: u64,
    /// Vertices or indices consumed by draw calls
    pub elements_drawn: u64,
    /// Bytes written into renderbuffers and textures
    pub bytes_uploaded: u64,
    /// Uploads performed outside of a frame workload
    pub immediate_uploads: u64,
    pub renderbuffers_created: u64,
    pub textures_created: u64,
}

impl HeadlessStats {
    /// Total number of objects created
    pub fn resources_created(&self) -> u64 {
        self.renderbuffers_created + self.textures_created
    }
}

/// Thread-safe counter set
#[derive(Debug, Default)]
pub struct HeadlessCounters {
    frames_submitted: AtomicU64,
    frames_presented: AtomicU64,
    frames_skipped: AtomicU64,
    draw_calls: AtomicU64,
    elements_drawn: AtomicU64,
    bytes_uploaded: AtomicU64,
    immediate_uploads: AtomicU64,
    renderbuffers_created: AtomicU64,
    textures_created: AtomicU64,
}

impl HeadlessCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn frame_submitted(&self) {
        self.frames_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_presented(&self) {
        self.frames_presented.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_skipped(&self) {
        self.frames_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn draw(&self, element_count: u32) {
        self.draw_calls.fetch_add(1, Ordering::Relaxed);
        self.elements_drawn.fetch_add(element_count as u64, Ordering::Relaxed);
    }

    pub(crate) fn upload(&self, bytes: usize, immediate: bool) {
        self.bytes_uploaded.fetch_add(bytes as u64, Ordering::Relaxed);
        if immediate {
            self.immediate_uploads.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn renderbuffer_created(&self) {
        self.renderbuffers_created.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn texture_created(&self) {
        self.textures_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HeadlessStats {
        HeadlessStats {
            frames_submitted: self.frames_submitted.load(Ordering::Relaxed),
            frames_presented: self.frames_presented.load(Ordering::Relaxed),
            frames_skipped: self.frames_skipped.load(Ordering::Relaxed),
            draw_calls: self.draw_calls.load(Ordering::Relaxed),
            elements_drawn: self.elements_drawn.load(Ordering::Relaxed),
            bytes_uploaded: self.bytes_uploaded.load(Ordering::Relaxed),
            immediate_uploads: self.immediate_uploads.load(Ordering::Relaxed),
            renderbuffers_created: self.renderbuffers_created.load(Ordering::Relaxed),
            textures_created: self.textures_created.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.frames_submitted,
            &self.frames_presented,
            &self.frames_skipped,
            &self.draw_calls,
            &self.elements_drawn,
            &self.bytes_uploaded,
            &self.immediate_uploads,
            &self.renderbuffers_created,
            &self.textures_created,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Print a statistics report to stdout
pub fn print_stats_report(stats: &HeadlessStats) {
    if stats.frames_submitted == 0 && stats.resources_created() == 0 {
        println!("\n{}", "No headless work recorded".green().bold());
        return;
    }

    println!("\n{}", "=== Headless Backend Report ===".bright_blue().bold());
    println!("  {} {}", "Frames submitted:".white().bold(), stats.frames_submitted);
    println!("  {} {}", "Frames presented:".white().bold(), stats.frames_presented);
    if stats.frames_skipped > 0 {
        println!("  {} {}", "Frames skipped:".yellow().bold(), stats.frames_skipped);
    }
    println!("  {} {} ({} elements)", "Draw calls:".cyan(), stats.draw_calls, stats.elements_drawn);
    println!("  {} {} bytes ({} immediate)", "Uploaded:".cyan(), stats.bytes_uploaded, stats.immediate_uploads);
    println!("  {} {} renderbuffers, {} textures",
        "Created:".bright_black(), stats.renderbuffers_created, stats.textures_created);
    println!("{}\n", "===============================".bright_blue().bold());
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "stats_tests.rs"]
mod tests;
