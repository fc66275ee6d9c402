//! Cooperative frame scheduling

use livecloud_core::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag that ends a [`FrameLoop`] before its next frame
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Runs a frame callback until stopped or out of frames
#[derive(Debug, Clone)]
pub struct FrameLoop {
    token: StopToken,
    interval: Option<Duration>,
    max_frames: Option<u64>,
}

impl FrameLoop {
    pub fn new(token: StopToken) -> Self {
        Self {
            token,
            interval: None,
            max_frames: None,
        }
    }

    /// Minimum wall time per frame; the loop sleeps off the remainder
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = (!interval.is_zero()).then_some(interval);
        self
    }

    /// Stop after `max_frames` frames
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = Some(max_frames);
        self
    }

    pub fn token(&self) -> &StopToken {
        &self.token
    }

    /// Run frames, passing each callback its frame number.
    /// Returns the number of completed frames; a callback error ends the loop.
    pub fn run<F>(&self, mut on_frame: F) -> Result<u64>
    where
        F: FnMut(u64) -> Result<()>,
    {
        let mut frame = 0;

        while !self.token.is_stopped() {
            if self.max_frames.is_some_and(|max| frame >= max) {
                break;
            }

            let started = Instant::now();
            on_frame(frame)?;
            frame += 1;

            if let Some(interval) = self.interval {
                let elapsed = started.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
        }

        Ok(frame)
    }
}
