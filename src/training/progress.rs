//! Training budget and the progress signal driving the learning-rate schedule.

use std::time::Duration;

use crate::error::ConfigError;

/// When a training run stops. Whichever bound is hit first wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrainingBudget {
    /// Stop once this many environment frames were processed.
    pub total_frames: Option<u64>,
    /// Stop once this much wall-clock time has elapsed.
    pub stop_time: Option<Duration>,
}

impl TrainingBudget {
    /// Frame-count budget only.
    pub fn frames(total_frames: u64) -> Self {
        Self {
            total_frames: Some(total_frames),
            stop_time: None,
        }
    }

    /// Wall-clock budget only.
    pub fn duration(stop_time: Duration) -> Self {
        Self {
            total_frames: None,
            stop_time: Some(stop_time),
        }
    }

    /// Adds a wall-clock bound.
    pub fn with_stop_time(mut self, stop_time: Duration) -> Self {
        self.stop_time = Some(stop_time);
        self
    }

    /// Adds a frame-count bound.
    pub fn with_total_frames(mut self, total_frames: u64) -> Self {
        self.total_frames = Some(total_frames);
        self
    }

    /// A budget without any bound would never stop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_frames.is_none() && self.stop_time.is_none() {
            return Err(ConfigError::UnboundedBudget);
        }
        Ok(())
    }
}

/// Frames processed and the fraction of training remaining.
///
/// The fraction starts at 1.0 and falls towards 0.0 as frames approach the
/// frame target. Without an explicit target the total is estimated once from
/// the duration of the first update.
#[derive(Debug, Clone)]
pub struct TrainingProgress {
    frames: u64,
    total_frames: Option<u64>,
    estimated: bool,
    remaining: f64,
}

impl TrainingProgress {
    pub fn new(total_frames: Option<u64>) -> Self {
        Self {
            frames: 0,
            total_frames,
            estimated: false,
            remaining: 1.0,
        }
    }

    /// Frames processed so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Explicit or estimated frame total, if known.
    pub fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    /// Whether `total_frames` came from the wall-clock estimate.
    pub fn is_estimated(&self) -> bool {
        self.estimated
    }

    /// Fraction of training remaining, in [0, 1].
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Adds the frames of one update.
    pub fn add_frames(&mut self, frames: u64) {
        self.frames += frames;
    }

    /// Extrapolates the achievable frame total from one update's duration.
    ///
    /// Does nothing once a total is known, so the first estimate sticks for
    /// the rest of the run.
    pub fn estimate_total(
        &mut self,
        frames_per_update: u64,
        update_duration: Duration,
        stop_time: Duration,
    ) {
        if self.total_frames.is_some() || update_duration.is_zero() {
            return;
        }
        let updates = stop_time.as_secs_f64() / update_duration.as_secs_f64();
        let estimate = (frames_per_update as f64 * updates).ceil() as u64;
        self.total_frames = Some(estimate.max(frames_per_update));
        self.estimated = true;
    }

    /// Recomputes `1 - frames / total`, clamped to [0, 1].
    pub fn refresh_remaining(&mut self) {
        if let Some(total) = self.total_frames {
            self.remaining = if total == 0 {
                0.0
            } else {
                (1.0 - self.frames as f64 / total as f64).clamp(0.0, 1.0)
            };
        }
    }
}
