//! Volume control
//!
//! Linear 0.0..=1.0 level as the client output expects it, plus a mute flag
//! that preserves the level.

use crate::error::{PlaybackError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// 0.0 ..= 1.0
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller, clamping `level` into range
    ///
    /// Non-finite input falls back to full volume.
    pub fn new(level: f32) -> Self {
        let level = if level.is_finite() {
            level.clamp(0.0, 1.0)
        } else {
            1.0
        };
        Self {
            level,
            muted: false,
        }
    }

    /// Set volume level, clamped to 0.0..=1.0
    ///
    /// Rejects NaN and infinities without changing the level.
    pub fn set_level(&mut self, level: f32) -> Result<f32> {
        if !level.is_finite() {
            return Err(PlaybackError::InvalidOperation(format!(
                "volume must be a finite number, got {}",
                level
            )));
        }
        self.level = level.clamp(0.0, 1.0);
        Ok(self.level)
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Mute audio (preserves volume level)
    pub fn mute(&mut self) {
        self.muted = true;
    }

    pub fn unmute(&mut self) {
        self.muted = false;
    }

    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Level handed to the output: 0.0 if muted
    pub fn effective(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(1.0)
    }
}
