//! Platform-agnostic audio output trait
//!
//! The session drives exactly one output. Real outputs (a browser `<audio>`
//! element, a desktop sink) live outside this crate and report back through
//! [`crate::TransportEvent`]s tagged with the generation passed to `load`.

use crate::error::Result;
use crate::types::QueueTrack;
use cadence_core::TrackId;
use std::sync::{Arc, Mutex, MutexGuard};

/// Single physical audio output
///
/// Hosts may move a session between runtime threads.
pub trait AudioOutput: Send + Sync {
    /// Start fetching `track`
    ///
    /// `generation` identifies this load; events for older generations are
    /// discarded by the session.
    fn load(&mut self, track: &QueueTrack, generation: u64) -> Result<()>;

    /// Start or resume audible playback
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    /// Move the playhead, seconds from track start
    fn seek(&mut self, position: f64) -> Result<()>;

    /// 0.0 ..= 1.0
    fn set_volume(&mut self, volume: f32);

    /// Stop and unload
    fn stop(&mut self);
}

/// What a [`NullOutput`] has been told to do
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputState {
    pub loaded: Option<TrackId>,
    pub generation: u64,
    pub playing: bool,
    pub position: f64,
    pub volume: f32,

    /// Number of `load` calls so far
    pub loads: usize,
}

/// Headless output that only records transport state
///
/// Used where the real output runs elsewhere (the server hosts sessions for
/// remote clients). Clones share state, so a clone kept aside can inspect
/// what the session did.
#[derive(Debug, Clone, Default)]
pub struct NullOutput {
    state: Arc<Mutex<OutputState>>,
}

impl NullOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded state
    pub fn state(&self) -> OutputState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, OutputState> {
        // Recorded state stays usable after a panic elsewhere
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AudioOutput for NullOutput {
    fn load(&mut self, track: &QueueTrack, generation: u64) -> Result<()> {
        let mut state = self.lock();
        state.loaded = Some(track.id.clone());
        state.generation = generation;
        state.playing = false;
        state.position = 0.0;
        state.loads += 1;
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.lock().playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.lock().playing = false;
    }

    fn seek(&mut self, position: f64) -> Result<()> {
        self.lock().position = position;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) {
        self.lock().volume = volume;
    }

    fn stop(&mut self) {
        let mut state = self.lock();
        state.loaded = None;
        state.playing = false;
        state.position = 0.0;
    }
}
