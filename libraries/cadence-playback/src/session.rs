//! Playback session - binds the queue to one audio output
//!
//! Coordinates queue, volume, recently-played log and transport state. Each
//! track switch bumps a load generation; transport events carrying an older
//! generation are stale and ignored.

use crate::{
    error::{PlaybackError, Result},
    events::{SessionEvent, TransportEvent, TransportEventKind},
    output::AudioOutput,
    queue::Queue,
    recent::RecentlyPlayed,
    types::{Direction, PlaybackConfig, PlaybackState, QueueTrack},
    volume::Volume,
};
use cadence_core::{RepeatMode, SessionSnapshot, TrackId};
use chrono::Utc;
use serde::Serialize;

/// Serializable view of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub state: PlaybackState,
    pub is_playing: bool,
    pub current_track: Option<QueueTrack>,
    pub queue: Vec<QueueTrack>,
    pub cursor: usize,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
    pub volume: f32,
    pub muted: bool,
    pub position: f64,
    pub duration: Option<f64>,
    pub generation: u64,
}

pub struct PlaybackSession {
    queue: Queue,
    output: Box<dyn AudioOutput>,
    state: PlaybackState,
    volume: Volume,

    /// Seconds into the current track
    position: f64,
    duration: Option<f64>,

    /// Bumped on every load; the output echoes it back in events
    generation: u64,

    /// Whether the output holds the current track (false after restore)
    output_loaded: bool,

    recent: RecentlyPlayed,
    pending_events: Vec<SessionEvent>,
}

impl PlaybackSession {
    /// Create new session driving `output`
    pub fn new(config: PlaybackConfig, output: Box<dyn AudioOutput>) -> Self {
        let mut queue = Queue::with_prev_policy(config.prev_at_start);
        queue.set_repeat(config.repeat);

        let mut session = Self {
            queue,
            output,
            state: PlaybackState::Stopped,
            volume: Volume::new(config.volume),
            position: 0.0,
            duration: None,
            generation: 0,
            output_loaded: false,
            recent: RecentlyPlayed::new(config.recent_capacity),
            pending_events: Vec::new(),
        };
        let level = session.volume.effective();
        session.output.set_volume(level);
        session
    }

    // ===== Queue Loading =====

    /// Replace the queue and start playing at `start_index`
    ///
    /// An empty source stops playback and clears the queue.
    pub fn load_queue(
        &mut self,
        tracks: Vec<QueueTrack>,
        start_index: usize,
        shuffled: bool,
    ) -> Result<Option<QueueTrack>> {
        let previous = self.current_id();
        let current = self.queue.load(tracks, start_index, shuffled)?.cloned();
        self.emit(SessionEvent::QueueChanged {
            length: self.queue.len(),
        });

        match current {
            Some(track) => {
                self.start_track(&track, previous)?;
                Ok(Some(track))
            }
            None => {
                self.stop_output();
                Ok(None)
            }
        }
    }

    /// Play `track` with `context` as the surrounding queue
    pub fn play_single(
        &mut self,
        track: QueueTrack,
        context: Option<Vec<QueueTrack>>,
    ) -> Result<QueueTrack> {
        let previous = self.current_id();
        let current = self
            .queue
            .play_single(track, context)
            .cloned()
            .ok_or(PlaybackError::NoTrackLoaded)?;
        self.emit(SessionEvent::QueueChanged {
            length: self.queue.len(),
        });
        self.start_track(&current, previous)?;
        Ok(current)
    }

    /// Play `track` now
    ///
    /// A track already in the queue is jumped to; anything else is played
    /// with the current queue as context.
    pub fn play(&mut self, track: QueueTrack) -> Result<QueueTrack> {
        match self.queue.position_of(&track.id) {
            Some(index) => {
                let previous = self.current_id();
                let current = self.queue.select(index)?.clone();
                self.start_track(&current, previous)?;
                Ok(current)
            }
            None => {
                let context = self.queue.natural_order().to_vec();
                self.play_single(track, Some(context))
            }
        }
    }

    // ===== Transport Control =====

    /// Resume the current track
    ///
    /// After a restore the output holds nothing yet, so the track is loaded
    /// first and played from the restored position.
    pub fn resume(&mut self) -> Result<()> {
        let track = self.queue.current().cloned().ok_or(PlaybackError::NoTrackLoaded)?;

        if self.state == PlaybackState::Playing {
            return Ok(());
        }

        if !self.output_loaded {
            let position = self.position;
            self.generation += 1;
            self.output.load(&track, self.generation)?;
            self.output_loaded = true;
            if position > 0.0 {
                self.output.seek(position)?;
            }
        }

        self.output.play()?;
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Pause playback; resumable
    pub fn pause(&mut self) {
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
            self.output.pause();
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Move the playhead, seconds from track start
    ///
    /// Negative positions clamp to 0 and known durations cap the position.
    pub fn seek(&mut self, position: f64) -> Result<()> {
        if self.queue.current().is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        if !position.is_finite() {
            return Err(PlaybackError::InvalidOperation(format!(
                "seek position must be a finite number, got {}",
                position
            )));
        }

        let mut target = position.max(0.0);
        if let Some(duration) = self.duration {
            target = target.min(duration);
        }

        if self.output_loaded {
            self.output.seek(target)?;
        }
        self.position = target;
        self.emit(SessionEvent::PositionUpdate { position: target });
        Ok(())
    }

    /// Set volume, clamped to 0.0..=1.0
    pub fn set_volume(&mut self, level: f32) -> Result<f32> {
        let level = self.volume.set_level(level)?;
        self.output.set_volume(self.volume.effective());
        self.emit(SessionEvent::VolumeChanged { level });
        Ok(level)
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.volume.toggle_mute();
        self.output.set_volume(self.volume.effective());
        self.volume.is_muted()
    }

    // ===== Navigation =====

    /// Skip to next track
    ///
    /// At the end of a non-repeating queue nothing changes and `None` is
    /// returned.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<Option<QueueTrack>> {
        self.step(Direction::Next)
    }

    /// Go to previous track, subject to the queue's boundary policy
    pub fn previous(&mut self) -> Result<Option<QueueTrack>> {
        self.step(Direction::Prev)
    }

    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.queue.toggle_shuffle();
        self.emit(SessionEvent::ShuffleChanged { enabled });
        enabled
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        let mode = self.queue.cycle_repeat();
        self.emit(SessionEvent::RepeatChanged { mode });
        mode
    }

    /// Current track finished
    ///
    /// Repeat-one replays it from 0. Otherwise the queue advances; at the end
    /// of a non-repeating queue playback pauses with the last track still
    /// current.
    pub fn on_track_ended(&mut self) -> Result<Option<QueueTrack>> {
        let Some(finished) = self.queue.current().cloned() else {
            return Ok(None);
        };
        self.emit(SessionEvent::TrackFinished {
            track_id: finished.id.clone(),
        });

        if self.queue.repeat() == RepeatMode::One {
            self.output.seek(0.0)?;
            self.output.play()?;
            self.position = 0.0;
            self.set_state(PlaybackState::Playing);
            return Ok(Some(finished));
        }

        match self.queue.advance(Direction::Next).cloned() {
            Some(track) => {
                self.start_track(&track, Some(finished.id))?;
                Ok(Some(track))
            }
            None => {
                self.output.pause();
                self.set_state(PlaybackState::Paused);
                self.emit(SessionEvent::QueueEnded);
                Ok(None)
            }
        }
    }

    /// Apply a callback from the output
    ///
    /// Returns `false` for stale events (older generation), which are
    /// dropped without effect.
    pub fn handle_transport(&mut self, event: TransportEvent) -> Result<bool> {
        if event.generation != self.generation || !self.output_loaded {
            return Ok(false);
        }

        match event.kind {
            TransportEventKind::Playing => self.set_state(PlaybackState::Playing),
            TransportEventKind::Paused => {
                if self.state != PlaybackState::Stopped {
                    self.set_state(PlaybackState::Paused);
                }
            }
            TransportEventKind::Ended => {
                self.on_track_ended()?;
            }
            TransportEventKind::TimeUpdate { position } => {
                if position.is_finite() {
                    self.position = position.max(0.0);
                    self.emit(SessionEvent::PositionUpdate {
                        position: self.position,
                    });
                }
            }
            TransportEventKind::Loaded { duration } => {
                if duration.is_finite() && duration > 0.0 {
                    self.duration = Some(duration);
                }
            }
        }
        Ok(true)
    }

    // ===== Persistence =====

    /// Capture the session for resuming later
    ///
    /// `None` when nothing is queued.
    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        let current = self.queue.current()?;
        Some(SessionSnapshot {
            current_track_id: Some(current.id.clone()),
            queue_track_ids: self.queue.tracks().iter().map(|t| t.id.clone()).collect(),
            natural_track_ids: self
                .queue
                .natural_order()
                .iter()
                .map(|t| t.id.clone())
                .collect(),
            cursor: self.queue.cursor(),
            shuffle: self.queue.is_shuffled(),
            repeat_mode: self.queue.repeat(),
            volume: self.volume.level(),
            saved_at: Utc::now(),
        })
    }

    /// Rebuild from a snapshot without starting playback
    ///
    /// `resolve` maps ids back to tracks; ids it cannot resolve are dropped
    /// and the cursor follows the saved current track.
    pub fn restore_snapshot<F>(&mut self, snapshot: &SessionSnapshot, mut resolve: F)
    where
        F: FnMut(&TrackId) -> Option<QueueTrack>,
    {
        let tracks: Vec<QueueTrack> = snapshot
            .queue_track_ids
            .iter()
            .filter_map(&mut resolve)
            .collect();
        let natural: Vec<QueueTrack> = snapshot
            .natural_track_ids
            .iter()
            .filter_map(&mut resolve)
            .collect();

        let cursor = snapshot
            .current_track_id
            .as_ref()
            .and_then(|id| tracks.iter().position(|t| &t.id == id))
            .unwrap_or(snapshot.cursor);

        self.output.stop();
        self.output_loaded = false;
        self.generation += 1;
        self.queue
            .restore(tracks, natural, cursor, snapshot.shuffle, snapshot.repeat_mode);

        // Snapshot volumes are finite unless hand-edited
        if self.volume.set_level(snapshot.volume).is_ok() {
            self.output.set_volume(self.volume.effective());
        }

        self.position = 0.0;
        self.duration = self
            .queue
            .current()
            .and_then(|t| t.duration)
            .map(|d| d.as_secs_f64());

        let state = if self.queue.is_empty() {
            PlaybackState::Stopped
        } else {
            PlaybackState::Paused
        };
        self.set_state(state);
        self.emit(SessionEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    /// Terminal teardown: stop audio, drop the current track and queue
    ///
    /// The owner is responsible for clearing the persisted snapshot.
    pub fn close(&mut self) {
        self.stop_output();
        self.queue.clear();
        self.emit(SessionEvent::Closed);
    }

    // ===== Recently Played =====

    pub fn recent(&self) -> &RecentlyPlayed {
        &self.recent
    }

    /// Replace the recently-played log, e.g. with a persisted one
    pub fn restore_recent(&mut self, ids: Vec<TrackId>) {
        self.recent = RecentlyPlayed::from_ids(ids, self.recent.capacity());
    }

    // ===== State Queries =====

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_track(&self) -> Option<&QueueTrack> {
        self.queue.current()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Generation of the current load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            state: self.state,
            is_playing: self.is_playing(),
            current_track: self.queue.current().cloned(),
            queue: self.queue.tracks().to_vec(),
            cursor: self.queue.cursor(),
            shuffle: self.queue.is_shuffled(),
            repeat_mode: self.queue.repeat(),
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            position: self.position,
            duration: self.duration,
            generation: self.generation,
        }
    }

    // ===== Events =====

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Internals =====

    fn step(&mut self, direction: Direction) -> Result<Option<QueueTrack>> {
        let previous = self.current_id();
        match self.queue.advance(direction).cloned() {
            Some(track) => {
                self.start_track(&track, previous)?;
                Ok(Some(track))
            }
            None => Ok(None),
        }
    }

    /// Load `track` into the output under a fresh generation and play it
    fn start_track(&mut self, track: &QueueTrack, previous: Option<TrackId>) -> Result<()> {
        self.generation += 1;
        self.position = 0.0;
        self.duration = track.duration.map(|d| d.as_secs_f64());

        self.set_state(PlaybackState::Loading);
        self.output.load(track, self.generation)?;
        self.output_loaded = true;
        self.output.play()?;

        self.recent.record(&track.id);
        self.emit(SessionEvent::TrackChanged {
            track_id: track.id.clone(),
            previous_track_id: previous,
            generation: self.generation,
        });
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    fn stop_output(&mut self) {
        self.output.stop();
        self.output_loaded = false;
        // In-flight events for the old load become stale
        self.generation += 1;
        self.position = 0.0;
        self.duration = None;
        self.set_state(PlaybackState::Stopped);
    }

    fn current_id(&self) -> Option<TrackId> {
        self.queue.current().map(|t| t.id.clone())
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.emit(SessionEvent::StateChanged { state });
        }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.pending_events.push(event);
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("state", &self.state)
            .field("queue_len", &self.queue.len())
            .field("cursor", &self.queue.cursor())
            .field("generation", &self.generation)
            .finish()
    }
}
