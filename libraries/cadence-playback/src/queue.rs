//! Queue engine
//!
//! Holds the ordered tracks slated for playback, a cursor, and the
//! shuffle/repeat modes that decide what plays next.
//!
//! ```text
//! natural:  [A, B, C, D, E]      load order, restored when shuffle turns off
//! tracks:   [C, E, A, D, B]      play order (shuffled here)
//!                ^ cursor
//! ```
//!
//! Invariant: `cursor < tracks.len()` whenever the queue is non-empty.

use crate::error::{PlaybackError, Result};
use crate::shuffle::shuffle_with_anchor_using;
use crate::types::{Direction, PrevAtStart, QueueTrack};
use cadence_core::{RepeatMode, TrackId};
use rand::{thread_rng, Rng};

#[derive(Debug, Clone, Default)]
pub struct Queue {
    /// Play order
    tracks: Vec<QueueTrack>,

    /// Order the queue was loaded in
    natural: Vec<QueueTrack>,

    cursor: usize,
    shuffled: bool,
    repeat: RepeatMode,
    prev_at_start: PrevAtStart,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty queue with a boundary policy for `previous`
    pub fn with_prev_policy(prev_at_start: PrevAtStart) -> Self {
        Self {
            prev_at_start,
            ..Self::default()
        }
    }

    /// Replace the queue with `tracks`, starting at `start_index`
    ///
    /// With `shuffled`, the start track moves to the front and the rest are
    /// permuted; the cursor is then 0. An empty source clears the queue.
    pub fn load(
        &mut self,
        tracks: Vec<QueueTrack>,
        start_index: usize,
        shuffled: bool,
    ) -> Result<Option<&QueueTrack>> {
        self.load_using(tracks, start_index, shuffled, &mut thread_rng())
    }

    /// [`Queue::load`] with a caller-supplied RNG
    pub fn load_using<R: Rng + ?Sized>(
        &mut self,
        tracks: Vec<QueueTrack>,
        start_index: usize,
        shuffled: bool,
        rng: &mut R,
    ) -> Result<Option<&QueueTrack>> {
        if tracks.is_empty() {
            self.tracks.clear();
            self.natural.clear();
            self.cursor = 0;
            self.shuffled = shuffled;
            return Ok(None);
        }

        if start_index >= tracks.len() {
            return Err(PlaybackError::IndexOutOfBounds {
                index: start_index,
                len: tracks.len(),
            });
        }

        if shuffled {
            self.tracks = shuffle_with_anchor_using(&tracks, start_index, rng);
            self.cursor = 0;
        } else {
            self.tracks = tracks.clone();
            self.cursor = start_index;
        }
        self.natural = tracks;
        self.shuffled = shuffled;

        Ok(self.current())
    }

    /// Play `track`, using `context` as the surrounding queue
    ///
    /// When `context` contains the track this is a load anchored at its
    /// position. Otherwise the track is prefixed to the context so `next`
    /// still has somewhere to go. The current shuffle flag is kept.
    pub fn play_single(
        &mut self,
        track: QueueTrack,
        context: Option<Vec<QueueTrack>>,
    ) -> Option<&QueueTrack> {
        self.play_single_using(track, context, &mut thread_rng())
    }

    /// [`Queue::play_single`] with a caller-supplied RNG
    pub fn play_single_using<R: Rng + ?Sized>(
        &mut self,
        track: QueueTrack,
        context: Option<Vec<QueueTrack>>,
        rng: &mut R,
    ) -> Option<&QueueTrack> {
        let mut tracks = context.unwrap_or_default();
        let start = match tracks.iter().position(|t| t.id == track.id) {
            Some(index) => index,
            None => {
                tracks.insert(0, track);
                0
            }
        };

        let shuffled = self.shuffled;
        // `tracks` is non-empty and `start` indexes into it
        self.load_using(tracks, start, shuffled, rng).ok().flatten()
    }

    /// Move the cursor one step in `direction`
    ///
    /// Returns the new current track, or `None` when the move is not
    /// possible (empty queue, or a boundary without repeat-all). The cursor
    /// only changes on success.
    pub fn advance(&mut self, direction: Direction) -> Option<&QueueTrack> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }

        let index = match direction {
            Direction::Next => {
                if self.cursor + 1 < len {
                    self.cursor + 1
                } else if self.repeat == RepeatMode::All {
                    0
                } else {
                    return None;
                }
            }
            Direction::Prev => {
                if self.cursor > 0 {
                    self.cursor - 1
                } else if self.repeat == RepeatMode::All {
                    len - 1
                } else {
                    match self.prev_at_start {
                        PrevAtStart::Stop => return None,
                        PrevAtStart::Replay => 0,
                    }
                }
            }
        };

        self.cursor = index;
        self.tracks.get(index)
    }

    /// Jump the cursor to `index` in play order
    pub fn select(&mut self, index: usize) -> Result<&QueueTrack> {
        let len = self.tracks.len();
        if index >= len {
            return Err(PlaybackError::IndexOutOfBounds { index, len });
        }
        self.cursor = index;
        Ok(&self.tracks[index])
    }

    /// Position of a track in play order
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    /// Flip shuffle, returning the new flag
    ///
    /// On: the current track moves to the front and the rest is permuted.
    /// Off: the natural order comes back and the cursor follows the current
    /// track (index 0 if it is not part of the natural order).
    pub fn toggle_shuffle(&mut self) -> bool {
        self.toggle_shuffle_using(&mut thread_rng())
    }

    /// [`Queue::toggle_shuffle`] with a caller-supplied RNG
    pub fn toggle_shuffle_using<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.shuffled = !self.shuffled;

        if self.tracks.is_empty() {
            return self.shuffled;
        }

        if self.shuffled {
            self.tracks = shuffle_with_anchor_using(&self.tracks, self.cursor, rng);
            self.cursor = 0;
        } else {
            let current_id = self.current().map(|t| t.id.clone());
            self.tracks = self.natural.clone();
            self.cursor = current_id
                .and_then(|id| self.position_of(&id))
                .unwrap_or(0);
        }

        self.shuffled
    }

    /// off -> all -> one -> off
    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn prev_at_start(&self) -> PrevAtStart {
        self.prev_at_start
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffled
    }

    /// Currently selected track, `None` when empty
    pub fn current(&self) -> Option<&QueueTrack> {
        self.tracks.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Tracks in play order
    pub fn tracks(&self) -> &[QueueTrack] {
        &self.tracks
    }

    /// Tracks in load order
    pub fn natural_order(&self) -> &[QueueTrack] {
        &self.natural
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop all tracks; modes are kept
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.natural.clear();
        self.cursor = 0;
    }

    /// Rebuild queue state verbatim, e.g. from a persisted snapshot
    ///
    /// An out-of-range cursor falls back to 0; an empty natural order falls
    /// back to the play order.
    pub fn restore(
        &mut self,
        tracks: Vec<QueueTrack>,
        natural: Vec<QueueTrack>,
        cursor: usize,
        shuffled: bool,
        repeat: RepeatMode,
    ) {
        self.natural = if natural.is_empty() {
            tracks.clone()
        } else {
            natural
        };
        self.cursor = if cursor < tracks.len() { cursor } else { 0 };
        self.tracks = tracks;
        self.shuffled = shuffled;
        self.repeat = repeat;
    }
}
