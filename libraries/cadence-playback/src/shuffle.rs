//! Shuffle for queue randomization
//!
//! The anchor track (the one playing) always lands first; everything else is
//! permuted with Fisher-Yates.

use crate::types::QueueTrack;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Move `tracks[anchor]` to the front and shuffle the remainder
///
/// An out-of-range anchor shuffles the whole list.
pub fn shuffle_with_anchor(tracks: &[QueueTrack], anchor: usize) -> Vec<QueueTrack> {
    shuffle_with_anchor_using(tracks, anchor, &mut thread_rng())
}

/// Same as [`shuffle_with_anchor`] with a caller-supplied RNG
pub fn shuffle_with_anchor_using<R: Rng + ?Sized>(
    tracks: &[QueueTrack],
    anchor: usize,
    rng: &mut R,
) -> Vec<QueueTrack> {
    let mut rest: Vec<QueueTrack> = tracks
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != anchor)
        .map(|(_, t)| t.clone())
        .collect();
    rest.shuffle(rng);

    match tracks.get(anchor) {
        Some(current) => {
            let mut out = Vec::with_capacity(tracks.len());
            out.push(current.clone());
            out.extend(rest);
            out
        }
        None => rest,
    }
}
