//! Per-node playback position.

use super::config::AnimationClip;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Current and next keyframe of a node and the blend between them
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct AnimationCursor {
    pub current: i32,
    pub next: i32,
    /// Weight of `next`; normally in [0, 1)
    pub fraction: f32,
}

impl AnimationCursor {
    /// Starting position of a freshly loaded model with `frame_count` frames
    pub fn initial(frame_count: usize) -> Self {
        Self {
            current: 0,
            next: i32::from(frame_count > 1),
            fraction: 0.0,
        }
    }

    /// Whether a pose needs blending between two frames
    pub fn is_blending(&self) -> bool {
        self.fraction != 0.0 && self.current != self.next
    }
}

impl Default for AnimationCursor {
    fn default() -> Self {
        Self::initial(0)
    }
}

/// Frame range of a clip as seen by one model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipBounds {
    pub first: i32,
    pub count: i32,
    pub looping: i32,
    /// One past the last frame played
    pub upper: i32,
}

impl ClipBounds {
    /// Bounds of `clip` on a model with `frame_count` frames, or `None` when
    /// the clip starts outside the model
    pub fn new(clip: &AnimationClip, frame_count: usize) -> Option<Self> {
        let frames = i32::try_from(frame_count).unwrap_or(i32::MAX);
        if clip.first < 0 || clip.first >= frames {
            return None;
        }
        let upper = if clip.count < 0 {
            frames
        } else {
            frames.min(clip.first.saturating_add(clip.count))
        };
        Some(Self {
            first: clip.first,
            count: clip.count,
            looping: clip.looping,
            upper,
        })
    }

    /// Frame after `n`, wrapping to the loop start
    pub fn next(&self, n: i32) -> i32 {
        if n < self.upper - 1 {
            n + 1
        } else if self.count < 0 {
            self.first
        } else if self.looping != 0 {
            self.first.wrapping_add(self.count.wrapping_sub(self.looping))
        } else {
            self.first
        }
    }

    /// Frame before `n`, wrapping to the last frame
    pub fn prev(&self, n: i32) -> i32 {
        if n == self.first {
            self.upper - 1
        } else {
            n.wrapping_sub(1)
        }
    }
}
