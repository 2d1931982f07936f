//! Advancing the playback position of every node of a scene.

use log::{debug, trace};

use super::config::{AnimationClip, AnimationType};
use super::cursor::{AnimationCursor, ClipBounds};
use crate::error::Result;
use crate::scene::{ModelRole, NodeId, SceneGraph};

/// Amount an interpolated step moves the blend fraction
pub const FRACTION: f32 = 0.34;

/// Blend fraction after an interpolated step back over a keyframe
const PREVIOUS_FRACTION: f32 = 0.8;

/// Playback operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockOp {
    Next,
    Previous,
    Rewind,
}

/// Drives node cursors through the frames of one clip
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClock {
    clip: AnimationClip,
    interpolate: bool,
}

impl AnimationClock {
    pub fn new(clip: AnimationClip) -> Self {
        Self {
            clip,
            interpolate: false,
        }
    }

    pub fn with_interpolation(mut self, interpolate: bool) -> Self {
        self.interpolate = interpolate;
        self
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn set_clip(&mut self, clip: AnimationClip) {
        self.clip = clip;
    }

    pub fn interpolate(&self) -> bool {
        self.interpolate
    }

    pub fn set_interpolate(&mut self, interpolate: bool) {
        self.interpolate = interpolate;
    }

    /// Ticks per second that play the clip at its own fps
    pub fn tick_rate(&self) -> f32 {
        let fps = self.clip.fps as f32;
        if self.interpolate { fps / FRACTION } else { fps }
    }

    /// Whether the clip drives a model with `role`
    pub fn applies_to(&self, role: ModelRole) -> bool {
        match self.clip.kind {
            AnimationType::All => true,
            AnimationType::Both => role.legs || role.torso,
            AnimationType::Legs => role.legs,
            AnimationType::Torso => role.torso,
        }
    }

    /// Apply `op` to every node of the subtree at `root`.
    ///
    /// Nodes the clip does not apply to, or whose frame range does not
    /// contain the clip's first frame, are left alone; their children are
    /// still visited.
    pub fn apply(&self, graph: &mut SceneGraph, root: NodeId, op: ClockOp) -> Result<()> {
        graph.visit_mut(root, |id, node| {
            if !self.applies_to(node.role()) {
                return;
            }
            let Some(bounds) = ClipBounds::new(&self.clip, node.model.frame_count()) else {
                debug!(
                    "'{}' starts at frame {} but {} has {} frames",
                    self.clip.name,
                    self.clip.first,
                    id,
                    node.model.frame_count()
                );
                return;
            };
            self.step(&mut node.cursor, &bounds, op);
            trace!("{:?} on {}: {:?}", op, id, node.cursor);
        })
    }

    /// Apply `op` to a single cursor
    pub fn step(&self, cursor: &mut AnimationCursor, bounds: &ClipBounds, op: ClockOp) {
        match op {
            ClockOp::Next => {
                if self.interpolate {
                    cursor.fraction += FRACTION;
                    if cursor.fraction >= 1.0 {
                        cursor.current = cursor.next;
                        cursor.next = bounds.next(cursor.next);
                        cursor.fraction = 0.0;
                    }
                } else {
                    cursor.current = cursor.next;
                    cursor.next = bounds.next(cursor.next);
                }
            }
            ClockOp::Previous => {
                if self.interpolate {
                    cursor.fraction -= FRACTION;
                    if cursor.fraction < 0.0 {
                        cursor.next = cursor.current;
                        cursor.current = bounds.prev(cursor.current);
                        cursor.fraction = PREVIOUS_FRACTION;
                    }
                } else {
                    cursor.next = cursor.current;
                    cursor.current = bounds.prev(cursor.current);
                }
            }
            ClockOp::Rewind => {
                cursor.current = bounds.first;
                cursor.next = bounds.next(bounds.first);
                cursor.fraction = 0.0;
            }
        }
    }
}
