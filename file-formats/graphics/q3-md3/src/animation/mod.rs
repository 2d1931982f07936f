//! Keyframe animation: clip definitions, per-node cursors and the clock
//! that advances them.
//!
//! # Example
//!
//! ```rust,no_run
//! use q3_md3::animation::{AnimationClock, AnimationConfig, ClockOp};
//! use q3_md3::{Md3Model, SceneGraph};
//!
//! let config = AnimationConfig::load("models/players/sarge/animation.cfg").unwrap();
//! let mut graph = SceneGraph::new();
//! let lower = graph.insert(Md3Model::load("models/players/sarge/lower.md3").unwrap());
//!
//! let run = config.get("Run").unwrap().clone();
//! let clock = AnimationClock::new(run).with_interpolation(true);
//! clock.apply(&mut graph, lower, ClockOp::Rewind).unwrap();
//! for _ in 0..10 {
//!     clock.apply(&mut graph, lower, ClockOp::Next).unwrap();
//! }
//! ```

pub mod clock;
pub mod config;
pub mod cursor;

pub use clock::{AnimationClock, ClockOp, FRACTION};
pub use config::{ALL_FRAMES, ANIMATION_SLOTS, AnimationClip, AnimationConfig, AnimationType};
pub use cursor::{AnimationCursor, ClipBounds};
