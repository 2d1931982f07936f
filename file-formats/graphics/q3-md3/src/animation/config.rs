//! `animation.cfg` parsing.
//!
//! The file has a few header directives followed by up to 25 animation lines
//! of four integers each. Names and types are not in the file; the N-th
//! animation line always describes the N-th entry of [`ANIMATION_SLOTS`].

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use log::{trace, warn};

use crate::error::{Md3Error, Result};
use crate::math::Vec3;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Which sub-models a clip drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub enum AnimationType {
    /// Lower body, usually `lower.md3`
    Legs,
    /// Upper body, usually `upper.md3`
    Torso,
    /// Both legs and torso
    Both,
    /// Every sub-model
    All,
}

impl fmt::Display for AnimationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Legs => "Legs",
            Self::Torso => "Torso",
            Self::Both => "Both",
            Self::All => "All",
        };
        f.write_str(name)
    }
}

/// Names and types of the animation lines, in file order
pub const ANIMATION_SLOTS: [(&str, AnimationType); 25] = [
    ("Death 1", AnimationType::Both),
    ("Dead 1", AnimationType::Both),
    ("Death 2", AnimationType::Both),
    ("Dead 2", AnimationType::Both),
    ("Death 3", AnimationType::Both),
    ("Dead 3", AnimationType::Both),
    ("Gesture", AnimationType::Torso),
    ("Shoot", AnimationType::Torso),
    ("Hit", AnimationType::Torso),
    ("Drop Weapon", AnimationType::Torso),
    ("Raise Weapon", AnimationType::Torso),
    ("Stand With Weapon", AnimationType::Torso),
    ("Stand With Gauntlet", AnimationType::Torso),
    ("Crouched Walk", AnimationType::Legs),
    ("Walk", AnimationType::Legs),
    ("Run", AnimationType::Legs),
    ("Backpedal", AnimationType::Legs),
    ("Swim", AnimationType::Legs),
    ("Jump Forward", AnimationType::Legs),
    ("Land Forward", AnimationType::Legs),
    ("Jump Backward", AnimationType::Legs),
    ("Land Backward", AnimationType::Legs),
    ("Stand Idle", AnimationType::Legs),
    ("Crouched Idle", AnimationType::Legs),
    ("Turn In Place", AnimationType::Legs),
];

/// Name of the clip covering every frame of a model
pub const ALL_FRAMES: &str = "All Frames";

const FOOTSTEPS: [&str; 6] = ["default", "normal", "boot", "flesh", "mech", "energy"];

/// A named range of keyframes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct AnimationClip {
    pub name: String,
    pub kind: AnimationType,
    /// First keyframe, after the LEGS correction
    pub first: i32,
    /// Number of keyframes; negative means all remaining frames
    pub count: i32,
    /// Number of trailing frames that loop
    pub looping: i32,
    pub fps: i32,
    /// LEGS only: amount subtracted from the declared first frame
    pub offset: i32,
}

impl AnimationClip {
    /// Clip over every frame of any model, played at 20 fps
    pub fn all_frames() -> Self {
        Self {
            name: ALL_FRAMES.to_string(),
            kind: AnimationType::All,
            first: 0,
            count: -1,
            looping: 0,
            fps: 20,
            offset: 0,
        }
    }

    /// First frame as written in the animation.cfg
    pub fn declared_first_frame(&self) -> i32 {
        self.first.wrapping_add(self.offset)
    }
}

impl fmt::Display for AnimationClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} - {} {} {} {}",
            self.kind, self.name, self.first, self.count, self.looping, self.fps
        )
    }
}

/// Contents of an animation.cfg
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct AnimationConfig {
    /// 'm', 'f', 'n', or '?' when unknown
    pub sex: char,
    pub head_offset: Vec3,
    pub footsteps: String,
    clips: Vec<AnimationClip>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            sex: '?',
            head_offset: Vec3::ZERO,
            footsteps: "unspecified".to_string(),
            clips: Vec::new(),
        }
    }
}

fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split([' ', '\t', '\n', '\r', '\x0c', '/'])
        .filter(|t| !t.is_empty())
}

/// Argument `n` (after the directive itself) of a header line
fn directive_arg<'a>(line: &'a str, number: usize, n: usize) -> Result<&'a str> {
    tokens(line).nth(n + 1).ok_or_else(|| Md3Error::InvalidDirective {
        line: number,
        directive: line.to_string(),
    })
}

fn parse_animation_line(line: &str, number: usize) -> Result<[i32; 4]> {
    let mut values = [0i32; 4];
    let mut it = tokens(line);
    for (i, value) in values.iter_mut().enumerate() {
        let token = it.next().ok_or_else(|| Md3Error::CorruptAnimationLine {
            line: number,
            reason: format!("expected 4 integers, found {i}"),
        })?;
        *value = token
            .parse()
            .map_err(|e| Md3Error::CorruptAnimationLine {
                line: number,
                reason: format!("'{token}': {e}"),
            })?;
    }
    Ok(values)
}

/// LEGS lines are numbered as if the TORSO frames were part of the lower
/// model. The distance between the first LEGS and the first TORSO line is
/// taken once and subtracted from every LEGS line.
#[derive(Debug, Default)]
struct LegsCorrection {
    first_torso: Option<i32>,
    correction: Option<i32>,
}

impl LegsCorrection {
    fn torso(&mut self, first: i32) {
        self.first_torso.get_or_insert(first);
    }

    fn legs(&mut self, first: i32, number: usize) -> i32 {
        let first_torso = self.first_torso;
        *self.correction.get_or_insert_with(|| {
            let torso = first_torso.unwrap_or_else(|| {
                warn!("animation.cfg line {number}: LEGS animation before any TORSO animation");
                -1
            });
            first.wrapping_sub(torso)
        })
    }
}

impl AnimationConfig {
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        text.parse()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        fs::read_to_string(path)?.parse()
    }

    /// Clips in slot order
    pub fn clips(&self) -> &[AnimationClip] {
        &self.clips
    }

    pub fn get(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Append the "All Frames" clip unless present
    pub fn with_all_frames(mut self) -> Self {
        if self.get(ALL_FRAMES).is_none() {
            self.clips.push(AnimationClip::all_frames());
        }
        self
    }

    fn parse_header_line(&mut self, line: &str, number: usize) -> Result<bool> {
        if line.starts_with("sex") {
            let value = directive_arg(line, number, 0)?;
            let mut chars = value.chars();
            self.sex = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    warn!("animation.cfg line {number}: unknown sex '{value}'");
                    '?'
                }
            };
        } else if line.starts_with("headoffset") {
            let mut xyz = [0.0f32; 3];
            for (i, v) in xyz.iter_mut().enumerate() {
                *v = directive_arg(line, number, i)?
                    .parse()
                    .map_err(|_| Md3Error::InvalidDirective {
                        line: number,
                        directive: line.to_string(),
                    })?;
            }
            self.head_offset = Vec3::new(xyz[0], xyz[1], xyz[2]);
        } else if line.starts_with("footsteps") {
            let value = directive_arg(line, number, 0)?;
            self.footsteps = if FOOTSTEPS.iter().any(|f| f.eq_ignore_ascii_case(value)) {
                value.to_string()
            } else {
                warn!("animation.cfg line {number}: unknown footsteps '{value}'");
                format!("illegal footsteps value ({value})")
            };
        } else {
            return Ok(false);
        }
        Ok(true)
    }
}

impl FromStr for AnimationConfig {
    type Err = Md3Error;

    fn from_str(text: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut in_header = true;
        let mut frames = LegsCorrection::default();

        for (index, raw) in text.lines().enumerate() {
            let number = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }
            if in_header && config.parse_header_line(line, number)? {
                trace!("animation.cfg line {number}: header '{line}'");
                continue;
            }
            in_header = false;

            let Some(&(name, kind)) = ANIMATION_SLOTS.get(config.clips.len()) else {
                return Err(Md3Error::CorruptAnimationLine {
                    line: number,
                    reason: format!("more than {} animation lines", ANIMATION_SLOTS.len()),
                });
            };
            let [first, count, looping, fps] = parse_animation_line(line, number)?;
            let mut clip = AnimationClip {
                name: name.to_string(),
                kind,
                first,
                count,
                looping,
                fps,
                offset: 0,
            };

            match kind {
                AnimationType::Legs => {
                    let correction = frames.legs(first, number);
                    clip.first = first.wrapping_sub(correction);
                    clip.offset = correction;
                }
                AnimationType::Torso => frames.torso(first),
                AnimationType::Both | AnimationType::All => {}
            }

            trace!("animation.cfg line {number}: {clip}");
            config.clips.push(clip);
        }

        log::debug!(
            "Parsed animation.cfg: {} clips, sex '{}', footsteps '{}'",
            config.clips.len(),
            config.sex,
            config.footsteps
        );
        Ok(config)
    }
}
