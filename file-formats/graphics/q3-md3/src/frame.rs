use std::io::{Read, Write};

use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::math::Vec3;
use crate::tag::Md3Tag;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Size of a bone frame record in bytes (tags are stored separately)
pub const BONE_FRAME_SIZE: usize = 56;

/// Size of the creator field
pub const CREATOR_LEN: usize = 16;

/// Keyframe metadata: bounds, origin and the tags of this frame.
///
/// Despite the name there is no skeleton; every vertex is keyframed on its own.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Md3BoneFrame {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub position: Vec3,
    pub scale: f32,
    pub creator: String,
    /// One tag per attachment point, filled from the tag section
    pub tags: Vec<Md3Tag>,
}

impl Md3BoneFrame {
    /// Parse the 56 byte record; `tags` is left empty
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            mins: reader.read_vec3()?,
            maxs: reader.read_vec3()?,
            position: reader.read_vec3()?,
            scale: reader.read_f32_le()?,
            creator: reader.read_fixed_string(CREATOR_LEN)?,
            tags: Vec::new(),
        })
    }

    /// Write the 56 byte record; tags are written by the model
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_vec3(self.mins)?;
        writer.write_vec3(self.maxs)?;
        writer.write_vec3(self.position)?;
        writer.write_f32_le(self.scale)?;
        writer.write_fixed_string(&self.creator, CREATOR_LEN)?;
        Ok(())
    }

    pub fn tag_by_name(&self, name: &str) -> Option<&Md3Tag> {
        self.tags.iter().find(|t| t.name == name)
    }
}
