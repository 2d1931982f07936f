use std::io::{Read, Write};

use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use crate::math::{Mat3, Mat4, Vec3};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Size of a tag record in bytes
pub const TAG_SIZE: usize = 112;

/// Size of the tag name field
pub const TAG_NAME_LEN: usize = 64;

/// Named attachment point of one keyframe
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Md3Tag {
    /// e.g. "tag_torso", "tag_head", "tag_weapon"
    pub name: String,
    pub position: Vec3,
    /// Orientation, `rotation.m[row][col]`
    pub rotation: Mat3,
}

impl Md3Tag {
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let name = reader.read_fixed_string(TAG_NAME_LEN)?;
        let position = reader.read_vec3()?;

        // Stored one column after the other
        let mut m = [[0.0f32; 3]; 3];
        for c in 0..3 {
            for row in &mut m {
                row[c] = reader.read_f32_le()?;
            }
        }

        Ok(Self {
            name,
            position,
            rotation: Mat3::new(m),
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_fixed_string(&self.name, TAG_NAME_LEN)?;
        writer.write_vec3(self.position)?;
        for c in 0..3 {
            for row in &self.rotation.m {
                writer.write_f32_le(row[c])?;
            }
        }
        Ok(())
    }

    /// Column-major transform placing a child model at this tag
    pub fn transform(&self) -> Mat4 {
        Mat4::from_rotation_translation(&self.rotation, self.position)
    }
}
