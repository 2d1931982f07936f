use std::io::{Read, Write};

use crate::error::{Md3Error, Result};
use crate::io_ext::{ReadExt, WriteExt};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Identifier at the start of every MD3 file and every mesh
pub const MD3_MAGIC: [u8; 4] = *b"IDP3";

/// The only MD3 version in circulation
pub const MD3_VERSION: i32 = 15;

/// Size of the file header in bytes
pub const HEADER_SIZE: usize = 108;

/// Size of the name fields of the file, mesh and texture records
pub const NAME_LEN: usize = 68;

/// MD3 file header
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Md3Header {
    /// Always "IDP3"
    pub ident: String,
    pub version: i32,
    /// Name stored in the file, often blank
    pub name: String,
    pub bone_frame_count: i32,
    pub tag_count: i32,
    pub mesh_count: i32,
    pub max_texture_count: i32,
    pub bone_frame_offset: i32,
    pub tag_offset: i32,
    pub mesh_offset: i32,
    pub file_size: i32,
}

impl Md3Header {
    /// Parse the header and check the identifier
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let ident = reader.read_fixed_string(MD3_MAGIC.len())?;
        if ident.as_bytes() != MD3_MAGIC {
            return Err(Md3Error::BadMagic {
                expected: "IDP3".to_string(),
                actual: ident,
            });
        }

        Ok(Self {
            ident,
            version: reader.read_i32_le()?,
            name: reader.read_fixed_string(NAME_LEN)?,
            bone_frame_count: reader.read_i32_le()?,
            tag_count: reader.read_i32_le()?,
            mesh_count: reader.read_i32_le()?,
            max_texture_count: reader.read_i32_le()?,
            bone_frame_offset: reader.read_i32_le()?,
            tag_offset: reader.read_i32_le()?,
            mesh_offset: reader.read_i32_le()?,
            file_size: reader.read_i32_le()?,
        })
    }

    /// Check version and size consistency.
    ///
    /// Counts must also be non-negative, otherwise computed section sizes
    /// are meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.version != MD3_VERSION {
            return Err(Md3Error::BadHeader(format!(
                "unsupported version {} (expected {MD3_VERSION})",
                self.version
            )));
        }
        if self.file_size <= self.tag_offset {
            return Err(Md3Error::BadHeader(format!(
                "file size {} does not exceed tag offset {}",
                self.file_size, self.tag_offset
            )));
        }
        if self.file_size < self.mesh_offset {
            return Err(Md3Error::BadHeader(format!(
                "file size {} is smaller than mesh offset {}",
                self.file_size, self.mesh_offset
            )));
        }
        for (what, count) in [
            ("bone frame", self.bone_frame_count),
            ("tag", self.tag_count),
            ("mesh", self.mesh_count),
        ] {
            if count < 0 {
                return Err(Md3Error::BadHeader(format!("negative {what} count {count}")));
            }
        }
        Ok(())
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MD3_MAGIC)?;
        writer.write_i32_le(self.version)?;
        writer.write_fixed_string(&self.name, NAME_LEN)?;
        writer.write_i32_le(self.bone_frame_count)?;
        writer.write_i32_le(self.tag_count)?;
        writer.write_i32_le(self.mesh_count)?;
        writer.write_i32_le(self.max_texture_count)?;
        writer.write_i32_le(self.bone_frame_offset)?;
        writer.write_i32_le(self.tag_offset)?;
        writer.write_i32_le(self.mesh_offset)?;
        writer.write_i32_le(self.file_size)?;
        Ok(())
    }
}

impl Default for Md3Header {
    fn default() -> Self {
        Self {
            ident: "IDP3".to_string(),
            version: MD3_VERSION,
            name: String::new(),
            bone_frame_count: 0,
            tag_count: 0,
            mesh_count: 0,
            max_texture_count: 0,
            bone_frame_offset: HEADER_SIZE as i32,
            tag_offset: HEADER_SIZE as i32,
            mesh_offset: HEADER_SIZE as i32,
            file_size: HEADER_SIZE as i32,
        }
    }
}
