use std::io::{Read, Write};

use custom_debug::Debug;
use log::trace;
use md3_utils::debug;

use crate::error::{Md3Error, Result};
use crate::header::{MD3_MAGIC, NAME_LEN};
use crate::io_ext::{ReadExt, WriteExt};
use crate::math::Vec3;
use crate::texture::Md3Texture;

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Size of the mesh header in bytes
pub const MESH_HEADER_SIZE: usize = 108;
/// Three vertex indices
pub const TRIANGLE_SIZE: usize = 12;
/// Texture name record
pub const TEXTURE_SIZE: usize = 68;
/// (u, v) pair
pub const TEX_COORD_SIZE: usize = 8;
/// Three fixed-point coordinates and two normal bytes
pub const VERTEX_SIZE: usize = 8;

/// Fixed-point scale of stored vertex coordinates
pub const XYZ_SCALE: f32 = 64.0;

/// Mesh header as stored in the file
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Md3MeshHeader {
    pub name: String,
    pub frame_count: i32,
    pub texture_count: i32,
    pub vertex_count: i32,
    pub triangle_count: i32,
    pub triangle_offset: i32,
    pub texture_offset: i32,
    pub tex_coord_offset: i32,
    pub vertex_offset: i32,
    pub mesh_size: i32,
}

impl Md3MeshHeader {
    /// Parse the header of mesh number `index`
    pub fn parse<R: Read>(reader: &mut R, index: usize) -> Result<Self> {
        let ident = reader.read_fixed_string(MD3_MAGIC.len())?;
        if ident.as_bytes() != MD3_MAGIC {
            return Err(Md3Error::BadMeshMagic {
                mesh: index,
                actual: ident,
            });
        }

        Ok(Self {
            name: reader.read_fixed_string(NAME_LEN)?,
            frame_count: reader.read_i32_le()?,
            texture_count: reader.read_i32_le()?,
            vertex_count: reader.read_i32_le()?,
            triangle_count: reader.read_i32_le()?,
            triangle_offset: reader.read_i32_le()?,
            texture_offset: reader.read_i32_le()?,
            tex_coord_offset: reader.read_i32_le()?,
            vertex_offset: reader.read_i32_le()?,
            mesh_size: reader.read_i32_le()?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        for (what, offset) in [
            ("triangle", self.triangle_offset),
            ("texcoord", self.tex_coord_offset),
            ("vertex", self.vertex_offset),
        ] {
            if self.mesh_size <= offset {
                return Err(Md3Error::BadMeshHeader(format!(
                    "mesh '{}': size {} does not exceed {what} offset {offset}",
                    self.name, self.mesh_size
                )));
            }
        }
        for (what, count) in [
            ("frame", self.frame_count),
            ("texture", self.texture_count),
            ("vertex", self.vertex_count),
            ("triangle", self.triangle_count),
        ] {
            if count < 0 {
                return Err(Md3Error::BadMeshHeader(format!(
                    "mesh '{}': negative {what} count {count}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MD3_MAGIC)?;
        writer.write_fixed_string(&self.name, NAME_LEN)?;
        for v in [
            self.frame_count,
            self.texture_count,
            self.vertex_count,
            self.triangle_count,
            self.triangle_offset,
            self.texture_offset,
            self.tex_coord_offset,
            self.vertex_offset,
            self.mesh_size,
        ] {
            writer.write_i32_le(v)?;
        }
        Ok(())
    }

    /// Bytes taken by the triangle, texture, texcoord and vertex sections.
    ///
    /// Counts large enough to overflow are a header error rather than a panic.
    pub fn section_sizes(&self) -> Result<[usize; 4]> {
        let count = |c: i32| usize::try_from(c).unwrap_or(0);
        let frames = count(self.frame_count);
        let vertices = count(self.vertex_count);
        let overflow = || {
            Md3Error::BadMeshHeader(format!(
                "mesh '{}': section sizes overflow ({} frames, {} vertices, {} triangles, {} textures)",
                self.name, self.frame_count, self.vertex_count, self.triangle_count, self.texture_count
            ))
        };
        Ok([
            TRIANGLE_SIZE
                .checked_mul(count(self.triangle_count))
                .ok_or_else(overflow)?,
            TEXTURE_SIZE
                .checked_mul(count(self.texture_count))
                .ok_or_else(overflow)?,
            TEX_COORD_SIZE.checked_mul(vertices).ok_or_else(overflow)?,
            VERTEX_SIZE
                .checked_mul(frames)
                .and_then(|n| n.checked_mul(vertices))
                .ok_or_else(overflow)?,
        ])
    }

    /// Bytes taken by the header and all sections, computed from the counts
    pub fn computed_size(&self) -> Result<usize> {
        self.section_sizes()?
            .into_iter()
            .try_fold(MESH_HEADER_SIZE, usize::checked_add)
            .ok_or_else(|| {
                Md3Error::BadMeshHeader(format!("mesh '{}': total size overflows", self.name))
            })
    }
}

/// Mesh sections, in the order the decoder tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MeshSection {
    Triangles,
    Textures,
    TexCoords,
    Vertices,
}

/// A keyframed triangle mesh
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Md3Mesh {
    pub header: Md3MeshHeader,
    pub textures: Vec<Md3Texture>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub triangles: Vec<[i32; 3]>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub tex_coords: Vec<[f32; 2]>,
    /// `frames[frame][vertex]`
    #[debug(with = debug::trimmed_collection_fmt)]
    pub frames: Vec<Vec<Vec3>>,
    /// Spherical normal angles (inclination, azimuth), in 2π/255 units,
    /// laid out like `frames`
    #[debug(with = debug::trimmed_collection_fmt)]
    pub normals: Vec<Vec<[u8; 2]>>,
}

impl Md3Mesh {
    /// Parse mesh number `index`, returning it with the number of bytes consumed.
    ///
    /// Sections are read in whatever order their offsets dictate.
    pub fn parse<R: Read>(reader: &mut R, index: usize) -> Result<(Self, usize)> {
        let header = Md3MeshHeader::parse(reader, index)?;
        header.validate()?;
        let [triangle_bytes, texture_bytes, tex_coord_bytes, vertex_bytes] =
            header.section_sizes()?;

        let frames = header.frame_count as usize;
        let textures = header.texture_count as usize;
        let vertices = header.vertex_count as usize;
        let triangles = header.triangle_count as usize;

        let mut mesh = Self {
            header,
            ..Self::default()
        };

        let mut pending: Vec<(MeshSection, i64, usize)> = [
            (MeshSection::Triangles, triangles, mesh.header.triangle_offset, triangle_bytes),
            (MeshSection::Textures, textures, mesh.header.texture_offset, texture_bytes),
            (MeshSection::TexCoords, vertices, mesh.header.tex_coord_offset, tex_coord_bytes),
            (MeshSection::Vertices, frames, mesh.header.vertex_offset, vertex_bytes),
        ]
        .into_iter()
        .filter(|&(_, count, _, _)| count > 0)
        .map(|(section, _, offset, size)| (section, i64::from(offset), size))
        .collect();

        let mut consumed = MESH_HEADER_SIZE;
        while !pending.is_empty() {
            let position = consumed as i64;
            let Some(slot) = pending.iter().position(|&(_, offset, _)| offset == position) else {
                return Err(Md3Error::CorruptMeshLayout {
                    mesh: index,
                    offset: position,
                });
            };
            let (section, _, size) = pending.remove(slot);
            trace!(
                "mesh {} '{}': {:?} at byte {}",
                index, mesh.header.name, section, position
            );

            match section {
                MeshSection::Triangles => {
                    for _ in 0..triangles {
                        mesh.triangles.push([
                            reader.read_i32_le()?,
                            reader.read_i32_le()?,
                            reader.read_i32_le()?,
                        ]);
                    }
                }
                MeshSection::Textures => {
                    for _ in 0..textures {
                        let name = reader.read_fixed_string(TEXTURE_SIZE)?;
                        mesh.textures.push(Md3Texture::named(&name));
                    }
                }
                MeshSection::TexCoords => {
                    for _ in 0..vertices {
                        mesh.tex_coords
                            .push([reader.read_f32_le()?, reader.read_f32_le()?]);
                    }
                }
                MeshSection::Vertices => {
                    for _ in 0..frames {
                        let mut positions = Vec::with_capacity(vertices.min(1 << 16));
                        let mut normals = Vec::with_capacity(vertices.min(1 << 16));
                        for _ in 0..vertices {
                            let x = f32::from(reader.read_i16_le()?) / XYZ_SCALE;
                            let y = f32::from(reader.read_i16_le()?) / XYZ_SCALE;
                            let z = f32::from(reader.read_i16_le()?) / XYZ_SCALE;
                            positions.push(Vec3::new(x, y, z));
                            normals.push([reader.read_byte()?, reader.read_byte()?]);
                        }
                        mesh.frames.push(positions);
                        mesh.normals.push(normals);
                    }
                }
            }
            consumed = consumed.checked_add(size).ok_or_else(|| {
                Md3Error::BadMeshHeader(format!("mesh '{}': total size overflows", mesh.header.name))
            })?;
        }

        log::debug!(
            "Parsed mesh {} '{}': {} frames, {} vertices, {} triangles, {} textures",
            index,
            mesh.header.name,
            frames,
            vertices,
            triangles,
            textures
        );
        Ok((mesh, consumed))
    }

    /// Write the mesh with freshly computed offsets.
    ///
    /// Layout: header, textures, triangles, texture coordinates, vertices.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let header = self.layout_header();
        header.write(writer)?;

        for texture in &self.textures {
            writer.write_fixed_string(&texture.name, TEXTURE_SIZE)?;
        }
        for tri in &self.triangles {
            for &index in tri {
                writer.write_i32_le(index)?;
            }
        }

        // Every section holds exactly `vertex_count` entries per frame
        let vertices = self.vertex_count();
        for i in 0..vertices {
            let uv = self.tex_coords.get(i).copied().unwrap_or_default();
            writer.write_f32_le(uv[0])?;
            writer.write_f32_le(uv[1])?;
        }
        for (f, frame) in self.frames.iter().enumerate() {
            let normals = self.normals.get(f);
            for i in 0..vertices {
                let v = frame.get(i).copied().unwrap_or_default();
                writer.write_i16_le(quantize(v.x))?;
                writer.write_i16_le(quantize(v.y))?;
                writer.write_i16_le(quantize(v.z))?;
                let normal = normals.and_then(|n| n.get(i)).copied().unwrap_or_default();
                writer.write_byte(normal[0])?;
                writer.write_byte(normal[1])?;
            }
        }
        Ok(())
    }

    /// Header matching the current contents, laid out in write order
    pub fn layout_header(&self) -> Md3MeshHeader {
        let textures = self.textures.len();
        let triangles = self.triangles.len();
        let vertices = self.vertex_count();
        let frames = self.frames.len();

        let texture_offset = MESH_HEADER_SIZE;
        let triangle_offset = texture_offset + TEXTURE_SIZE * textures;
        let tex_coord_offset = triangle_offset + TRIANGLE_SIZE * triangles;
        let vertex_offset = tex_coord_offset + TEX_COORD_SIZE * vertices;
        let mesh_size = vertex_offset + VERTEX_SIZE * frames * vertices;

        Md3MeshHeader {
            name: self.header.name.clone(),
            frame_count: frames as i32,
            texture_count: textures as i32,
            vertex_count: vertices as i32,
            triangle_count: triangles as i32,
            triangle_offset: triangle_offset as i32,
            texture_offset: texture_offset as i32,
            tex_coord_offset: tex_coord_offset as i32,
            vertex_offset: vertex_offset as i32,
            mesh_size: mesh_size as i32,
        }
    }

    pub fn name(&self) -> &str {
        &self.header.name
    }

    /// Vertices per frame
    pub fn vertex_count(&self) -> usize {
        self.frames
            .first()
            .map_or(self.tex_coords.len(), Vec::len)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Nearest fixed-point value of a coordinate, saturating at the i16 range
fn quantize(v: f32) -> i16 {
    (v * XYZ_SCALE)
        .round()
        .clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn quad() -> Md3Mesh {
        Md3Mesh {
            header: Md3MeshHeader {
                name: "h_head".to_string(),
                ..Md3MeshHeader::default()
            },
            textures: vec![Md3Texture::named("models/players/sarge/band.tga")],
            triangles: vec![[0, 1, 2], [2, 3, 0]],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            frames: vec![
                vec![
                    Vec3::new(0.0, 0.0, 0.0),
                    Vec3::new(1.0, 0.0, 0.0),
                    Vec3::new(1.0, 1.0, 0.0),
                    Vec3::new(0.0, 1.0, 0.0),
                ],
                vec![
                    Vec3::new(0.0, 0.0, 0.5),
                    Vec3::new(1.0, 0.0, 0.5),
                    Vec3::new(1.0, 1.0, 0.5),
                    Vec3::new(0.0, 1.0, -0.015625),
                ],
            ],
            normals: vec![vec![[0, 0]; 4], vec![[64, 128]; 4]],
        }
    }

    #[test]
    fn test_write_then_parse() {
        let mesh = quad();
        let mut bytes = Vec::new();
        mesh.write(&mut bytes).unwrap();
        assert_eq!(bytes.len(), mesh.layout_header().mesh_size as usize);

        let (parsed, consumed) = Md3Mesh::parse(&mut Cursor::new(&bytes), 0).unwrap();
        assert_eq!(consumed, bytes.len());
        assert_eq!(parsed.triangles, mesh.triangles);
        assert_eq!(parsed.tex_coords, mesh.tex_coords);
        assert_eq!(parsed.frames, mesh.frames);
        assert_eq!(parsed.normals, mesh.normals);
        assert_eq!(parsed.textures[0].name, "models/players/sarge/band.tga");
        assert_eq!(parsed.header, mesh.layout_header());
    }

    #[test]
    fn test_sections_in_declared_order() {
        // Vertices first, then texcoords, triangles, textures
        let mesh = quad();
        let natural = mesh.layout_header();
        let mut header = natural.clone();
        header.vertex_offset = MESH_HEADER_SIZE as i32;
        header.tex_coord_offset = header.vertex_offset + (VERTEX_SIZE * 2 * 4) as i32;
        header.triangle_offset = header.tex_coord_offset + (TEX_COORD_SIZE * 4) as i32;
        header.texture_offset = header.triangle_offset + (TRIANGLE_SIZE * 2) as i32;

        let mut natural_bytes = Vec::new();
        mesh.write(&mut natural_bytes).unwrap();
        let body = &natural_bytes[MESH_HEADER_SIZE..];
        let textures = &body[..TEXTURE_SIZE];
        let triangles = &body[TEXTURE_SIZE..TEXTURE_SIZE + 24];
        let uvs = &body[TEXTURE_SIZE + 24..TEXTURE_SIZE + 56];
        let verts = &body[TEXTURE_SIZE + 56..];

        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        bytes.extend_from_slice(verts);
        bytes.extend_from_slice(uvs);
        bytes.extend_from_slice(triangles);
        bytes.extend_from_slice(textures);

        let (parsed, _) = Md3Mesh::parse(&mut Cursor::new(bytes), 0).unwrap();
        assert_eq!(parsed.frames, mesh.frames);
        assert_eq!(parsed.triangles, mesh.triangles);
        assert_eq!(parsed.tex_coords, mesh.tex_coords);
        assert_eq!(parsed.textures.len(), 1);
    }

    #[test]
    fn test_bad_mesh_magic() {
        let mut bytes = Vec::new();
        quad().write(&mut bytes).unwrap();
        bytes[0] = b'X';
        let err = Md3Mesh::parse(&mut Cursor::new(bytes), 3).unwrap_err();
        assert!(matches!(err, Md3Error::BadMeshMagic { mesh: 3, .. }));
    }

    #[test]
    fn test_mesh_size_must_exceed_offsets() {
        let mut header = quad().layout_header();
        header.mesh_size = header.vertex_offset;
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        let err = Md3Mesh::parse(&mut Cursor::new(bytes), 0).unwrap_err();
        assert!(matches!(err, Md3Error::BadMeshHeader(_)));
    }

    #[test]
    fn test_oversized_counts_are_rejected() {
        let header = Md3MeshHeader {
            name: "huge".to_string(),
            frame_count: i32::MAX,
            vertex_count: i32::MAX,
            triangle_offset: 108,
            texture_offset: 108,
            tex_coord_offset: 108,
            vertex_offset: 108,
            mesh_size: 200,
            ..Md3MeshHeader::default()
        };
        assert!(matches!(
            header.computed_size(),
            Err(Md3Error::BadMeshHeader(_))
        ));

        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        let err = Md3Mesh::parse(&mut Cursor::new(bytes), 0).unwrap_err();
        assert!(matches!(err, Md3Error::BadMeshHeader(_)));
    }

    #[test]
    fn test_computed_size_matches_written_quad() {
        let mesh = quad();
        let mut bytes = Vec::new();
        mesh.write(&mut bytes).unwrap();
        assert_eq!(mesh.layout_header().computed_size().unwrap(), bytes.len());
    }

    #[test]
    fn test_misplaced_section_is_corrupt_layout() {
        let mut header = quad().layout_header();
        header.texture_offset += 4;
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        bytes.resize(header.mesh_size as usize, 0);
        let err = Md3Mesh::parse(&mut Cursor::new(bytes), 1).unwrap_err();
        assert!(matches!(
            err,
            Md3Error::CorruptMeshLayout { mesh: 1, offset: 108 }
        ));
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        let header = Md3MeshHeader {
            name: "empty".to_string(),
            triangle_offset: 108,
            texture_offset: 108,
            tex_coord_offset: 108,
            vertex_offset: 108,
            mesh_size: 109,
            ..Md3MeshHeader::default()
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        let (mesh, consumed) = Md3Mesh::parse(&mut Cursor::new(bytes), 0).unwrap();
        assert_eq!(consumed, MESH_HEADER_SIZE);
        assert!(mesh.frames.is_empty());
    }

    #[test]
    fn test_quantize_rounds_and_saturates() {
        assert_eq!(quantize(1.0), 64);
        assert_eq!(quantize(-0.015625), -1);
        assert_eq!(quantize(0.0079), 1);
        assert_eq!(quantize(1.0e6), i16::MAX);
    }
}
