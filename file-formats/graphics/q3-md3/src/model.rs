use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Write};
use std::path::Path;

use custom_debug::Debug;
use log::trace;
use md3_utils::debug;

use crate::error::{Md3Error, Result};
use crate::frame::{BONE_FRAME_SIZE, Md3BoneFrame};
use crate::header::{HEADER_SIZE, Md3Header};
use crate::mesh::Md3Mesh;
use crate::tag::{Md3Tag, TAG_SIZE};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Top level sections, in the order the decoder tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    BoneFrames,
    Tags,
    Meshes,
}

/// A decoded MD3 model
///
/// # Examples
///
/// ```rust,no_run
/// use q3_md3::Md3Model;
///
/// let model = Md3Model::load("models/players/sarge/upper.md3").unwrap();
/// println!("{} frames, {} meshes", model.frame_count(), model.meshes.len());
/// if let Some(head) = model.tag_index_by_name("tag_head") {
///     println!("head is attached at tag {head}");
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
pub struct Md3Model {
    pub header: Md3Header,
    /// Where the model was loaded from; decides the animation role
    pub load_name: String,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub bone_frames: Vec<Md3BoneFrame>,
    pub meshes: Vec<Md3Mesh>,
}

impl Md3Model {
    /// Decode a complete model from a reader.
    ///
    /// Sections are located purely by matching the running byte count
    /// against the offsets declared in the header, so any self-consistent
    /// section order is accepted.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let header = Md3Header::parse(reader)?;
        header.validate()?;

        let frame_count = header.bone_frame_count as usize;
        let tag_count = header.tag_count as usize;
        let mesh_count = header.mesh_count as usize;
        let overflow = || {
            Md3Error::BadHeader(format!(
                "section sizes overflow ({frame_count} bone frames, {tag_count} tags)"
            ))
        };
        let frame_bytes = BONE_FRAME_SIZE.checked_mul(frame_count).ok_or_else(overflow)?;
        let tag_bytes = TAG_SIZE
            .checked_mul(frame_count)
            .and_then(|n| n.checked_mul(tag_count))
            .ok_or_else(overflow)?;

        let mut pending: Vec<(Section, i64)> = [
            (Section::BoneFrames, frame_count, header.bone_frame_offset),
            (Section::Tags, tag_count, header.tag_offset),
            (Section::Meshes, mesh_count, header.mesh_offset),
        ]
        .into_iter()
        .filter(|&(_, count, _)| count > 0)
        .map(|(section, _, offset)| (section, i64::from(offset)))
        .collect();

        let mut bone_frames = Vec::new();
        let mut tags: Vec<Vec<Md3Tag>> = Vec::new();
        let mut meshes = Vec::new();
        let mut consumed = HEADER_SIZE;

        while !pending.is_empty() {
            let position = consumed as i64;
            let Some(slot) = pending.iter().position(|&(_, offset)| offset == position) else {
                return Err(Md3Error::CorruptSectionLayout { offset: position });
            };
            let (section, _) = pending.remove(slot);
            trace!("{:?} section at byte {}", section, position);

            match section {
                Section::BoneFrames => {
                    for _ in 0..frame_count {
                        bone_frames.push(Md3BoneFrame::parse(reader)?);
                    }
                    consumed += frame_bytes;
                }
                Section::Tags => {
                    for _ in 0..frame_count {
                        let mut frame_tags = Vec::with_capacity(tag_count.min(256));
                        for _ in 0..tag_count {
                            frame_tags.push(Md3Tag::parse(reader)?);
                        }
                        tags.push(frame_tags);
                    }
                    consumed += tag_bytes;
                }
                Section::Meshes => {
                    for index in 0..mesh_count {
                        let (mesh, size) = Md3Mesh::parse(reader, index)?;
                        meshes.push(mesh);
                        consumed = consumed.checked_add(size).ok_or_else(overflow)?;
                    }
                }
            }
        }

        // Tags may precede the bone frames in the file
        for (frame, frame_tags) in bone_frames.iter_mut().zip(tags) {
            frame.tags = frame_tags;
        }

        log::debug!(
            "Parsed MD3 '{}': {} bone frames, {} tags, {} meshes, {} bytes",
            header.name,
            frame_count,
            tag_count,
            mesh_count,
            consumed
        );

        Ok(Self {
            header,
            load_name: String::new(),
            bone_frames,
            meshes,
        })
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(&mut Cursor::new(data))
    }

    /// Load a model from disk; the path becomes the load name
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        Ok(Self::parse(&mut reader)?.with_load_name(&path.to_string_lossy()))
    }

    pub fn with_load_name(mut self, name: &str) -> Self {
        self.load_name = name.to_string();
        self
    }

    /// Encode the model in natural section order with recomputed offsets.
    ///
    /// Empty sections are given offset 108. A model with no frames, tags or
    /// meshes therefore fails the header check when read back.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.layout_header().write(writer)?;

        let tag_count = self.tag_count();
        for frame in &self.bone_frames {
            frame.write(writer)?;
        }
        for frame in &self.bone_frames {
            for t in 0..tag_count {
                match frame.tags.get(t) {
                    Some(tag) => tag.write(writer)?,
                    None => Md3Tag::default().write(writer)?,
                }
            }
        }
        for mesh in &self.meshes {
            mesh.write(writer)?;
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    /// Header matching the current contents, laid out in write order
    pub fn layout_header(&self) -> Md3Header {
        let frames = self.bone_frames.len();
        let tags = self.tag_count();
        let mesh_bytes: usize = self
            .meshes
            .iter()
            .map(|m| m.layout_header().mesh_size as usize)
            .sum();

        let mut offset = HEADER_SIZE;
        let mut place = |count: usize, size: usize| {
            if count == 0 {
                HEADER_SIZE as i32
            } else {
                let at = offset;
                offset += size;
                at as i32
            }
        };
        let bone_frame_offset = place(frames, BONE_FRAME_SIZE * frames);
        let tag_offset = place(frames * tags, TAG_SIZE * frames * tags);
        let mesh_offset = place(self.meshes.len(), mesh_bytes);

        Md3Header {
            bone_frame_count: frames as i32,
            tag_count: tags as i32,
            mesh_count: self.meshes.len() as i32,
            bone_frame_offset,
            tag_offset,
            mesh_offset,
            file_size: offset as i32,
            ..self.header.clone()
        }
    }

    pub fn frame_count(&self) -> usize {
        self.bone_frames.len()
    }

    /// Tags per frame
    pub fn tag_count(&self) -> usize {
        self.bone_frames.first().map_or(0, |f| f.tags.len())
    }

    /// More than one keyframe
    pub fn animated(&self) -> bool {
        self.bone_frames.len() > 1
    }

    /// Index of the first tag of the first frame named `name`
    pub fn tag_index_by_name(&self, name: &str) -> Option<usize> {
        self.bone_frames
            .first()?
            .tags
            .iter()
            .position(|t| t.name == name)
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.bone_frames
            .first()
            .map(|f| f.tags.iter().map(|t| t.name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn mesh_by_name(&self, name: &str) -> Option<&Md3Mesh> {
        self.meshes.iter().find(|m| m.name() == name)
    }

    pub fn vertex_total(&self) -> usize {
        self.meshes.iter().map(Md3Mesh::vertex_count).sum()
    }

    pub fn triangle_total(&self) -> usize {
        self.meshes.iter().map(Md3Mesh::triangle_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat3, Vec3};
    use crate::mesh::Md3MeshHeader;
    use crate::texture::Md3Texture;
    use pretty_assertions::assert_eq;

    fn sample() -> Md3Model {
        let frame = |z: f32| Md3BoneFrame {
            mins: Vec3::new(-1.0, -1.0, z),
            maxs: Vec3::new(1.0, 1.0, z + 2.0),
            scale: 2.0,
            creator: "test".to_string(),
            tags: vec![
                Md3Tag {
                    name: "tag_torso".to_string(),
                    position: Vec3::new(0.0, 0.0, z),
                    rotation: Mat3::IDENTITY,
                },
                Md3Tag {
                    name: "tag_weapon".to_string(),
                    position: Vec3::new(4.0, 0.0, z),
                    rotation: Mat3::IDENTITY,
                },
            ],
            ..Md3BoneFrame::default()
        };
        let mesh = Md3Mesh {
            header: Md3MeshHeader {
                name: "l_legs".to_string(),
                ..Md3MeshHeader::default()
            },
            textures: vec![Md3Texture::named("legs.tga")],
            triangles: vec![[0, 1, 2]],
            tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
            frames: vec![
                vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
                vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)],
            ],
            normals: vec![vec![[1, 2]; 3], vec![[3, 4]; 3]],
        };
        Md3Model {
            header: Md3Header {
                name: "lower.md3".to_string(),
                ..Md3Header::default()
            },
            bone_frames: vec![frame(0.0), frame(1.0)],
            meshes: vec![mesh],
            ..Md3Model::default()
        }
    }

    #[test]
    fn test_write_then_parse() {
        let model = sample();
        let bytes = model.to_bytes().unwrap();
        let header = model.layout_header();
        assert_eq!(bytes.len(), header.file_size as usize);
        assert_eq!(header.tag_offset, 108 + 2 * 56);
        assert_eq!(header.mesh_offset, 108 + 2 * 56 + 2 * 2 * 112);

        let parsed = Md3Model::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.bone_frames, model.bone_frames);
        assert_eq!(parsed.meshes[0].frames, model.meshes[0].frames);
        assert_eq!(parsed.header, header);
        assert!(parsed.animated());
    }

    #[test]
    fn test_tag_lookup() {
        let model = sample();
        assert_eq!(model.tag_index_by_name("tag_weapon"), Some(1));
        assert_eq!(model.tag_index_by_name("tag_head"), None);
        assert_eq!(model.tag_names(), vec!["tag_torso", "tag_weapon"]);
        assert_eq!(Md3Model::default().tag_index_by_name("tag_torso"), None);
    }

    #[test]
    fn test_misplaced_section() {
        let model = sample();
        let mut bytes = model.to_bytes().unwrap();
        // Shift the declared tag offset away from where the tags really are
        let tag_offset = model.layout_header().tag_offset + 4;
        bytes[96..100].copy_from_slice(&tag_offset.to_le_bytes());
        let err = Md3Model::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Md3Error::CorruptSectionLayout { offset } if offset == 220));
    }

    #[test]
    fn test_oversized_tag_block_is_rejected() {
        let header = Md3Header {
            bone_frame_count: i32::MAX,
            tag_count: i32::MAX,
            bone_frame_offset: 108,
            tag_offset: 108,
            mesh_offset: 108,
            file_size: 200,
            ..Md3Header::default()
        };
        let mut bytes = Vec::new();
        header.write(&mut bytes).unwrap();
        let err = Md3Model::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, Md3Error::BadHeader(_)));
    }

    #[test]
    fn test_truncated_file() {
        let bytes = sample().to_bytes().unwrap();
        let err = Md3Model::from_bytes(&bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, Md3Error::TruncatedInput));
    }

    #[test]
    fn test_totals() {
        let model = sample();
        assert_eq!(model.vertex_total(), 3);
        assert_eq!(model.triangle_total(), 1);
        assert!(model.mesh_by_name("l_legs").is_some());
    }
}
