//! Byte-level fixtures shared by the integration tests

#![allow(dead_code)]

use byteorder::{LittleEndian, WriteBytesExt};
use q3_md3::math::{Mat3, Vec3};
use q3_md3::mesh::{Md3Mesh, Md3MeshHeader};
use q3_md3::texture::Md3Texture;
use q3_md3::{Md3BoneFrame, Md3Model, Md3Tag};

pub const SARGE_CFG: &str = "\
// animation config file

sex m
headoffset 0 0 0
footsteps boot

0\t30\t0\t25\t\t// BOTH_DEATH1
29\t1\t0\t25\t\t// BOTH_DEAD1
30\t30\t0\t25\t\t// BOTH_DEATH2
59\t1\t0\t25\t\t// BOTH_DEAD2
60\t30\t0\t25\t\t// BOTH_DEATH3
89\t1\t0\t25\t\t// BOTH_DEAD3

90\t40\t0\t20\t\t// TORSO_GESTURE
130\t6\t0\t15\t\t// TORSO_ATTACK
136\t6\t0\t15\t\t// TORSO_ATTACK2
142\t5\t0\t20\t\t// TORSO_DROP
147\t4\t0\t20\t\t// TORSO_RAISE
151\t1\t0\t15\t\t// TORSO_STAND
152\t1\t0\t15\t\t// TORSO_STAND2

153\t8\t8\t20\t\t// LEGS_WALKCR
161\t12\t12\t20\t\t// LEGS_WALK
173\t9\t9\t18\t\t// LEGS_RUN
182\t10\t10\t20\t\t// LEGS_BACK
192\t10\t10\t15\t\t// LEGS_SWIM
202\t8\t0\t15\t\t// LEGS_JUMP
210\t1\t0\t15\t\t// LEGS_LAND
211\t8\t0\t15\t\t// LEGS_JUMPB
219\t1\t0\t15\t\t// LEGS_LANDB
220\t10\t10\t15\t\t// LEGS_IDLE
230\t10\t10\t15\t\t// LEGS_IDLECR
240\t7\t7\t15\t\t// LEGS_TURN
";

/// Little-endian writer for hand-laid files
#[derive(Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn i32(mut self, v: i32) -> Self {
        self.0.write_i32::<LittleEndian>(v).unwrap();
        self
    }

    pub fn f32(mut self, v: f32) -> Self {
        self.0.write_f32::<LittleEndian>(v).unwrap();
        self
    }

    pub fn vec3(self, v: [f32; 3]) -> Self {
        self.f32(v[0]).f32(v[1]).f32(v[2])
    }

    pub fn name(mut self, s: &str, len: usize) -> Self {
        let mut field = s.as_bytes().to_vec();
        field.resize(len, 0);
        self.0.extend_from_slice(&field);
        self
    }

    pub fn append(mut self, other: &[u8]) -> Self {
        self.0.extend_from_slice(other);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Offsets and counts of a model header
pub struct Layout {
    pub frames: i32,
    pub tags: i32,
    pub meshes: i32,
    pub frame_offset: i32,
    pub tag_offset: i32,
    pub mesh_offset: i32,
    pub file_size: i32,
}

pub fn header(layout: &Layout) -> Bytes {
    Bytes::default()
        .name("IDP3", 4)
        .i32(15)
        .name("", 68)
        .i32(layout.frames)
        .i32(layout.tags)
        .i32(layout.meshes)
        .i32(0)
        .i32(layout.frame_offset)
        .i32(layout.tag_offset)
        .i32(layout.mesh_offset)
        .i32(layout.file_size)
}

pub fn bone_frame(creator: &str, radius: f32) -> Bytes {
    Bytes::default()
        .vec3([-radius; 3])
        .vec3([radius; 3])
        .vec3([0.0, 0.0, 0.0])
        .f32(radius)
        .name(creator, 16)
}

pub fn tag(name: &str, origin: [f32; 3]) -> Bytes {
    Bytes::default()
        .name(name, 64)
        .vec3(origin)
        .vec3([1.0, 0.0, 0.0])
        .vec3([0.0, 1.0, 0.0])
        .vec3([0.0, 0.0, 1.0])
}

/// Header followed by one 56 byte bone frame, nothing else
pub fn single_frame_model() -> Vec<u8> {
    header(&Layout {
        frames: 1,
        tags: 0,
        meshes: 0,
        frame_offset: 108,
        tag_offset: 108,
        mesh_offset: 108,
        file_size: 164,
    })
    .append(&bone_frame("x", 1.0).0)
    .0
}

/// Two frames with one tag each, in the usual frames-then-tags order
pub fn frames_then_tags() -> Vec<u8> {
    header(&Layout {
        frames: 2,
        tags: 1,
        meshes: 0,
        frame_offset: 108,
        tag_offset: 220,
        mesh_offset: 444,
        file_size: 444,
    })
    .append(&bone_frame("a", 1.0).0)
    .append(&bone_frame("b", 2.0).0)
    .append(&tag("tag_torso", [0.0, 0.0, 1.0]).0)
    .append(&tag("tag_torso", [0.0, 0.0, 2.0]).0)
    .0
}

/// Same content as [`frames_then_tags`] with the tags stored first
pub fn tags_then_frames() -> Vec<u8> {
    header(&Layout {
        frames: 2,
        tags: 1,
        meshes: 0,
        frame_offset: 332,
        tag_offset: 108,
        mesh_offset: 444,
        file_size: 444,
    })
    .append(&tag("tag_torso", [0.0, 0.0, 1.0]).0)
    .append(&tag("tag_torso", [0.0, 0.0, 2.0]).0)
    .append(&bone_frame("a", 1.0).0)
    .append(&bone_frame("b", 2.0).0)
    .0
}

fn frame(radius: f32, tags: &[(&str, f32)]) -> Md3BoneFrame {
    Md3BoneFrame {
        mins: Vec3::new(-radius, -radius, -radius),
        maxs: Vec3::new(radius, radius, radius),
        scale: radius,
        creator: "fixture".to_string(),
        tags: tags
            .iter()
            .map(|&(name, z)| Md3Tag {
                name: name.to_string(),
                position: Vec3::new(0.0, 0.0, z),
                rotation: Mat3::IDENTITY,
            })
            .collect(),
        ..Md3BoneFrame::default()
    }
}

fn triangle_mesh(name: &str, texture: &str, frames: usize) -> Md3Mesh {
    Md3Mesh {
        header: Md3MeshHeader {
            name: name.to_string(),
            ..Md3MeshHeader::default()
        },
        textures: vec![Md3Texture::named(texture)],
        triangles: vec![[0, 1, 2]],
        tex_coords: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        frames: (0..frames)
            .map(|f| {
                let s = (f + 1) as f32;
                vec![Vec3::ZERO, Vec3::new(s, 0.0, 0.0), Vec3::new(0.0, s, 0.0)]
            })
            .collect(),
        normals: vec![vec![[0, 0]; 3]; frames],
    }
}

/// A small player part: `frames` frames, one mesh, tags at increasing heights
pub fn player_part(load_name: &str, mesh: &str, frames: usize, tags: &[&str]) -> Md3Model {
    Md3Model {
        bone_frames: (0..frames)
            .map(|f| {
                let tags: Vec<(&str, f32)> = tags
                    .iter()
                    .map(|&t| (t, 10.0 + f as f32))
                    .collect();
                frame(1.0 + f as f32, &tags)
            })
            .collect(),
        meshes: vec![triangle_mesh(mesh, &format!("models/{mesh}.tga"), frames)],
        ..Md3Model::default()
    }
    .with_load_name(load_name)
}
