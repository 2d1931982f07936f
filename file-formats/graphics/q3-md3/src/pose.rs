//! Posed geometry for the current playback position of a node.
//!
//! Between two keyframes positions, bounds and normal angles are blended
//! linearly. Tag orientations go through quaternions and are blended with
//! slerp, then turned back into matrices.

use std::f32::consts::TAU;

use crate::animation::cursor::AnimationCursor;
use crate::error::{Md3Error, Result};
use crate::frame::Md3BoneFrame;
use crate::math::{Lerp, Mat4, Quat, Vec3};
use crate::mesh::Md3Mesh;
use crate::model::Md3Model;
use crate::scene::{NodeId, SceneGraph, SceneNode};
use crate::tag::Md3Tag;

#[cfg(feature = "serde-support")]
use serde::Serialize;

/// Direction of a stored normal from its (inclination, azimuth) angles in
/// 2π/255 units
pub fn decode_normal(angles: [u8; 2]) -> Vec3 {
    let alpha = f32::from(angles[0]) * TAU / 255.0;
    let beta = f32::from(angles[1]) * TAU / 255.0;
    Vec3::new(beta.cos() * alpha.sin(), beta.sin() * alpha.sin(), alpha.cos())
}

/// Bounding box and origin of a pose
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize))]
pub struct BoundsPose {
    pub mins: Vec3,
    pub maxs: Vec3,
    pub position: Vec3,
}

/// Transform of one tag
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize))]
pub struct TagPose<'a> {
    pub name: &'a str,
    /// Column-major, translation in the last column
    pub transform: Mat4,
}

/// Vertices of one mesh
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize))]
pub struct MeshPose<'a> {
    pub name: &'a str,
    pub triangles: &'a [[i32; 3]],
    pub tex_coords: &'a [[f32; 2]],
    pub positions: Vec<Vec3>,
    /// Blended spherical angles, see [`decode_normal`]
    pub normal_angles: Vec<[u8; 2]>,
}

impl MeshPose<'_> {
    pub fn normals(&self) -> Vec<Vec3> {
        self.normal_angles.iter().copied().map(decode_normal).collect()
    }

    /// Unit normal of every triangle; zero for degenerate triangles or
    /// triangles with indices outside the mesh
    pub fn face_normals(&self) -> Vec<Vec3> {
        self.triangles
            .iter()
            .map(|tri| {
                let vertex = |i: i32| usize::try_from(i).ok().and_then(|i| self.positions.get(i));
                match (vertex(tri[0]), vertex(tri[1]), vertex(tri[2])) {
                    (Some(a), Some(b), Some(c)) => b.sub(a).cross(&c.sub(a)).normalize(),
                    _ => Vec3::ZERO,
                }
            })
            .collect()
    }
}

/// Geometry of a model at one playback position
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize))]
pub struct Pose<'a> {
    pub bounds: BoundsPose,
    pub meshes: Vec<MeshPose<'a>>,
    pub tags: Vec<TagPose<'a>>,
}

impl Pose<'_> {
    /// Transform of tag `index`
    pub fn tag_transform(&self, index: usize) -> Option<Mat4> {
        self.tags.get(index).map(|t| t.transform)
    }
}

/// A posed node placed in world space
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(Serialize))]
pub struct PlacedPose<'a> {
    pub node: NodeId,
    /// Product of the tag transforms from the root down to this node
    pub world: Mat4,
    pub pose: Pose<'a>,
}

/// Computes poses from models and cursors
pub struct PoseEvaluator;

fn frame_index(frame: i32, count: usize) -> Result<usize> {
    usize::try_from(frame)
        .ok()
        .filter(|&f| f < count)
        .ok_or(Md3Error::FrameOutOfRange {
            frame: frame.max(0) as usize,
            count,
        })
}

impl PoseEvaluator {
    /// Pose of a scene node at its cursor
    pub fn pose(node: &SceneNode) -> Result<Pose<'_>> {
        Self::pose_model(&node.model, &node.cursor)
    }

    /// Pose of `model` at `cursor`
    pub fn pose_model<'a>(model: &'a Md3Model, cursor: &AnimationCursor) -> Result<Pose<'a>> {
        let count = model.frame_count();
        let current = frame_index(cursor.current, count)?;
        // The next frame only matters while blending toward it
        let blend = if cursor.is_blending() {
            Some((frame_index(cursor.next, count)?, cursor.fraction))
        } else {
            None
        };

        let a = &model.bone_frames[current];
        let b = blend.map(|(next, _)| &model.bone_frames[next]);
        let t = cursor.fraction;

        let bounds = match b {
            Some(b) => BoundsPose {
                mins: a.mins.lerp(&b.mins, t),
                maxs: a.maxs.lerp(&b.maxs, t),
                position: a.position.lerp(&b.position, t),
            },
            None => BoundsPose {
                mins: a.mins,
                maxs: a.maxs,
                position: a.position,
            },
        };

        let meshes = model
            .meshes
            .iter()
            .map(|mesh| Self::pose_mesh(mesh, current, blend))
            .collect::<Result<Vec<_>>>()?;

        Ok(Pose {
            bounds,
            meshes,
            tags: Self::pose_tags(a, b, t),
        })
    }

    fn pose_mesh(mesh: &Md3Mesh, current: usize, blend: Option<(usize, f32)>) -> Result<MeshPose<'_>> {
        let frames = mesh.frames.len();
        let positions_a = mesh.frames.get(current).ok_or(Md3Error::FrameOutOfRange {
            frame: current,
            count: frames,
        })?;
        let normals_a = mesh.normals.get(current).map_or(&[][..], Vec::as_slice);

        let (positions, normal_angles) = match blend {
            None => (positions_a.clone(), normals_a.to_vec()),
            Some((next, t)) => {
                let positions_b = mesh.frames.get(next).ok_or(Md3Error::FrameOutOfRange {
                    frame: next,
                    count: frames,
                })?;
                let normals_b = mesh.normals.get(next).map_or(&[][..], Vec::as_slice);

                let positions = positions_a
                    .iter()
                    .zip(positions_b)
                    .map(|(p, q)| p.lerp(q, t))
                    .collect();
                // Blended as angles, truncated back to bytes
                let normals = normals_a
                    .iter()
                    .zip(normals_b)
                    .map(|(n, m)| {
                        [
                            f32::from(n[0]).lerp(&f32::from(m[0]), t) as u8,
                            f32::from(n[1]).lerp(&f32::from(m[1]), t) as u8,
                        ]
                    })
                    .collect();
                (positions, normals)
            }
        };

        Ok(MeshPose {
            name: mesh.name(),
            triangles: &mesh.triangles,
            tex_coords: &mesh.tex_coords,
            positions,
            normal_angles,
        })
    }

    fn pose_tags<'a>(a: &'a Md3BoneFrame, b: Option<&Md3BoneFrame>, t: f32) -> Vec<TagPose<'a>> {
        a.tags
            .iter()
            .enumerate()
            .map(|(i, tag)| {
                let transform = match b.and_then(|b| b.tags.get(i)) {
                    Some(other) => blend_tags(tag, other, t),
                    None => tag.transform(),
                };
                TagPose {
                    name: &tag.name,
                    transform,
                }
            })
            .collect()
    }

    /// Pose every node below `root` and place it in world space.
    ///
    /// The root sits at the identity; a child's world transform is its
    /// parent's world transform times the parent's tag transform.
    pub fn pose_scene(graph: &SceneGraph, root: NodeId) -> Result<Vec<PlacedPose<'_>>> {
        let mut placed: Vec<PlacedPose<'_>> = Vec::new();
        for id in graph.subtree(root)? {
            let node = graph.get(id)?;
            let world = match (node.parent(), node.parent_tag()) {
                (Some(parent), Some(tag)) if id != root => {
                    let parent_pose = placed
                        .iter()
                        .find(|p| p.node == parent)
                        .ok_or(Md3Error::UnknownNode(parent.0))?;
                    let tag_transform = parent_pose.pose.tag_transform(tag).ok_or(
                        Md3Error::TagIndexOutOfRange {
                            index: tag,
                            count: parent_pose.pose.tags.len(),
                        },
                    )?;
                    parent_pose.world * tag_transform
                }
                _ => Mat4::IDENTITY,
            };
            placed.push(PlacedPose {
                node: id,
                world,
                pose: Self::pose(node)?,
            });
        }
        Ok(placed)
    }
}

/// Interpolated transform between two keyframes of one tag
pub fn blend_tags(a: &Md3Tag, b: &Md3Tag, t: f32) -> Mat4 {
    let from = Quat::from_matrix(&a.rotation);
    let to = Quat::from_matrix(&b.rotation);
    let rotation = from.slerp(&to, t).to_matrix();
    Mat4::from_rotation_translation(&rotation, a.position.lerp(&b.position, t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Mat3;
    use crate::mesh::Md3MeshHeader;

    fn rot_z(angle: f32) -> Mat3 {
        Mat3::from_glam(glam::Mat3::from_rotation_z(angle))
    }

    fn model() -> Md3Model {
        let frame = |z: f32, angle: f32| Md3BoneFrame {
            mins: Vec3::new(-z, -z, -z),
            maxs: Vec3::new(z, z, z),
            position: Vec3::new(0.0, 0.0, z),
            tags: vec![Md3Tag {
                name: "tag_torso".to_string(),
                position: Vec3::new(0.0, 0.0, z),
                rotation: rot_z(angle),
            }],
            ..Md3BoneFrame::default()
        };
        let mesh = Md3Mesh {
            header: Md3MeshHeader {
                name: "l_legs".to_string(),
                ..Md3MeshHeader::default()
            },
            triangles: vec![[0, 1, 2], [0, 1, 7]],
            tex_coords: vec![[0.0; 2]; 3],
            frames: vec![
                vec![Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
                vec![Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0)],
            ],
            normals: vec![vec![[0, 10]; 3], vec![[100, 21]; 3]],
            ..Md3Mesh::default()
        };
        Md3Model {
            bone_frames: vec![frame(1.0, 0.0), frame(2.0, 1.0)],
            meshes: vec![mesh],
            ..Md3Model::default()
        }
    }

    #[test]
    fn test_decode_normal() {
        let up = decode_normal([0, 0]);
        assert!((up.z - 1.0).abs() < 1e-6);
        let side = decode_normal([64, 0]);
        assert!((side.x - 1.0).abs() < 1e-3);
        assert!((decode_normal([37, 200]).length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_unblended_pose_uses_current_frame() {
        let model = model();
        let cursor = AnimationCursor {
            current: 1,
            next: 1,
            fraction: 0.5,
        };
        let pose = PoseEvaluator::pose_model(&model, &cursor).unwrap();
        assert_eq!(pose.bounds.maxs, Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(pose.meshes[0].positions, model.meshes[0].frames[1]);
        assert_eq!(pose.tags[0].transform, model.bone_frames[1].tags[0].transform());
    }

    #[test]
    fn test_blended_pose() {
        let model = model();
        let cursor = AnimationCursor {
            current: 0,
            next: 1,
            fraction: 0.5,
        };
        let pose = PoseEvaluator::pose_model(&model, &cursor).unwrap();
        assert_eq!(pose.bounds.mins, Vec3::new(-1.5, -1.5, -1.5));
        assert_eq!(pose.meshes[0].positions[1], Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(pose.meshes[0].normal_angles[0], [50, 15]);

        let expected = rot_z(0.5);
        let m = pose.tags[0].transform;
        assert!((m.get(0, 1) - expected.m[0][1]).abs() < 1e-5);
        assert!((m.get(1, 0) - expected.m[1][0]).abs() < 1e-5);
        assert!((m.translation().z - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_face_normals() {
        let model = model();
        let pose = PoseEvaluator::pose_model(&model, &AnimationCursor::initial(2)).unwrap();
        let normals = pose.meshes[0].face_normals();
        assert_eq!(normals[0], Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(normals[1], Vec3::ZERO);
    }

    #[test]
    fn test_next_frame_ignored_without_blend() {
        let model = model();
        let cursor = AnimationCursor {
            current: 1,
            next: 8,
            fraction: 0.0,
        };
        let pose = PoseEvaluator::pose_model(&model, &cursor).unwrap();
        assert_eq!(pose.meshes[0].positions, model.meshes[0].frames[1]);
        assert_eq!(pose.tags[0].transform, model.bone_frames[1].tags[0].transform());

        let blending = AnimationCursor {
            fraction: 0.5,
            ..cursor
        };
        let err = PoseEvaluator::pose_model(&model, &blending).unwrap_err();
        assert!(matches!(err, Md3Error::FrameOutOfRange { frame: 8, count: 2 }));
    }

    #[test]
    fn test_out_of_range_cursor() {
        let model = model();
        let cursor = AnimationCursor {
            current: 5,
            next: 0,
            fraction: 0.0,
        };
        let err = PoseEvaluator::pose_model(&model, &cursor).unwrap_err();
        assert!(matches!(err, Md3Error::FrameOutOfRange { frame: 5, count: 2 }));
    }

    #[test]
    fn test_pose_scene_composes_tag_transforms() {
        let mut graph = SceneGraph::new();
        let lower = graph.insert(model());
        let upper = graph.insert(model());
        graph.attach(lower, 0, upper).unwrap();

        let placed = PoseEvaluator::pose_scene(&graph, lower).unwrap();
        assert_eq!(placed.len(), 2);
        assert_eq!(placed[0].world, Mat4::IDENTITY);
        assert_eq!(placed[1].node, upper);
        assert_eq!(placed[1].world.translation(), Vec3::new(0.0, 0.0, 1.0));
    }
}
