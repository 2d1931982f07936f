//! Reading, writing and animating Quake 3 MD3 models.
//!
//! The crate covers the binary `.md3` format, the `animation.cfg` clip
//! tables and `.skin` texture assignments that ship next to player models,
//! and a small scene graph that stacks models on each other's tags and
//! steps them through a clip.
//!
//! ```no_run
//! use q3_md3::{Md3Model, PoseEvaluator, SceneGraph};
//!
//! # fn main() -> q3_md3::Result<()> {
//! let mut scene = SceneGraph::new();
//! let lower = scene.insert(Md3Model::load("lower.md3")?);
//! let upper = scene.insert(Md3Model::load("upper.md3")?);
//!
//! let tag = scene.get(lower)?.model.tag_index_by_name("tag_torso").unwrap_or(0);
//! scene.attach(lower, tag, upper)?;
//!
//! for placed in PoseEvaluator::pose_scene(&scene, lower)? {
//!     println!("{}: {} meshes", placed.node, placed.pose.meshes.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod animation;
pub mod error;
pub mod frame;
pub mod header;
pub mod io_ext;
pub mod math;
pub mod mesh;
pub mod model;
pub mod pose;
pub mod scene;
pub mod skin;
pub mod tag;
pub mod texture;

// Re-export common types
pub use animation::{AnimationClip, AnimationClock, AnimationConfig, AnimationCursor, ClockOp};
pub use error::{Md3Error, Result};
pub use frame::Md3BoneFrame;
pub use header::Md3Header;
pub use math::{Mat3, Mat4, Quat, Vec3};
pub use mesh::{Md3Mesh, Md3MeshHeader};
pub use model::Md3Model;
pub use pose::{Pose, PoseEvaluator};
pub use scene::{NodeId, SceneGraph, SceneNode, SceneSummary};
pub use skin::Skin;
pub use tag::Md3Tag;
pub use texture::{DecodedImage, Md3Texture, TextureCache, TextureHandle};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
