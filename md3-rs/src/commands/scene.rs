//! Player scene command implementations
//!
//! A player is a lower body with the upper body on its `tag_torso` and the
//! head on the upper body's `tag_head`.

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use q3_md3::animation::{AnimationClip, AnimationClock, AnimationConfig, ClockOp};
use q3_md3::{Md3Model, NodeId, PoseEvaluator, SceneGraph, Skin};

use crate::commands::model::model_tree;
use crate::utils::{NodeType, TreeNode, TreeOptions, render_tree};

/// Models that make up a player
#[derive(Args)]
pub struct PlayerArgs {
    /// Lower body model, the scene root
    lower: PathBuf,

    /// Upper body model, attached at the lower body's tag_torso
    #[arg(long)]
    upper: Option<PathBuf>,

    /// Head model, attached at the upper body's tag_head
    #[arg(long)]
    head: Option<PathBuf>,

    /// .skin files applied to the whole player
    #[arg(long)]
    skin: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum SceneCommands {
    /// Counts and mesh names of every model in the player
    Summary {
        #[command(flatten)]
        player: PlayerArgs,
    },

    /// Display the attached models as a tree
    Tree {
        #[command(flatten)]
        player: PlayerArgs,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Step a clip and print the resulting frames or poses
    Play {
        #[command(flatten)]
        player: PlayerArgs,

        /// animation.cfg providing the clip; without it "All Frames" is played
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Clip name
        #[arg(long, default_value = q3_md3::animation::ALL_FRAMES)]
        clip: String,

        /// Number of ticks to advance after the rewind
        #[arg(short, long, default_value = "1")]
        ticks: u32,

        /// Step backwards instead of forwards
        #[arg(long)]
        reverse: bool,

        /// Blend between keyframes
        #[arg(short, long)]
        interpolate: bool,

        /// Print the posed geometry of every model as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: SceneCommands) -> Result<()> {
    match cmd {
        SceneCommands::Summary { player } => handle_summary(&player),
        SceneCommands::Tree { player, no_color } => handle_tree(&player, no_color),
        SceneCommands::Play {
            player,
            config,
            clip,
            ticks,
            reverse,
            interpolate,
            json,
        } => handle_play(&player, config.as_deref(), &clip, ticks, reverse, interpolate, json),
    }
}

fn load_model(path: &Path) -> Result<Md3Model> {
    Md3Model::load(path).with_context(|| format!("Failed to load MD3 model from {}", path.display()))
}

fn attach_at(scene: &mut SceneGraph, parent: NodeId, tag: &str, path: &Path) -> Result<NodeId> {
    let parent_model = &scene.get(parent)?.model;
    let index = parent_model
        .tag_index_by_name(tag)
        .ok_or_else(|| anyhow!("{} has no {tag}", parent_model.load_name))?;
    let child = scene.insert(load_model(path)?);
    scene.attach(parent, index, child)?;
    info!("Attached {} at {tag}", path.display());
    Ok(child)
}

/// Load and assemble the player, returning the scene and its root
fn build_player(args: &PlayerArgs) -> Result<(SceneGraph, NodeId)> {
    let mut scene = SceneGraph::new();
    let lower = scene.insert(load_model(&args.lower)?);

    let upper = args
        .upper
        .as_deref()
        .map(|path| attach_at(&mut scene, lower, "tag_torso", path))
        .transpose()?;

    if let Some(head) = args.head.as_deref() {
        match upper {
            Some(upper) => {
                attach_at(&mut scene, upper, "tag_head", head)?;
            }
            None => warn!("Ignoring head model {} without an upper body", head.display()),
        }
    }

    for path in &args.skin {
        let skin = Skin::load(path).with_context(|| format!("Failed to load skin from {}", path.display()))?;
        let changed = scene.apply_skin(lower, &skin)?;
        info!("Skin {} changed {changed} meshes", path.display());
    }

    Ok((scene, lower))
}

fn handle_summary(args: &PlayerArgs) -> Result<()> {
    let (scene, root) = build_player(args)?;
    println!("{}", scene.summary(root)?);
    Ok(())
}

fn scene_tree(scene: &SceneGraph, id: NodeId) -> Result<TreeNode> {
    let node = scene.get(id)?;
    let mut tree = model_tree(&node.model.load_name, &node.model, false);
    tree.node_type = NodeType::Model;

    let tag_names = node.model.tag_names();
    for (tag, child) in node.children() {
        let name = tag_names.get(tag).copied().unwrap_or("?");
        let attached = TreeNode::new(format!("at {name}"), NodeType::Tag).add_child(scene_tree(scene, child)?);
        tree = tree.add_child(attached);
    }
    Ok(tree)
}

fn handle_tree(args: &PlayerArgs, no_color: bool) -> Result<()> {
    let (scene, root) = build_player(args)?;
    let options = TreeOptions {
        no_color,
        ..TreeOptions::default()
    };
    print!("{}", render_tree(&scene_tree(&scene, root)?, &options));
    Ok(())
}

fn select_clip(config: Option<&Path>, name: &str) -> Result<AnimationClip> {
    let Some(path) = config else {
        if name != q3_md3::animation::ALL_FRAMES {
            warn!("No animation config given, playing \"All Frames\" instead of \"{name}\"");
        }
        return Ok(AnimationClip::all_frames());
    };

    let config = AnimationConfig::load(path)
        .with_context(|| format!("Failed to load animation config from {}", path.display()))?
        .with_all_frames();
    config
        .get(name)
        .cloned()
        .ok_or_else(|| anyhow!("No clip named \"{name}\" in {}", path.display()))
}

fn handle_play(
    args: &PlayerArgs,
    config: Option<&Path>,
    clip: &str,
    ticks: u32,
    reverse: bool,
    interpolate: bool,
    json: bool,
) -> Result<()> {
    let (mut scene, root) = build_player(args)?;
    let clip = select_clip(config, clip)?;
    let clock = AnimationClock::new(clip).with_interpolation(interpolate);
    let op = if reverse { ClockOp::Previous } else { ClockOp::Next };

    clock.apply(&mut scene, root, ClockOp::Rewind)?;
    for _ in 0..ticks {
        clock.apply(&mut scene, root, op)?;
    }

    let placed = PoseEvaluator::pose_scene(&scene, root)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&placed)?);
        return Ok(());
    }

    println!(
        "Clip: {} ({} ticks/s, {} ticks {})",
        clock.clip(),
        clock.tick_rate(),
        ticks,
        if reverse { "backwards" } else { "forwards" }
    );
    for pose in &placed {
        let node = scene.get(pose.node)?;
        let cursor = node.cursor;
        let origin = pose.world.translation();
        println!(
            "  {} {}: frame {} -> {} ({:.2}), origin ({:.3}, {:.3}, {:.3})",
            pose.node,
            node.model.load_name,
            cursor.current,
            cursor.next,
            cursor.fraction,
            origin.x,
            origin.y,
            origin.z
        );
    }
    Ok(())
}
