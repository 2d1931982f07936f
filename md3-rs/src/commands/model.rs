//! MD3 model command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::{Path, PathBuf};

use q3_md3::header::HEADER_SIZE;
use q3_md3::Md3Model;

use crate::utils::{NodeType, TreeNode, TreeOptions, render_tree};

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Display information about an MD3 model
    Info {
        /// Path to the MD3 file
        file: PathBuf,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display MD3 file structure as a tree
    Tree {
        /// Path to the MD3 file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long, default_value = "5")]
        depth: usize,

        /// Include size information
        #[arg(short, long)]
        size: bool,

        /// Show metadata inline
        #[arg(long)]
        compact: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Decode a model and write it back in canonical section order
    Rewrite {
        /// Input MD3 file
        input: PathBuf,

        /// Output MD3 file
        output: PathBuf,
    },
}

pub fn execute(cmd: ModelCommands) -> Result<()> {
    match cmd {
        ModelCommands::Info { file, detailed } => handle_info(file, detailed),
        ModelCommands::Tree {
            file,
            depth,
            size,
            compact,
            no_color,
        } => handle_tree(file, depth, size, compact, no_color),
        ModelCommands::Rewrite { input, output } => handle_rewrite(input, output),
    }
}

fn load(path: &Path) -> Result<Md3Model> {
    Md3Model::load(path).with_context(|| format!("Failed to load MD3 model from {}", path.display()))
}

fn handle_info(path: PathBuf, detailed: bool) -> Result<()> {
    println!("Loading MD3 model: {}", path.display());
    let model = load(&path)?;
    let header = &model.header;

    println!("\n=== MD3 Model Information ===");
    println!("Name: {}", if header.name.is_empty() { "(none)" } else { &header.name });
    println!("Version: {}", header.version);
    println!("File size: {} bytes", header.file_size);
    println!("Bone frames: {}", model.frame_count());
    println!("Tags per frame: {}", model.tag_count());
    println!("Meshes: {}", model.meshes.len());
    println!("Vertices: {}", model.vertex_total());
    println!("Triangles: {}", model.triangle_total());

    if model.tag_count() > 0 {
        println!("\nTags:");
        for (i, name) in model.tag_names().iter().enumerate() {
            println!("  [{i}] {name}");
        }
    }

    if !model.meshes.is_empty() {
        println!("\nMeshes:");
        for mesh in &model.meshes {
            println!(
                "  {} - {} vertices, {} triangles, {} frames",
                mesh.name(),
                mesh.vertex_count(),
                mesh.triangle_count(),
                mesh.frame_count()
            );
            for texture in &mesh.textures {
                println!("      texture: {}", texture.name);
            }
        }
    }

    if detailed {
        println!("\n=== Detailed Information ===");
        println!("{:#?}", &model);
    }

    Ok(())
}

/// Structure of a decoded model: header, frames, tags and meshes
pub fn model_tree(name: &str, model: &Md3Model, show_size: bool) -> TreeNode {
    let header = &model.header;
    let mut header_node = TreeNode::new("Header", NodeType::Header)
        .with_metadata("version", header.version)
        .with_metadata("frames", header.bone_frame_count)
        .with_metadata("tags", header.tag_count)
        .with_metadata("meshes", header.mesh_count);
    if show_size {
        header_node = header_node.with_size(HEADER_SIZE as u64);
    }

    let mut frames = TreeNode::new(format!("Bone frames ({})", model.frame_count()), NodeType::Section)
        .with_metadata("offset", header.bone_frame_offset);
    for (i, frame) in model.bone_frames.iter().enumerate() {
        frames = frames.add_child(
            TreeNode::new(format!("Frame {i}"), NodeType::Frame)
                .with_metadata("creator", &frame.creator)
                .with_metadata("radius", frame.scale),
        );
    }

    let mut tags = TreeNode::new(format!("Tags ({})", model.tag_count()), NodeType::Section)
        .with_metadata("offset", header.tag_offset);
    for name in model.tag_names() {
        tags = tags.add_child(TreeNode::new(name, NodeType::Tag));
    }

    let mut meshes = TreeNode::new(format!("Meshes ({})", model.meshes.len()), NodeType::Section)
        .with_metadata("offset", header.mesh_offset);
    for mesh in &model.meshes {
        let layout = mesh.layout_header();
        let mut node = TreeNode::new(mesh.name(), NodeType::Mesh)
            .with_metadata("vertices", mesh.vertex_count())
            .with_metadata("triangles", mesh.triangle_count());
        if show_size {
            node = node.with_size(layout.mesh_size as u64);
        }
        for texture in &mesh.textures {
            node = node.with_texture(&texture.name);
        }
        meshes = meshes.add_child(node);
    }

    let mut root = TreeNode::new(name, NodeType::Root)
        .add_child(header_node)
        .add_child(frames)
        .add_child(tags)
        .add_child(meshes);
    if show_size {
        root = root.with_size(header.file_size as u64);
    }
    root
}

fn handle_tree(path: PathBuf, max_depth: usize, show_size: bool, compact: bool, no_color: bool) -> Result<()> {
    let model = load(&path)?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let options = TreeOptions {
        max_depth: Some(max_depth),
        no_color,
        compact,
        ..TreeOptions::default()
    };
    print!("{}", render_tree(&model_tree(&name, &model, show_size), &options));
    Ok(())
}

fn handle_rewrite(input: PathBuf, output: PathBuf) -> Result<()> {
    let model = load(&input)?;
    model
        .save(&output)
        .with_context(|| format!("Failed to write MD3 model to {}", output.display()))?;

    let written = model.layout_header().file_size;
    println!(
        "Wrote {} ({} bytes, was {})",
        output.display(),
        written,
        model.header.file_size
    );
    Ok(())
}
