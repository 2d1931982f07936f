//! .skin command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use q3_md3::Skin;

#[derive(Subcommand)]
pub enum SkinCommands {
    /// List the entries of a .skin file
    Info {
        /// Path to the .skin file
        file: PathBuf,

        /// Resolve the texture for these mesh names
        #[arg(short, long)]
        mesh: Vec<String>,
    },
}

pub fn execute(cmd: SkinCommands) -> Result<()> {
    match cmd {
        SkinCommands::Info { file, mesh } => handle_info(file, &mesh),
    }
}

fn handle_info(path: PathBuf, meshes: &[String]) -> Result<()> {
    let skin = Skin::load(&path)
        .with_context(|| format!("Failed to load skin from {}", path.display()))?;

    println!("=== Skin: {} ===", path.display());
    println!("Entries: {}", skin.len());
    for (prefix, texture) in skin.entries() {
        println!("  {prefix} -> {}", texture.name);
    }

    if !meshes.is_empty() {
        println!("\nLookups:");
        for mesh in meshes {
            match skin.texture(mesh) {
                Some(texture) => println!("  {mesh} -> {}", texture.name),
                None => println!("  {mesh} -> (no match)"),
            }
        }
    }
    Ok(())
}
