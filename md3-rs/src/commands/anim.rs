//! animation.cfg command implementations

use anyhow::{Context, Result};
use clap::Subcommand;
use std::path::PathBuf;

use q3_md3::AnimationConfig;

#[derive(Subcommand)]
pub enum AnimCommands {
    /// List the clips of an animation.cfg
    Info {
        /// Path to the animation.cfg
        file: PathBuf,

        /// Also list the implicit "All Frames" clip
        #[arg(long)]
        all_frames: bool,

        /// Print the parsed configuration as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn execute(cmd: AnimCommands) -> Result<()> {
    match cmd {
        AnimCommands::Info {
            file,
            all_frames,
            json,
        } => handle_info(file, all_frames, json),
    }
}

fn handle_info(path: PathBuf, all_frames: bool, json: bool) -> Result<()> {
    let mut config = AnimationConfig::load(&path)
        .with_context(|| format!("Failed to load animation config from {}", path.display()))?;
    if all_frames {
        config = config.with_all_frames();
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("=== Animation Config: {} ===", path.display());
    println!("Sex: {}", config.sex);
    println!(
        "Head offset: {} {} {}",
        config.head_offset.x, config.head_offset.y, config.head_offset.z
    );
    println!("Footsteps: {}", config.footsteps);
    println!("\nClips ({}):", config.len());
    for (i, clip) in config.clips().iter().enumerate() {
        print!("  [{i:2}] {clip}");
        if clip.offset != 0 {
            print!(" (declared first frame {})", clip.declared_first_frame());
        }
        println!();
    }
    Ok(())
}
