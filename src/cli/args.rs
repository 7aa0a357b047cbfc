//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Turn a text prompt and a reference image into a short Veo video scene
#[derive(Parser, Debug)]
#[command(name = "veo-scene")]
#[command(version, about = "Generate a video scene from a prompt and a reference image", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Generate with the image from the config file
    veo-scene generate \"A tiger runs through the jungle\"

    # Explicit reference image and output page
    veo-scene generate \"A tiger runs through the jungle\" -i ruthvika.jpg -o tiger.html

    # Give up after 15 minutes
    veo-scene generate \"A tiger runs through the jungle\" --timeout 900")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a video scene and write a player page
    Generate(GenerateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(ClapArgs, Debug, Default)]
pub struct GenerateArgs {
    /// Scene prompt (default: [scene] prompt from the config file)
    pub prompt: Option<String>,

    /// Reference image the scene is based on
    #[arg(long, short)]
    pub image: Option<PathBuf>,

    /// MIME type of the reference image (default: guessed from extension)
    #[arg(long)]
    pub mime_type: Option<String>,

    /// Scene title shown on the player page
    #[arg(long, short)]
    pub title: Option<String>,

    /// Where to write the player page
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Seconds between status checks
    #[arg(long)]
    pub interval: Option<u64>,

    /// Give up after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Give up after this many status checks
    #[arg(long)]
    pub max_attempts: Option<u32>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
