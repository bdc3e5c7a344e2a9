// voldscan/src/cli.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::defs;

#[derive(Parser, Debug)]
#[command(name = "voldscan", version, about = "Removable storage volume discovery")]
pub struct Cli {
    /// Read the mount table from a file instead of /proc/mounts
    #[arg(long = "mounts")]
    pub mounts: Option<PathBuf>,
    /// Use this mount-configuration file instead of discovering one
    #[arg(long = "fstab")]
    pub fstab: Option<PathBuf>,
    /// Directory scanned for fstab.* configuration files
    #[arg(long = "search-root", default_value = defs::FSTAB_SEARCH_ROOT)]
    pub search_root: PathBuf,
    /// Root of the built-in external storage
    #[arg(long = "external-root", default_value = defs::DEFAULT_EXTERNAL_ROOT)]
    pub external_root: PathBuf,
    /// Parse /devices/platform config lines with the legacy field guard
    #[arg(long = "legacy-platform-guard")]
    pub legacy_platform_guard: bool,
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Output the resolved volume set in JSON format
    Volumes,
    /// Output only the primary volume path
    Primary,
    /// Output available external storage space in JSON format
    Space,
    /// Output marker-folder probes in JSON format
    Markers,
}
