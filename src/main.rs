// voldscan/src/main.rs
mod cli;
mod defs;
mod host;
mod resolver;
mod space;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use host::SystemHost;
use resolver::{PlatformGuard, ResolveOptions, VolumeCache};

static VOLUMES: VolumeCache = VolumeCache::new();

fn build_host(cli: &Cli) -> SystemHost {
    SystemHost {
        mounts_path: cli
            .mounts
            .clone()
            .unwrap_or_else(|| PathBuf::from(defs::PROC_MOUNTS)),
        fstab_override: cli.fstab.clone(),
        search_root: cli.search_root.clone(),
        external_root: cli.external_root.clone(),
        ..SystemHost::default()
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose)?;

    let host = build_host(&cli);
    let opts = ResolveOptions {
        platform_guard: if cli.legacy_platform_guard {
            PlatformGuard::Legacy
        } else {
            PlatformGuard::Fixed
        },
        ..ResolveOptions::default()
    };

    match cli.command.unwrap_or(Commands::Volumes) {
        Commands::Volumes => {
            let set = VOLUMES.get_or_resolve(&host, &opts);
            log::info!("Resolved {} volume(s)", set.volumes.len());
            println!("{}", serde_json::to_string(set)?);
        }
        Commands::Primary => {
            let set = VOLUMES.get_or_resolve(&host, &opts);
            println!("{}", set.primary);
        }
        Commands::Space => space::print_status(&cli.external_root)?,
        Commands::Markers => host::print_markers(&cli.external_root)?,
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Fatal Error: {:#}", e);
        eprintln!("Fatal Error: {:#}", e);
        std::process::exit(1);
    }
}
