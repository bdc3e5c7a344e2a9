// Copyright 2026 Voldscan Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Result;
use procfs::process::Process;
use regex_lite::Regex;
use rustix::fs::Access;
use serde::Serialize;
use walkdir::WalkDir;

use crate::defs;

/// Everything the resolver needs from the surrounding system. Kept narrow
/// so tests can swap in a canned implementation.
pub trait StorageHost {
    /// Raw text of the live mount table.
    fn mount_table(&self) -> String;

    /// Raw contents of an arbitrary file, `None` when unreadable.
    fn read_text(&self, path: &Path) -> Option<String>;

    /// Locate the static mount-configuration file, if any.
    fn find_mount_config(&self) -> Option<PathBuf>;

    /// Whether the built-in external storage is currently mounted.
    fn external_storage_mounted(&self) -> bool;

    /// Whether `path` exists, is a directory and is writable.
    fn is_writable_dir(&self, path: &Path) -> bool;
}

static FSTAB_NAME_REGEX: OnceLock<Regex> = OnceLock::new();

fn fstab_name_regex() -> &'static Regex {
    FSTAB_NAME_REGEX.get_or_init(|| Regex::new(r"^fstab\..+$").expect("Invalid Regex pattern"))
}

pub struct SystemHost {
    pub mounts_path: PathBuf,
    pub well_known_fstab: PathBuf,
    pub fstab_override: Option<PathBuf>,
    pub search_root: PathBuf,
    pub external_root: PathBuf,
}

impl Default for SystemHost {
    fn default() -> Self {
        Self {
            mounts_path: PathBuf::from(defs::PROC_MOUNTS),
            well_known_fstab: PathBuf::from(defs::WELL_KNOWN_FSTAB),
            fstab_override: None,
            search_root: PathBuf::from(defs::FSTAB_SEARCH_ROOT),
            external_root: PathBuf::from(defs::DEFAULT_EXTERNAL_ROOT),
        }
    }
}

impl StorageHost for SystemHost {
    fn mount_table(&self) -> String {
        fs::read_to_string(&self.mounts_path).unwrap_or_else(|e| {
            log::debug!("Failed to read {}: {}", self.mounts_path.display(), e);
            String::new()
        })
    }

    fn read_text(&self, path: &Path) -> Option<String> {
        fs::read_to_string(path).ok()
    }

    fn find_mount_config(&self) -> Option<PathBuf> {
        if let Some(path) = &self.fstab_override {
            return path.exists().then(|| path.clone());
        }

        if self.well_known_fstab.exists() {
            return Some(self.well_known_fstab.clone());
        }

        let re = fstab_name_regex();
        for entry in WalkDir::new(&self.search_root)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !re.is_match(&name) || name == defs::FSTAB_EXCLUDE {
                continue;
            }
            if let Some(content) = self.read_text(entry.path())
                && content.contains(defs::FSTAB_CONTENT_MARKER)
            {
                log::debug!("Using discovered mount config: {}", entry.path().display());
                return Some(entry.path().to_path_buf());
            }
        }
        None
    }

    fn external_storage_mounted(&self) -> bool {
        if self.mounts_path != Path::new(defs::PROC_MOUNTS) {
            return table_lists_mount(&self.mount_table(), &self.external_root);
        }
        is_mounted(&self.external_root)
    }

    fn is_writable_dir(&self, path: &Path) -> bool {
        path.is_dir() && rustix::fs::access(path, Access::WRITE_OK).is_ok()
    }
}

fn table_lists_mount(table: &str, path: &Path) -> bool {
    let path_str = path.to_string_lossy();
    let search = path_str.trim_end_matches('/');
    for line in table.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() > 1 && parts[1] == search {
            return true;
        }
    }
    false
}

pub fn is_mounted<P: AsRef<Path>>(path: P) -> bool {
    let path_str = path.as_ref().to_string_lossy();
    let search = path_str.trim_end_matches('/');

    if let Ok(process) = Process::myself()
        && let Ok(mountinfo) = process.mountinfo()
    {
        return mountinfo
            .into_iter()
            .any(|m| m.mount_point.to_string_lossy() == search);
    }

    if let Ok(content) = fs::read_to_string(defs::PROC_MOUNTS) {
        return table_lists_mount(&content, path.as_ref());
    }
    false
}

pub fn has_android_secure(external_root: &Path) -> bool {
    external_root.join(defs::ANDROID_SECURE_MARKER).is_dir()
}

pub fn has_sd_ext() -> bool {
    Path::new(defs::SD_EXT_DIR).is_dir()
}

#[derive(Serialize)]
struct MarkerStatus {
    android_secure: bool,
    sd_ext: bool,
}

pub fn print_markers(external_root: &Path) -> Result<()> {
    let status = MarkerStatus {
        android_secure: has_android_secure(external_root),
        sd_ext: has_sd_ext(),
    };
    println!("{}", serde_json::to_string(&status)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn host_in(dir: &Path) -> SystemHost {
        SystemHost {
            mounts_path: dir.join("mounts"),
            well_known_fstab: dir.join("vold.fstab"),
            fstab_override: None,
            search_root: dir.to_path_buf(),
            external_root: PathBuf::from("/mnt/sdcard"),
        }
    }

    #[test]
    fn discovery_skips_goldfish_and_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fstab.aaa"), "no devices here\n").unwrap();
        fs::write(
            dir.path().join("fstab.goldfish"),
            "/dev/block/mmcblk0p1 /sdcard vfat\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("fstab.sdcard"),
            "/dev/block/mmcblk0p1 /mnt/sdcard vfat\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "/dev/block/ mention\n").unwrap();

        let host = host_in(dir.path());
        assert_eq!(
            host.find_mount_config(),
            Some(dir.path().join("fstab.sdcard"))
        );
    }

    #[test]
    fn well_known_config_wins_over_discovery() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("vold.fstab"), "dev_mount sdcard /mnt/sdcard0 auto x\n").unwrap();
        fs::write(
            dir.path().join("fstab.sdcard"),
            "/dev/block/mmcblk0p1 /mnt/sdcard vfat\n",
        )
        .unwrap();

        let host = host_in(dir.path());
        assert_eq!(host.find_mount_config(), Some(dir.path().join("vold.fstab")));
    }

    #[test]
    fn override_bypasses_discovery() {
        let dir = tempfile::tempdir().unwrap();
        let custom = dir.path().join("my.fstab");
        fs::write(&custom, "dev_mount sdcard /mnt/sdcard0 auto x\n").unwrap();

        let mut host = host_in(dir.path());
        host.fstab_override = Some(custom.clone());
        assert_eq!(host.find_mount_config(), Some(custom));

        host.fstab_override = Some(dir.path().join("absent.fstab"));
        assert_eq!(host.find_mount_config(), None);
    }

    #[test]
    fn missing_config_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let host = host_in(dir.path());
        assert_eq!(host.find_mount_config(), None);
    }

    #[test]
    fn writable_dir_check_rejects_files_and_absent_paths() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        fs::write(&file, "x").unwrap();

        let host = host_in(dir.path());
        assert!(host.is_writable_dir(dir.path()));
        assert!(!host.is_writable_dir(&file));
        assert!(!host.is_writable_dir(&dir.path().join("absent")));
    }

    #[test]
    fn mounted_state_follows_the_mount_table() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("mounts"),
            "tmpfs /mnt/sdcard tmpfs rw 0 0\n",
        )
        .unwrap();

        let mut host = host_in(dir.path());
        assert!(host.external_storage_mounted());

        host.external_root = PathBuf::from("/mnt/extsd");
        assert!(!host.external_storage_mounted());
    }

    #[test]
    fn marker_folders_are_plain_existence_checks() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_android_secure(dir.path()));
        fs::create_dir(dir.path().join(defs::ANDROID_SECURE_MARKER)).unwrap();
        assert!(has_android_secure(dir.path()));
    }
}
