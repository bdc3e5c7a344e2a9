// Copyright 2026 Voldscan Developers
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::Path;
use std::sync::OnceLock;

use serde::Serialize;

use crate::defs;
use crate::host::StorageHost;

/// Validated external-storage mount points, in mount-table order, plus the
/// single path selected as the primary volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedVolumeSet {
    pub volumes: Vec<String>,
    pub primary: String,
}

/// Guard applied to the second field of `/devices/platform` config lines.
///
/// `Legacy` reproduces the inverted check shipped on older builds: a line
/// whose field is present is skipped outright, so the branch never yields a
/// reference entry. `Fixed` skips only when the field is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformGuard {
    Legacy,
    Fixed,
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub default_external: String,
    pub platform_guard: PlatformGuard,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            default_external: defs::DEFAULT_EXTERNAL_MOUNT.to_string(),
            platform_guard: PlatformGuard::Fixed,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldGuard {
    SkipIfMissing,
    SkipIfPresent,
}

struct LineRule {
    prefix: &'static str,
    field: usize,
    guard: FieldGuard,
}

fn line_rules(platform_guard: PlatformGuard) -> [LineRule; 2] {
    [
        LineRule {
            prefix: defs::DEV_MOUNT_PREFIX,
            field: 2,
            guard: FieldGuard::SkipIfMissing,
        },
        LineRule {
            prefix: defs::PLATFORM_DEVICE_PREFIX,
            field: 1,
            guard: match platform_guard {
                PlatformGuard::Fixed => FieldGuard::SkipIfMissing,
                PlatformGuard::Legacy => FieldGuard::SkipIfPresent,
            },
        },
    ]
}

fn extract_field<'a>(parts: &[&'a str], rule: &LineRule) -> Option<&'a str> {
    let field = parts.get(rule.field).copied();
    match rule.guard {
        FieldGuard::SkipIfMissing => field,
        // Inverted on purpose: a present field skips the line, an absent
        // one leaves nothing to take.
        FieldGuard::SkipIfPresent => None,
    }
}

fn parse_mount_candidates(mount_table: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    for line in mount_table.lines() {
        if !line.starts_with(defs::VOLD_DEVICE_PREFIX) {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(path) = parts.get(1) else {
            log::debug!("Skipping short mount line: {line}");
            continue;
        };
        candidates.push((*path).to_string());
    }
    candidates
}

fn parse_reference_entries(config_text: &str, platform_guard: PlatformGuard) -> Vec<String> {
    let rules = line_rules(platform_guard);
    let mut references = Vec::new();

    for line in config_text.lines() {
        let Some(rule) = rules.iter().find(|r| line.starts_with(r.prefix)) else {
            continue;
        };
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(raw) = extract_field(&parts, rule) else {
            continue;
        };

        // A trailing ":qualifier" names a secondary role, not the path.
        let value = match raw.split_once(':') {
            Some((head, _)) => head,
            None => raw,
        };

        if value.to_lowercase().contains("usb") {
            log::debug!("Ignoring usb-backed reference: {value}");
            continue;
        }
        references.push(value.to_string());
    }
    references
}

/// Runs the full resolution pass over already-fetched text.
///
/// `is_writable_dir` answers whether a path exists, is a directory and is
/// writable; tests substitute a stub. Malformed lines are skipped and a
/// missing config (`None`) leaves the reference list empty, so this never
/// fails. The worst outcome is an empty list with the default primary.
pub fn resolve_from_text(
    mount_table: &str,
    config_text: Option<&str>,
    external_mounted: bool,
    opts: &ResolveOptions,
    is_writable_dir: impl Fn(&str) -> bool,
) -> ResolvedVolumeSet {
    let mut candidates = parse_mount_candidates(mount_table);

    let add_external = candidates.len() == 1 && external_mounted;
    if candidates.is_empty() && add_external {
        candidates.push(opts.default_external.clone());
    }

    let mut references = match config_text {
        Some(text) => parse_reference_entries(text, opts.platform_guard),
        None => Vec::new(),
    };

    if add_external && references.len() == 1 && external_mounted {
        candidates.push(references[0].clone());
    }
    if references.is_empty() && external_mounted {
        references.push(opts.default_external.clone());
    }

    let mut volumes: Vec<String> = Vec::new();
    for mount in candidates {
        if !references.contains(&mount) || volumes.contains(&mount) {
            continue;
        }
        if !is_writable_dir(&mount) {
            log::debug!("Dropping unusable mount point: {mount}");
            continue;
        }
        volumes.push(mount);
    }

    // Scan in order and keep overwriting; the last matching volume wins.
    let mut primary = None;
    for mount in &volumes {
        if mount.contains(defs::PRIMARY_HINT)
            || defs::PRIMARY_ALIASES
                .iter()
                .any(|alias| mount.eq_ignore_ascii_case(alias))
        {
            primary = Some(mount.clone());
        }
    }

    ResolvedVolumeSet {
        volumes,
        primary: primary.unwrap_or_else(|| defs::DEFAULT_PRIMARY.to_string()),
    }
}

pub fn resolve(host: &dyn StorageHost, opts: &ResolveOptions) -> ResolvedVolumeSet {
    let mount_table = host.mount_table();
    let config_text = host
        .find_mount_config()
        .and_then(|path| host.read_text(&path));
    let external_mounted = host.external_storage_mounted();

    resolve_from_text(
        &mount_table,
        config_text.as_deref(),
        external_mounted,
        opts,
        |path| host.is_writable_dir(Path::new(path)),
    )
}

/// Init-once holder for the per-process resolution result. The mount table
/// is assumed stable for the process lifetime, so concurrent callers share
/// the first computed set.
pub struct VolumeCache {
    resolved: OnceLock<ResolvedVolumeSet>,
}

impl VolumeCache {
    pub const fn new() -> Self {
        Self {
            resolved: OnceLock::new(),
        }
    }

    pub fn get_or_resolve(
        &self,
        host: &dyn StorageHost,
        opts: &ResolveOptions,
    ) -> &ResolvedVolumeSet {
        self.resolved.get_or_init(|| resolve(host, opts))
    }
}

impl Default for VolumeCache {
    fn default() -> Self {
        Self::new()
    }
}
