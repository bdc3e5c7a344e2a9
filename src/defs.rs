// Copyright 2026 Voldscan Developers
// SPDX-License-Identifier: GPL-3.0-or-later

pub const PROC_MOUNTS: &str = "/proc/mounts";

/// Mounts sourced from here are managed by the volume daemon and mark
/// removable/external storage.
pub const VOLD_DEVICE_PREFIX: &str = "/dev/block/vold/";

pub const WELL_KNOWN_FSTAB: &str = "/system/etc/vold.fstab";
pub const FSTAB_SEARCH_ROOT: &str = "/";
pub const FSTAB_EXCLUDE: &str = "fstab.goldfish";
pub const FSTAB_CONTENT_MARKER: &str = "/dev/block/";

pub const DEV_MOUNT_PREFIX: &str = "dev_mount";
pub const PLATFORM_DEVICE_PREFIX: &str = "/devices/platform";

pub const DEFAULT_EXTERNAL_MOUNT: &str = "/mnt/sdcard";
pub const DEFAULT_PRIMARY: &str = "/sdcard";
pub const DEFAULT_EXTERNAL_ROOT: &str = "/sdcard";

pub const PRIMARY_HINT: &str = "sdcard0";
pub const PRIMARY_ALIASES: &[&str] = &["/mnt/sdcard", "/sdcard"];

pub const ANDROID_SECURE_MARKER: &str = ".android-secure";
pub const SD_EXT_DIR: &str = "/sd-ext";
