// voldscan/src/space.rs
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

// One binary gigabyte.
const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

pub fn available_gib(available_blocks: u64, block_size: u64) -> f64 {
    (available_blocks as f64 * block_size as f64) / BYTES_PER_GIB as f64
}

pub fn space_left(path: &Path) -> Result<f64> {
    let stat = rustix::fs::statvfs(path)
        .with_context(|| format!("statvfs failed for {}", path.display()))?;
    Ok(available_gib(stat.f_bavail, stat.f_frsize))
}

#[derive(Serialize)]
struct SpaceStatus {
    path: String,
    available_gib: f64,
}

pub fn print_status(path: &Path) -> Result<()> {
    let status = SpaceStatus {
        path: path.to_string_lossy().to_string(),
        available_gib: space_left(path)?,
    };
    println!("{}", serde_json::to_string(&status)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gib_conversion_is_exact_for_powers_of_two() {
        assert_eq!(available_gib(1024 * 1024, 1024), 1.0);
        assert_eq!(available_gib(524288, 4096), 2.0);
        assert_eq!(available_gib(0, 4096), 0.0);
    }

    #[test]
    fn space_left_reports_a_real_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        assert!(space_left(dir.path()).unwrap() >= 0.0);
    }

    #[test]
    fn space_left_fails_for_absent_paths() {
        assert!(space_left(Path::new("/definitely/not/here")).is_err());
    }
}
