use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::RgbaImage;

use crate::core::CowImageSource;

const DATA_DIR_NAME: &str = "xcowsay";

/// Directories searched for cow images, most specific first.
pub fn image_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    // 1. Per-user data directory
    if let Some(data) = dirs::data_dir() {
        dirs.push(data.join(DATA_DIR_NAME));
    }

    // 2. Installed alongside the executable (prefix/bin -> prefix/share)
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(prefix) = exe_path.parent().and_then(Path::parent) {
            dirs.push(prefix.join("share").join(DATA_DIR_NAME));
        }
    }

    // 3. System-wide
    dirs.push(PathBuf::from("/usr/local/share").join(DATA_DIR_NAME));
    dirs.push(PathBuf::from("/usr/share").join(DATA_DIR_NAME));
    dirs
}

pub fn find_cow_image(source: &CowImageSource, dirs: &[PathBuf]) -> Option<PathBuf> {
    if let Some(path) = &source.alt_image {
        return Some(path.clone());
    }

    let file_name = source.file_name();
    dirs.iter().map(|dir| dir.join(&file_name)).find(|path| {
        let found = path.is_file();
        if found {
            tracing::debug!("Found cow image: {:?}", path);
        }
        found
    })
}

pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("Failed to load image {}", path.display()))?;
    Ok(img.to_rgba8())
}

pub fn load_cow_image(source: &CowImageSource) -> Result<RgbaImage> {
    let dirs = image_search_dirs();
    let path = find_cow_image(source, &dirs).with_context(|| {
        format!(
            "Failed to find cow image {} (searched {:?})",
            source.file_name(),
            dirs
        )
    })?;
    load_image(&path).context("Failed to load cow image")
}

/// Turn a dream file argument into an absolute path that is readable now.
pub fn resolve_dream_file(path: &str) -> Result<PathBuf> {
    let absolute = std::fs::canonicalize(path)
        .with_context(|| format!("Failed to find dream file {}", path))?;
    File::open(&absolute).with_context(|| format!("Cannot read dream file {}", path))?;
    Ok(absolute)
}
