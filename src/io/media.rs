// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading.
//!
//! This module loads the screenshot or extracted video frame under review
//! and converts it to RGBA pixels suitable for display in egui.

use anyhow::{Context, Result};
use std::path::Path;

/// A decoded image in straight RGBA8.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Load an image file from disk.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path)
        .with_context(|| format!("Failed to open image {}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();

    Ok(LoadedImage {
        width,
        height,
        pixels: img.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");
        image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let loaded = load_image(&path).unwrap();
        assert_eq!((loaded.width, loaded.height), (8, 4));
        assert_eq!(loaded.pixels.len(), 8 * 4 * 4);
        assert_eq!(&loaded.pixels[0..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(load_image(Path::new("/nonexistent/frame.png")).is_err());
    }
}
