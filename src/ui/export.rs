use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::ColorImage;

/// Write a captured frame to `path` as PNG.
pub fn save_png(path: &Path, image: &ColorImage) -> Result<()> {
    let [width, height] = image.size;
    let buffer = image::RgbaImage::from_raw(width as u32, height as u32, image.as_raw().to_vec())
        .context("screenshot buffer does not match its size")?;
    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {width}x{height} chart image to {}", path.display());
    Ok(())
}
