use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, Rgb, RgbImage};
use plotters::prelude::*;

use super::draw::draw_figure;
use super::figure::{file_stem, Figure};

// ---------------------------------------------------------------------------
// Raster output
// ---------------------------------------------------------------------------

/// Physical size and resolution of the written image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterOptions {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: u32,
    /// White border kept around the content when cropping.
    pub crop_padding: u32,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            width_in: 12.0,
            height_in: 10.0,
            dpi: 300,
            crop_padding: 20,
        }
    }
}

impl RasterOptions {
    pub fn pixel_size(&self) -> (u32, u32) {
        let px = |inches: f64| ((inches * self.dpi as f64).round() as u32).max(1);
        (px(self.width_in), px(self.height_in))
    }

    /// Drawing scale relative to 100 dpi.
    pub fn scale(&self) -> f64 {
        self.dpi as f64 / 100.0
    }
}

/// Where the image for `ids` goes: `<dir>/<id>.png` for one sounding,
/// `<dir>/combined_cpt_plot.png` for several.
pub fn output_path(dir: &Path, ids: &[&str]) -> PathBuf {
    dir.join(format!("{}.png", file_stem(ids)))
}

/// Draw `figure` into an in-memory RGB image.
pub fn rasterize(figure: &Figure, opts: &RasterOptions) -> Result<RgbImage> {
    let (w, h) = opts.pixel_size();
    let mut buf = vec![0u8; w as usize * h as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buf, (w, h)).into_drawing_area();
        draw_figure(&root, figure, opts.scale())?;
        root.present().context("finishing bitmap")?;
    }
    RgbImage::from_raw(w, h, buf).context("bitmap buffer has the wrong size")
}

/// Render `figure` and write it as PNG into `dir`, creating `dir` when
/// needed. Returns the written path.
pub fn write_figure(figure: &Figure, dir: &Path, ids: &[&str], opts: &RasterOptions) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = output_path(dir, ids);

    let image = tight_crop(&rasterize(figure, opts)?, opts.crop_padding);
    image
        .save_with_format(&path, ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;

    log::info!(
        "wrote {} ({}x{} px)",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(path)
}

/// Crop away uniform white margins, keeping `padding` pixels of border.
/// A fully white image is returned unchanged.
pub fn tight_crop(image: &RgbImage, padding: u32) -> RgbImage {
    const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

    let (w, h) = image.dimensions();
    let mut min_x = w;
    let mut min_y = h;
    let mut max_x = 0;
    let mut max_y = 0;
    for (x, y, px) in image.enumerate_pixels() {
        if *px != BACKGROUND {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x || min_y > max_y {
        return image.clone();
    }

    let x0 = min_x.saturating_sub(padding);
    let y0 = min_y.saturating_sub(padding);
    let x1 = (max_x + padding).min(w - 1);
    let y1 = (max_y + padding).min(h - 1);
    image::imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::figure::COMBINED_PLOT_NAME;

    #[test]
    fn test_output_path_naming() {
        let dir = Path::new("out");
        assert_eq!(output_path(dir, &["CPT000000225472"]), dir.join("CPT000000225472.png"));
        assert_eq!(
            output_path(dir, &["A", "B", "C"]),
            dir.join(format!("{COMBINED_PLOT_NAME}.png"))
        );
    }

    #[test]
    fn test_pixel_size_follows_dpi() {
        let opts = RasterOptions {
            width_in: 6.0,
            height_in: 10.0,
            dpi: 300,
            crop_padding: 0,
        };
        assert_eq!(opts.pixel_size(), (1800, 3000));
        assert_eq!(opts.scale(), 3.0);
    }

    #[test]
    fn test_tight_crop_keeps_padding() {
        let mut img = RgbImage::from_pixel(100, 80, Rgb([255, 255, 255]));
        img.put_pixel(40, 30, Rgb([0, 0, 0]));
        img.put_pixel(50, 35, Rgb([10, 20, 30]));

        let cropped = tight_crop(&img, 5);
        assert_eq!(cropped.dimensions(), (21, 16));
        assert_eq!(*cropped.get_pixel(5, 5), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_tight_crop_clamps_to_edges_and_ignores_blank() {
        let blank = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        assert_eq!(tight_crop(&blank, 3).dimensions(), (10, 10));

        let mut img = blank.clone();
        img.put_pixel(0, 9, Rgb([0, 0, 0]));
        assert_eq!(tight_crop(&img, 3).dimensions(), (4, 4));
    }
}
