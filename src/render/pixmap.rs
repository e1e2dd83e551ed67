//! A software raster surface.
//!
//! Pixels are sampled at their centers: a pixel is painted when the point
//! (`px + 0.5`, `py + 0.5`) lies inside the shape. No anti-aliasing, so the
//! same commands always produce the same bytes.

use std::path::Path;

use image::{ImageFormat, Rgba, RgbaImage};

use crate::model::Point;

use super::{Color, Surface};

/// Largest width or height a pixmap accepts, in pixels.
pub const MAX_DIMENSION: u32 = 8192;

/// Errors from sizing a pixmap.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PixmapError {
    #[error("image size must be non-zero, got {width}x{height}")]
    Empty { width: u32, height: u32 },

    #[error("image size {width}x{height} exceeds the {MAX_DIMENSION}px limit")]
    TooLarge { width: u32, height: u32 },
}

/// An RGBA8 image, starting fully transparent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pixmap {
    image: RgbaImage,
}

impl Pixmap {
    /// Allocates a transparent pixmap.
    ///
    /// Each side must be in `1..=MAX_DIMENSION`.
    pub fn new(width: u32, height: u32) -> Result<Self, PixmapError> {
        if width == 0 || height == 0 {
            return Err(PixmapError::Empty { width, height });
        }
        let bytes = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4));
        if width > MAX_DIMENSION || height > MAX_DIMENSION || bytes.is_none() {
            return Err(PixmapError::TooLarge { width, height });
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
        })
    }

    /// The color at (`x`, `y`), or `None` outside the surface.
    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let Rgba([r, g, b, a]) = *self.image.get_pixel_checked(x, y)?;
        Some(Color { r, g, b, a })
    }

    /// Whether every pixel is fully transparent.
    pub fn is_blank(&self) -> bool {
        self.image.pixels().all(|px| px[3] == 0)
    }

    /// Writes the surface as a PNG file.
    pub fn save_png(&self, path: &Path) -> Result<(), image::ImageError> {
        self.image.save_with_format(path, ImageFormat::Png)
    }

    /// Source-over blend of `color` onto one pixel.
    fn blend(&mut self, x: u32, y: u32, color: Color) {
        let Some(dst) = self.image.get_pixel_mut_checked(x, y) else {
            return;
        };
        match color.a {
            0 => {}
            255 => *dst = Rgba([color.r, color.g, color.b, 255]),
            _ => {
                let sa = f64::from(color.a) / 255.0;
                let da = f64::from(dst[3]) / 255.0;
                let out_a = sa + da * (1.0 - sa);
                let mix = |s: u8, d: u8| {
                    let c = (f64::from(s) * sa + f64::from(d) * da * (1.0 - sa)) / out_a;
                    to_channel(c)
                };
                *dst = Rgba([
                    mix(color.r, dst[0]),
                    mix(color.g, dst[1]),
                    mix(color.b, dst[2]),
                    to_channel(out_a * 255.0),
                ]);
            }
        }
    }

    /// Paints every pixel in the bounding box whose center satisfies `inside`.
    fn fill_where(
        &mut self,
        (min_x, min_y, max_x, max_y): (f64, f64, f64, f64),
        color: Color,
        inside: impl Fn(f64, f64) -> bool,
    ) {
        let (width, height) = self.image.dimensions();
        let (x0, x1) = (
            clamp_index(min_x.floor(), width),
            clamp_index(max_x.ceil(), width),
        );
        let (y0, y1) = (
            clamp_index(min_y.floor(), height),
            clamp_index(max_y.ceil(), height),
        );
        for py in y0..y1 {
            for px in x0..x1 {
                let (cx, cy) = (f64::from(px) + 0.5, f64::from(py) + 0.5);
                if inside(cx, cy) {
                    self.blend(px, py, color);
                }
            }
        }
    }
}

impl Surface for Pixmap {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn clear(&mut self) {
        self.image.fill(0);
    }

    fn fill_circle(&mut self, center: Point, radius: f64, color: Color) {
        let bounds = (
            center.x - radius,
            center.y - radius,
            center.x + radius,
            center.y + radius,
        );
        let r2 = radius * radius;
        self.fill_where(bounds, color, |cx, cy| {
            let (dx, dy) = (cx - center.x, cy - center.y);
            dx * dx + dy * dy <= r2
        });
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f64, color: Color) {
        let (dx, dy) = (to.x - from.x, to.y - from.y);
        let len2 = dx * dx + dy * dy;
        // Butt caps: a zero-length segment covers nothing.
        if len2 <= 0.0 {
            return;
        }
        let half = width / 2.0;
        let bounds = (
            from.x.min(to.x) - half,
            from.y.min(to.y) - half,
            from.x.max(to.x) + half,
            from.y.max(to.y) + half,
        );
        self.fill_where(bounds, color, |cx, cy| {
            let (px, py) = (cx - from.x, cy - from.y);
            let t = (px * dx + py * dy) / len2;
            if !(0.0..=1.0).contains(&t) {
                return false;
            }
            let cross = px * dy - py * dx;
            cross * cross <= half * half * len2
        });
    }

    fn fill_rect(&mut self, origin: Point, width: f64, height: f64, color: Color) {
        let (x_end, y_end) = (origin.x + width, origin.y + height);
        let (x0, x1) = (origin.x.min(x_end), origin.x.max(x_end));
        let (y0, y1) = (origin.y.min(y_end), origin.y.max(y_end));
        self.fill_where((x0, y0, x1, y1), color, |cx, cy| {
            cx >= x0 && cx < x1 && cy >= y0 && cy < y1
        });
    }
}

/// Clamps a pixel coordinate into `0..=limit`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_index(v: f64, limit: u32) -> u32 {
    v.clamp(0.0, f64::from(limit)) as u32
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
