//! Programmatic signature: a sine-wave squiggle with the name written underneath.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use rusttype::{point, Font, Scale};
use thiserror::Error;
use tracing::{info, warn};

use crate::render::bitmap_font;

pub const WIDTH: u32 = 400;
pub const HEIGHT: u32 = 200;

const X_OFFSET: f32 = 50.0;
const Y_BASELINE: f32 = 100.0;
const X_STEP: f32 = 20.0;
const WAVE_AMPLITUDE: f32 = 10.0;
const WAVE_FREQUENCY: f32 = 0.5;
const STROKE_WIDTH: f32 = 3.0;
/// Gap between the squiggle baseline and the top of the name text.
const TEXT_GAP: f32 = 30.0;
const FONT_PX: f32 = 36.0;
const BITMAP_SCALE: u32 = 2;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const INK: Rgb<u8> = Rgb([0, 0, 0]);

const PREFERRED_FONT_FILE: &str = "DejaVuSans.ttf";
const FONT_DIRS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu",
    "/usr/share/fonts/dejavu",
    "/usr/share/fonts/TTF",
    "/usr/local/share/fonts",
    "/Library/Fonts",
    "C:\\Windows\\Fonts",
];

#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Font used for the name under the squiggle.
pub enum SignatureFont {
    TrueType(Font<'static>),
    /// Built-in 5×7 bitmap glyphs.
    Bitmap,
}

impl SignatureFont {
    /// Loads the configured font, else `DejaVuSans.ttf` from common font
    /// directories, else falls back to the built-in bitmap font.
    pub fn load(configured: Option<&Path>) -> Self {
        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FONT_DIRS.iter().map(|dir| Path::new(dir).join(PREFERRED_FONT_FILE)));

        for path in candidates {
            match try_load_font(&path) {
                Some(font) => {
                    info!("Signature font loaded from {}", path.display());
                    return SignatureFont::TrueType(font);
                }
                None if configured.is_some_and(|c| c == path) => {
                    warn!("Configured signature font {} could not be loaded", path.display());
                }
                None => {}
            }
        }

        info!("No TrueType signature font found; using built-in bitmap font");
        SignatureFont::Bitmap
    }
}

fn try_load_font(path: &Path) -> Option<Font<'static>> {
    let data = std::fs::read(path).ok()?;
    Font::try_from_vec(data)
}

/// Renders a 400×200 PNG signature for `name`.
pub fn render_signature(name: &str, font: &SignatureFont) -> Result<Vec<u8>, SignatureError> {
    let mut img = RgbImage::from_pixel(WIDTH, HEIGHT, WHITE);

    let points = squiggle_points(name);
    for segment in points.windows(2) {
        draw_thick_segment(&mut img, segment[0], segment[1], STROKE_WIDTH);
    }

    let text_top = Y_BASELINE + TEXT_GAP;
    match font {
        SignatureFont::TrueType(font) => draw_truetype_text(&mut img, font, name, X_OFFSET, text_top),
        SignatureFont::Bitmap => {
            bitmap_font::for_each_pixel(name, BITMAP_SCALE, |x, y| {
                let px = X_OFFSET as u32 + x;
                let py = text_top as u32 + y;
                if px < WIDTH && py < HEIGHT {
                    img.put_pixel(px, py, INK);
                }
            });
        }
    }

    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

/// One point per character: fixed horizontal step, sine offset from the baseline.
fn squiggle_points(name: &str) -> Vec<(f32, f32)> {
    name.chars()
        .enumerate()
        .map(|(i, _)| {
            let i = i as f32;
            (
                X_OFFSET + i * X_STEP,
                Y_BASELINE + (i * WAVE_FREQUENCY).sin() * WAVE_AMPLITUDE,
            )
        })
        .collect()
}

/// Paints every pixel whose centre lies within `width / 2` of the segment.
fn draw_thick_segment(img: &mut RgbImage, a: (f32, f32), b: (f32, f32), width: f32) {
    let half = width / 2.0;
    let (min_x, max_x) = (a.0.min(b.0) - half, a.0.max(b.0) + half);
    let (min_y, max_y) = (a.1.min(b.1) - half, a.1.max(b.1) + half);

    let x_range = (min_x.floor().max(0.0) as u32)..=(max_x.ceil().min(WIDTH as f32 - 1.0) as u32);
    for x in x_range {
        for y in (min_y.floor().max(0.0) as u32)..=(max_y.ceil().min(HEIGHT as f32 - 1.0) as u32) {
            if distance_to_segment((x as f32, y as f32), a, b) <= half {
                img.put_pixel(x, y, INK);
            }
        }
    }
}

fn distance_to_segment(p: (f32, f32), a: (f32, f32), b: (f32, f32)) -> f32 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

/// Draws `text` with its top edge at `top`, alpha-blending glyph coverage onto the image.
fn draw_truetype_text(img: &mut RgbImage, font: &Font<'static>, text: &str, left: f32, top: f32) {
    let scale = Scale::uniform(FONT_PX);
    let ascent = font.v_metrics(scale).ascent;

    for glyph in font.layout(text, scale, point(left, top + ascent)) {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };
        glyph.draw(|gx, gy, coverage| {
            let x = bb.min.x + gx as i32;
            let y = bb.min.y + gy as i32;
            if x < 0 || y < 0 || x >= WIDTH as i32 || y >= HEIGHT as i32 {
                return;
            }
            let pixel = img.get_pixel_mut(x as u32, y as u32);
            for channel in pixel.0.iter_mut() {
                let blended = INK.0[0] as f32 * coverage + *channel as f32 * (1.0 - coverage);
                *channel = blended.round() as u8;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(png: &[u8]) -> RgbImage {
        image::load_from_memory_with_format(png, ImageFormat::Png)
            .unwrap()
            .to_rgb8()
    }

    #[test]
    fn test_john_doe_is_valid_400x200_png() {
        let png = render_signature("John Doe", &SignatureFont::Bitmap).unwrap();
        assert!(!png.is_empty());
        let img = decode(&png);
        assert_eq!(img.dimensions(), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_squiggle_starts_at_offset_on_baseline() {
        let img = decode(&render_signature("John Doe", &SignatureFont::Bitmap).unwrap());
        assert_eq!(*img.get_pixel(50, 100), INK);
        // Background untouched far from the drawing
        assert_eq!(*img.get_pixel(5, 5), WHITE);
        assert_eq!(*img.get_pixel(395, 195), WHITE);
    }

    #[test]
    fn test_name_is_drawn_below_the_line() {
        let img = decode(&render_signature("John Doe", &SignatureFont::Bitmap).unwrap());
        let inked_below = (130..150)
            .flat_map(|y| (50..150).map(move |x| (x, y)))
            .any(|(x, y)| *img.get_pixel(x, y) == INK);
        assert!(inked_below);
    }

    #[test]
    fn test_points_follow_fixed_step_and_sine() {
        let points = squiggle_points("abc");
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], (50.0, 100.0));
        assert_eq!(points[1].0, 70.0);
        assert!((points[1].1 - (100.0 + 0.5_f32.sin() * 10.0)).abs() < 1e-4);
        assert_eq!(points[2].0, 90.0);
    }

    #[test]
    fn test_single_character_draws_no_line() {
        let img = decode(&render_signature("J", &SignatureFont::Bitmap).unwrap());
        // One point only, so nothing on the baseline right of it
        assert_eq!(*img.get_pixel(60, 100), WHITE);
    }

    #[test]
    fn test_empty_name_is_blank_image() {
        let img = decode(&render_signature("", &SignatureFont::Bitmap).unwrap());
        assert!(img.pixels().all(|p| *p == WHITE));
    }

    #[test]
    fn test_distance_to_segment() {
        assert!((distance_to_segment((5.0, 3.0), (0.0, 0.0), (10.0, 0.0)) - 3.0).abs() < 1e-6);
        assert!((distance_to_segment((-4.0, 3.0), (0.0, 0.0), (10.0, 0.0)) - 5.0).abs() < 1e-6);
        assert!((distance_to_segment((1.0, 1.0), (0.0, 0.0), (0.0, 0.0)) - 2f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_missing_configured_font_falls_back_to_bitmap() {
        let font = SignatureFont::load(Some(Path::new("/nonexistent/font.ttf")));
        // Either a system DejaVu font or the bitmap fallback; rendering works with both
        let png = render_signature("Jane Roe", &font).unwrap();
        assert_eq!(decode(&png).dimensions(), (WIDTH, HEIGHT));
    }
}
