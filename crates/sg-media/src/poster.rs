//! Enhanced-poster compositor (spec §4.3.1). Built with `image` +
//! `imageproc` + `ab_glyph` against a PNG canvas: one function per visual
//! treatment, a small parameter struct up front, rather than an ffmpeg
//! filter graph.

use ab_glyph::{FontArc, PxScale};
use image::{imageops, DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use sg_models::Movie;

use crate::error::{MediaError, MediaResult};

pub const CANVAS_WIDTH: u32 = 1080;
pub const CANVAS_HEIGHT: u32 = 1920;

const PANEL_HEIGHT: u32 = 420;
const SHADOW_LAYERS: i32 = 3;

/// System sans-serif candidates searched in order (spec §4.3.1: "Typography
/// uses system sans-serif"). The first one found on disk is used.
const SYSTEM_FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/truetype/freefont/FreeSansBold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
];

pub fn load_system_font() -> MediaResult<FontArc> {
    for path in SYSTEM_FONT_CANDIDATES {
        if let Ok(bytes) = std::fs::read(path) {
            if let Ok(font) = FontArc::try_from_vec(bytes) {
                return Ok(font);
            }
        }
    }
    Err(MediaError::ImageError(
        "no system sans-serif font found among known candidates".to_string(),
    ))
}

/// Render the enhanced poster for one movie (spec §4.3.1 steps 2-3).
/// `poster_bytes` is `None` when the download failed upstream, in which
/// case a solid-color fallback card is produced instead (spec fallback).
pub fn render_enhanced_poster(
    movie: &Movie,
    platform_color: [u8; 3],
    poster_bytes: Option<&[u8]>,
    font: &FontArc,
) -> MediaResult<DynamicImage> {
    match poster_bytes {
        Some(bytes) => render_from_poster(movie, platform_color, bytes, font),
        None => render_fallback_card(movie, platform_color, font),
    }
}

fn render_from_poster(
    movie: &Movie,
    platform_color: [u8; 3],
    poster_bytes: &[u8],
    font: &FontArc,
) -> MediaResult<DynamicImage> {
    let original = image::load_from_memory(poster_bytes)?;

    let mut canvas = RgbaImage::new(CANVAS_WIDTH, CANVAS_HEIGHT);
    draw_background(&mut canvas, &original);
    draw_foreground(&mut canvas, &original);
    draw_metadata_panel(&mut canvas, movie, platform_color, font);

    Ok(DynamicImage::ImageRgba8(canvas))
}

/// Blurred, color-graded copy of the poster as a full-frame background
/// (spec §4.3.1 step 2).
fn draw_background(canvas: &mut RgbaImage, original: &DynamicImage) {
    let filled = original.resize_to_fill(CANVAS_WIDTH, CANVAS_HEIGHT, imageops::FilterType::Triangle);
    let blurred = imageops::blur(&filled.to_rgba8(), 24.0);
    let graded = color_grade(&blurred, 0.55, -10i16);
    imageops::overlay(canvas, &graded, 0, 0);
}

/// Darken and desaturate slightly so foreground/text stay legible over
/// varied backgrounds.
fn color_grade(image: &RgbaImage, brightness_scale: f32, contrast_shift: i16) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        for channel in 0..3 {
            let v = pixel[channel] as f32 * brightness_scale + contrast_shift as f32;
            pixel[channel] = v.clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Centered, aspect-preserved original poster over the blurred background
/// (spec §4.3.1 step 2).
fn draw_foreground(canvas: &mut RgbaImage, original: &DynamicImage) {
    let max_width = (CANVAS_WIDTH as f32 * 0.82) as u32;
    let max_height = CANVAS_HEIGHT - PANEL_HEIGHT - 120;
    let fitted = original.resize(max_width, max_height, imageops::FilterType::Lanczos3);

    let x = (CANVAS_WIDTH as i64 - fitted.width() as i64) / 2;
    let y = 80i64;
    imageops::overlay(canvas, &fitted.to_rgba8(), x, y);
}

/// Bottom metadata panel: title, year, IMDB score + vote count, platform
/// badge, genre chips, runtime (spec §4.3.1 step 2), with multi-layer drop
/// shadows for text legibility.
fn draw_metadata_panel(canvas: &mut RgbaImage, movie: &Movie, platform_color: [u8; 3], font: &FontArc) {
    let panel_y = CANVAS_HEIGHT - PANEL_HEIGHT;
    let panel = Rect::at(0, panel_y as i32).of_size(CANVAS_WIDTH, PANEL_HEIGHT);
    draw_filled_rect_mut(canvas, panel, Rgba([10, 10, 14, 210]));

    let title = &movie.title;
    draw_text_with_shadow(canvas, font, title, 48, panel_y as i32 + 32, 46.0, Rgba([255, 255, 255, 255]));

    let metadata_line = format!(
        "{} · IMDB {:.1} ({}) · {} min",
        movie.year,
        movie.imdb_score,
        format_vote_count(movie.imdb_votes),
        movie.runtime_minutes.unwrap_or(0),
    );
    draw_text_with_shadow(
        canvas,
        font,
        &metadata_line,
        48,
        panel_y as i32 + 100,
        32.0,
        Rgba([220, 220, 220, 255]),
    );

    draw_platform_badge(canvas, font, 48, panel_y as i32 + 160, platform_color);
    draw_genre_chips(canvas, font, 48, panel_y as i32 + 230, &movie.genres);
}

fn draw_text_with_shadow(
    canvas: &mut RgbaImage,
    font: &FontArc,
    text: &str,
    x: i32,
    y: i32,
    size: f32,
    color: Rgba<u8>,
) {
    let scale = PxScale::from(size);
    for layer in 1..=SHADOW_LAYERS {
        let alpha = (120 / layer.max(1)) as u8;
        draw_text_mut(canvas, Rgba([0, 0, 0, alpha]), x + layer, y + layer, scale, font, text);
    }
    draw_text_mut(canvas, color, x, y, scale, font, text);
}

fn draw_platform_badge(canvas: &mut RgbaImage, font: &FontArc, x: i32, y: i32, color: [u8; 3]) {
    let scale = PxScale::from(28.0);
    let label = "PLATFORM";
    let (w, h) = text_size(scale, font, label);
    let padding = 14i32;
    let rect = Rect::at(x, y).of_size(w + padding as u32 * 2, h + padding as u32);
    draw_filled_rect_mut(canvas, rect, Rgba([color[0], color[1], color[2], 255]));
    draw_text_mut(canvas, Rgba([255, 255, 255, 255]), x + padding, y + padding / 2, scale, font, label);
}

fn draw_genre_chips(canvas: &mut RgbaImage, font: &FontArc, start_x: i32, y: i32, genres: &[String]) {
    let scale = PxScale::from(24.0);
    let mut x = start_x;
    for genre in genres.iter().take(3) {
        let (w, _h) = text_size(scale, font, genre);
        let padding = 10i32;
        let rect = Rect::at(x, y).of_size(w + padding as u32 * 2, 36);
        draw_filled_rect_mut(canvas, rect, Rgba([50, 50, 58, 200]));
        draw_text_mut(canvas, Rgba([235, 235, 235, 255]), x + padding, y + 4, scale, font, genre);
        x += w as i32 + padding * 2 + 16;
    }
}

/// Fallback solid-color card when the poster download fails (spec
/// §4.3.1 fallback): title and metadata only, no foreground/background art.
fn render_fallback_card(movie: &Movie, platform_color: [u8; 3], font: &FontArc) -> MediaResult<DynamicImage> {
    let mut canvas = RgbaImage::from_pixel(CANVAS_WIDTH, CANVAS_HEIGHT, Rgba([24, 24, 30, 255]));
    draw_metadata_panel(&mut canvas, movie, platform_color, font);
    draw_text_with_shadow(
        &mut canvas,
        font,
        &movie.title,
        48,
        CANVAS_HEIGHT as i32 / 2,
        64.0,
        Rgba([255, 255, 255, 255]),
    );
    Ok(DynamicImage::ImageRgba8(canvas))
}

fn format_vote_count(votes: i64) -> String {
    if votes >= 1_000_000 {
        format!("{:.1}M votes", votes as f64 / 1_000_000.0)
    } else if votes >= 1_000 {
        format!("{:.1}K votes", votes as f64 / 1_000.0)
    } else {
        format!("{votes} votes")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vote_count_is_abbreviated_above_a_thousand() {
        assert_eq!(format_vote_count(500), "500 votes");
        assert_eq!(format_vote_count(12_345), "12.3K votes");
        assert_eq!(format_vote_count(2_500_000), "2.5M votes");
    }

    #[test]
    fn system_font_lookup_fails_closed_off_known_systems() {
        // On a machine with none of the known font paths installed,
        // `load_system_font` must return an error rather than panic —
        // exercised here since CI containers often ship no fonts at all.
        let result = load_system_font();
        match result {
            Ok(_) => {}
            Err(MediaError::ImageError(msg)) => assert!(msg.contains("font")),
            Err(e) => panic!("unexpected error variant: {e}"),
        }
    }
}
