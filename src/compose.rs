// Image composition: draws a line of text onto a template image and writes
// the result to disk. The written file still has to be hosted somewhere
// public before its URL can be posted.

use ab_glyph::{FontVec, PxScale};
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_text_mut;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::ComposeConfig;
use crate::error::ComposeError;

pub const DEFAULT_OUTPUT: &str = "output/edited_image.png";

/// Overlay `text` on the configured template and save it to `output`.
/// Missing parent directories are created.
pub fn compose_post_image(
    text: &str,
    config: &ComposeConfig,
    output: &Path,
) -> Result<PathBuf, ComposeError> {
    let template = config
        .template_image
        .as_ref()
        .ok_or(ComposeError::MissingSetting("compose.template_image"))?;
    let font_path = config
        .font
        .as_ref()
        .ok_or(ComposeError::MissingSetting("compose.font"))?;
    let color = parse_color(&config.text_color)?;

    let mut canvas: RgbaImage = image::open(template)?.to_rgba8();
    let font = FontVec::try_from_vec(std::fs::read(font_path)?)
        .map_err(|e| ComposeError::Font(e.to_string()))?;

    draw_text_mut(
        &mut canvas,
        color,
        config.text_x,
        config.text_y,
        PxScale::from(config.font_size),
        &font,
        text,
    );

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    save(canvas, output)?;
    info!(path = %output.display(), "Post image written");
    Ok(output.to_path_buf())
}

// JPEG has no alpha channel.
fn save(canvas: RgbaImage, output: &Path) -> Result<(), ComposeError> {
    let is_jpeg = output
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false);
    if is_jpeg {
        DynamicImage::ImageRgba8(canvas).to_rgb8().save(output)?;
    } else {
        canvas.save(output)?;
    }
    Ok(())
}

/// Parse `#rrggbb` (the `#` is optional) into an opaque color.
pub fn parse_color(value: &str) -> Result<Rgba<u8>, ComposeError> {
    let hex = value.trim().trim_start_matches('#');
    let invalid = || ComposeError::InvalidColor(value.to_string());
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok(Rgba([channel(0)?, channel(2)?, channel(4)?, 255]))
}
