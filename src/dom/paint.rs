/// Minimal paint pipeline for the prototype rasterizer
///
/// Text runs are painted as dark glyph blocks on a white background. This is
/// enough for pixel-presence checks and golden comparisons; real glyph
/// rendering stays with the cdp backend.

use super::layout::{TextLayout, CHAR_WIDTH, LINE_HEIGHT, PADDING};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        rgba: (u8, u8, u8, u8),
    },
    TextRun {
        x: i32,
        y: i32,
        text: String,
    },
}

/// Build the paint command list for a laid-out text block
pub fn paint_layout(layout: &TextLayout) -> Vec<PaintCommand> {
    let mut commands = vec![PaintCommand::SolidRect {
        x: 0,
        y: 0,
        width: layout.rect.width,
        height: layout.rect.height,
        rgba: (255, 255, 255, 255),
    }];

    let mut y = PADDING as i32;
    for line in &layout.lines {
        commands.push(PaintCommand::TextRun {
            x: PADDING as i32,
            y,
            text: line.clone(),
        });
        y += LINE_HEIGHT as i32;
    }

    commands
}

/// Rasterize paint commands into an RGBA buffer of the given size
pub fn rasterize(commands: &[PaintCommand], width: u32, height: u32) -> Vec<u8> {
    let mut buf = vec![0u8; (width as usize) * (height as usize) * 4];

    for command in commands {
        match command {
            PaintCommand::SolidRect {
                x,
                y,
                width: w,
                height: h,
                rgba,
            } => fill_rect(&mut buf, width, height, *x, *y, *w, *h, *rgba),
            PaintCommand::TextRun { x, y, text } => {
                // One dark cell per visible character, inset so cells stay
                // distinguishable from their neighbors
                let mut cx = *x;
                for ch in text.chars() {
                    if !ch.is_whitespace() {
                        fill_rect(
                            &mut buf,
                            width,
                            height,
                            cx + 1,
                            *y + 1,
                            CHAR_WIDTH - 2,
                            LINE_HEIGHT - 2,
                            (0, 0, 0, 255),
                        );
                    }
                    cx += CHAR_WIDTH as i32;
                }
            }
        }
    }

    buf
}

fn fill_rect(
    buf: &mut [u8],
    buf_width: u32,
    buf_height: u32,
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    rgba: (u8, u8, u8, u8),
) {
    let x_end = (x + width as i32).min(buf_width as i32);
    let y_end = (y + height as i32).min(buf_height as i32);
    for py in y.max(0)..y_end {
        for px in x.max(0)..x_end {
            let idx = ((py as u32 * buf_width + px as u32) * 4) as usize;
            buf[idx] = rgba.0;
            buf[idx + 1] = rgba.1;
            buf[idx + 2] = rgba.2;
            buf[idx + 3] = rgba.3;
        }
    }
}

/// Encode an RGBA buffer as PNG bytes
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| Error::RasterizationFailure(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| Error::RasterizationFailure(format!("PNG data: {}", e)))?;
        writer
            .finish()
            .map_err(|e| Error::RasterizationFailure(format!("PNG finish: {}", e)))?;
    }
    Ok(out)
}
