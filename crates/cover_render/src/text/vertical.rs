use image::imageops;
use image::{Rgba, RgbaImage};
use log::debug;
use serde::Serialize;

use super::block::{render_line, TextStyle};
use super::fit::search_sizes;
use super::font::FontFace;
use crate::image_pipeline::resize::shrink_to_fit;

/// Rotated text shrunk harder than this is considered illegible.
pub const MIN_ROTATE_SCALE: f32 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Reads bottom to top.
    Left,
    /// Reads top to bottom.
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum VerticalStrategy {
    Rotate { scale: f32 },
    Stack,
}

/// Picks rotation when the rotated run needs at most a mild downscale.
pub fn choose_strategy(long_side: u32, allowed_height: u32) -> VerticalStrategy {
    if long_side <= allowed_height {
        return VerticalStrategy::Rotate { scale: 1.0 };
    }

    let scale = allowed_height as f32 / long_side as f32;
    if scale < MIN_ROTATE_SCALE {
        VerticalStrategy::Stack
    } else {
        VerticalStrategy::Rotate { scale }
    }
}

#[derive(Clone, Debug)]
pub struct VerticalText {
    pub layer: RgbaImage,
    pub strategy: VerticalStrategy,
    /// Size the glyphs end up at after any downscale.
    pub font_size: u32,
}

impl VerticalText {
    /// Downscales the layer into `max_width x max_height`, keeping `font_size` in step.
    pub fn shrink_into(self, max_width: u32, max_height: u32) -> Self {
        let before = self.layer.height();
        let layer = shrink_to_fit(self.layer, max_width.max(1), max_height.max(1));
        let mut font_size = self.font_size;
        if layer.height() < before && font_size > 0 {
            let ratio = layer.height() as f32 / before as f32;
            font_size = ((font_size as f32 * ratio).round() as u32).max(1);
        }
        Self { layer, font_size, ..self }
    }
}

/// Renders `text` for a side margin, never taller than `allowed_height`.
pub fn render_side(
    text: &str,
    family: &FontFace,
    color: Rgba<u8>,
    allowed_height: u32,
    max_font_size: u32,
    side: Side,
) -> VerticalText {
    let allowed_height = allowed_height.max(1);
    if text.trim().is_empty() {
        let strategy = VerticalStrategy::Rotate { scale: 1.0 };
        return VerticalText { layer: RgbaImage::new(1, 1), strategy, font_size: 0 };
    }

    let style = TextStyle::plain(color);
    let line = render_line(&family.at(max_font_size), text, &style);
    let strategy = choose_strategy(line.width(), allowed_height);
    debug!("{side:?} side text {text:?}: {strategy:?}");

    let (layer, font_size) = match strategy {
        VerticalStrategy::Rotate { .. } => {
            let rotated = match side {
                Side::Left => imageops::rotate270(&line),
                Side::Right => imageops::rotate90(&line),
            };
            (rotated, max_font_size.max(1))
        },
        VerticalStrategy::Stack => stack(text, family, &style, allowed_height, max_font_size),
    };

    let width = layer.width();
    VerticalText { layer, strategy, font_size }.shrink_into(width, allowed_height)
}

/// One character per row; whitespace leaves its row empty.
fn stack(
    text: &str,
    family: &FontFace,
    style: &TextStyle,
    allowed_height: u32,
    max_font_size: u32,
) -> (RgbaImage, u32) {
    let chars: Vec<char> = text.chars().collect();
    let rows = chars.len() as u32;
    let row_height = |size: u32| family.at(size).line_height().ceil() as u32;
    let fits = |size: u32| row_height(size) * rows <= allowed_height;
    let size = search_sizes(max_font_size, 1, fits).size();

    let font = family.at(size);
    let pitch = row_height(size).max(1);
    let glyphs: Vec<Option<RgbaImage>> = chars
        .iter()
        .map(|ch| (!ch.is_whitespace()).then(|| render_line(&font, &ch.to_string(), style)))
        .collect();

    let width = glyphs.iter().flatten().map(RgbaImage::width).max().unwrap_or(1);
    let mut column = RgbaImage::new(width, pitch * rows);
    for (row, glyph) in glyphs.iter().enumerate() {
        let Some(glyph) = glyph else { continue };
        let x = (width - glyph.width()) / 2;
        let y = row as u32 * pitch + pitch.saturating_sub(glyph.height()) / 2;
        imageops::overlay(&mut column, glyph, x as i64, y as i64);
    }

    (column, size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::BuiltinFace;

    const INK: Rgba<u8> = Rgba([20, 20, 20, 255]);

    fn face() -> FontFace {
        FontFace::Builtin(BuiltinFace::Bold)
    }

    #[test]
    fn strategy_thresholds() {
        assert_eq!(choose_strategy(100, 200), VerticalStrategy::Rotate { scale: 1.0 });
        assert_eq!(choose_strategy(200, 150), VerticalStrategy::Rotate { scale: 0.75 });
        assert_eq!(choose_strategy(200, 100), VerticalStrategy::Stack);
    }

    #[test]
    fn layers_never_exceed_allowed_height() {
        let alphabet = "ABCDEFGHIJKLMNOPQRSTUVWXYZ ABCDEFGHIJKLM";
        for len in 1..=40 {
            let text: String = alphabet.chars().take(len).collect();
            for side in [Side::Left, Side::Right] {
                let rendered = render_side(&text, &face(), INK, 500, 60, side);
                assert!(rendered.layer.height() <= 501, "{len} chars: {}", rendered.layer.height());
            }
        }
    }

    #[test]
    fn short_text_rotates_at_full_size() {
        let rendered = render_side("REX", &face(), INK, 800, 48, Side::Left);
        assert_eq!(rendered.strategy, VerticalStrategy::Rotate { scale: 1.0 });
        assert_eq!(rendered.font_size, 48);
        assert!(rendered.layer.height() > rendered.layer.width());
    }

    #[test]
    fn downscaled_rotation_reports_effective_size() {
        let rendered = render_side("ABCDEF", &face(), INK, 100, 40, Side::Left);
        let VerticalStrategy::Rotate { scale } = rendered.strategy else {
            panic!("expected rotation, got {:?}", rendered.strategy);
        };
        assert!(scale < 1.0);
        assert!(rendered.layer.height() <= 100);
        assert!(rendered.font_size < 40 && rendered.font_size >= 24, "{}", rendered.font_size);
    }

    #[test]
    fn long_text_stacks() {
        let text = "SIR REGINALD FLUFFINGTON III";
        let rendered = render_side(text, &face(), INK, 400, 72, Side::Right);
        assert_eq!(rendered.strategy, VerticalStrategy::Stack);
        assert!(rendered.font_size < 72);
        assert!(rendered.layer.height() <= 400);
    }

    #[test]
    fn sides_mirror_each_other() {
        let left = render_side("AB", &face(), INK, 800, 40, Side::Left).layer;
        let right = render_side("AB", &face(), INK, 800, 40, Side::Right).layer;
        assert_eq!(left.dimensions(), right.dimensions());
        assert_eq!(imageops::rotate180(&left), right);
    }

    #[test]
    fn blank_text_is_a_single_pixel() {
        let rendered = render_side("   ", &face(), INK, 300, 40, Side::Left);
        assert_eq!(rendered.layer.dimensions(), (1, 1));
    }
}
