use image::imageops;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use log::{debug, warn};

use super::font::FontHandle;

/// Content closer than this to a layer edge is treated as clipped.
const EDGE_MARGIN: u32 = 2;
const MAX_REGROW: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Stroke {
    pub color: Rgba<u8>,
    pub width: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub fill: Rgba<u8>,
    pub stroke: Option<Stroke>,
    pub tracking: f32,
}

impl TextStyle {
    pub fn plain(fill: Rgba<u8>) -> Self {
        Self { fill, stroke: None, tracking: 0.0 }
    }
}

/// Inclusive pixel bounds of a layer's visible content.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl ContentBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    fn near_edge(&self, width: u32, height: u32, margin: u32) -> bool {
        self.min_x < margin
            || self.min_y < margin
            || self.max_x + margin >= width
            || self.max_y + margin >= height
    }
}

/// Bounds of every pixel with non-zero alpha.
pub fn content_bounds(layer: &RgbaImage) -> Option<ContentBounds> {
    let mut bounds: Option<ContentBounds> = None;
    for (x, y, pixel) in layer.enumerate_pixels() {
        if pixel.0[3] == 0 {
            continue;
        }
        bounds = Some(match bounds {
            None => ContentBounds { min_x: x, min_y: y, max_x: x, max_y: y },
            Some(b) => ContentBounds {
                min_x: b.min_x.min(x),
                min_y: b.min_y.min(y),
                max_x: b.max_x.max(x),
                max_y: b.max_y.max(y),
            },
        });
    }
    bounds
}

/// Renders one line of text onto a transparent layer cropped to its visible pixels.
///
/// The drawing margin is doubled whenever ink lands within a couple of pixels of
/// the layer edge, so strokes and overhanging glyphs are never cut off.
pub fn render_line(font: &FontHandle, text: &str, style: &TextStyle) -> RgbaImage {
    let stroke_width = style.stroke.map_or(0, |stroke| stroke.width);
    render_from_margin(font, text, style, stroke_width + EDGE_MARGIN + 1).0
}

/// Draws starting at `margin` and returns the cropped layer with the number of regrows.
fn render_from_margin(
    font: &FontHandle,
    text: &str,
    style: &TextStyle,
    mut margin: u32,
) -> (RgbaImage, u32) {
    let mut regrown = 0;

    loop {
        let layer = draw_padded(font, text, style, margin);
        let Some(bounds) = content_bounds(&layer) else {
            return (RgbaImage::new(1, 1), regrown);
        };

        let clipped = bounds.near_edge(layer.width(), layer.height(), EDGE_MARGIN);
        if clipped && regrown < MAX_REGROW {
            debug!("text {text:?} touches layer edge at margin {margin}, regrowing");
            margin = (margin * 2).max(EDGE_MARGIN);
            regrown += 1;
            continue;
        }
        if clipped {
            warn!("text {text:?} still touches layer edge at margin {margin}");
        }

        let (x, y) = (bounds.min_x, bounds.min_y);
        let cropped = imageops::crop_imm(&layer, x, y, bounds.width(), bounds.height());
        return (cropped.to_image(), regrown);
    }
}

fn draw_padded(font: &FontHandle, text: &str, style: &TextStyle, margin: u32) -> RgbaImage {
    let coverage = font.rasterize(text, style.tracking, margin);
    let stroke = style.stroke.filter(|stroke| stroke.width > 0).map(|stroke| {
        let solid = binarize(&coverage);
        (stroke.color, dilate(&solid, Norm::LInf, stroke.width.min(u8::MAX as u32) as u8))
    });

    let mut layer = RgbaImage::new(coverage.width(), coverage.height());
    for (x, y, pixel) in layer.enumerate_pixels_mut() {
        let fill_alpha = coverage.get_pixel(x, y).0[0];
        let stroke_alpha = stroke.as_ref().map_or(0, |(_, mask)| mask.get_pixel(x, y).0[0]);

        *pixel = match &stroke {
            Some((color, _)) if stroke_alpha > 0 => {
                let t = fill_alpha as f32 / 255.0;
                let mix = |i: usize| {
                    (style.fill.0[i] as f32 * t + color.0[i] as f32 * (1.0 - t)).round() as u8
                };
                Rgba([mix(0), mix(1), mix(2), stroke_alpha.max(fill_alpha)])
            },
            _ => Rgba([style.fill.0[0], style.fill.0[1], style.fill.0[2], fill_alpha]),
        };
    }
    layer
}

/// Blends `color` onto `canvas` through a coverage mask placed at `(x, y)`.
pub fn paint_coverage(canvas: &mut RgbaImage, mask: &GrayImage, x: i64, y: i64, color: Rgba<u8>) {
    let (width, height) = (canvas.width() as i64, canvas.height() as i64);
    for (mx, my, coverage) in mask.enumerate_pixels() {
        let (px, py) = (x + mx as i64, y + my as i64);
        if coverage.0[0] == 0 || px < 0 || py < 0 || px >= width || py >= height {
            continue;
        }

        let alpha = coverage.0[0] as f32 / 255.0 * color.0[3] as f32 / 255.0;
        let dst = canvas.get_pixel_mut(px as u32, py as u32);
        for channel in 0..3 {
            let blended = color.0[channel] as f32 * alpha + dst.0[channel] as f32 * (1.0 - alpha);
            dst.0[channel] = blended.round() as u8;
        }
        dst.0[3] = dst.0[3].max((alpha * 255.0).round() as u8);
    }
}

fn binarize(coverage: &GrayImage) -> GrayImage {
    GrayImage::from_fn(coverage.width(), coverage.height(), |x, y| {
        Luma([if coverage.get_pixel(x, y).0[0] > 0 { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::{BuiltinFace, FontFace};

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn layer_is_cropped_to_content() {
        let font = FontFace::Builtin(BuiltinFace::Bold).at(36);
        let layer = render_line(&font, "HELLO", &TextStyle::plain(WHITE));
        let bounds = content_bounds(&layer).unwrap();
        assert_eq!((bounds.min_x, bounds.min_y), (0, 0));
        assert_eq!((bounds.width(), bounds.height()), layer.dimensions());
    }

    #[test]
    fn stroke_widens_the_layer() {
        let font = FontFace::Builtin(BuiltinFace::Bold).at(36);
        let plain = render_line(&font, "HELLO", &TextStyle::plain(WHITE));
        let stroke = Some(Stroke { color: BLACK, width: 3 });
        let style = TextStyle { stroke, ..TextStyle::plain(WHITE) };
        let stroked = render_line(&font, "HELLO", &style);

        assert_eq!(stroked.width(), plain.width() + 6);
        assert_eq!(stroked.height(), plain.height() + 6);
        assert_eq!(stroked.get_pixel(0, stroked.height() / 2).0[..3], [0, 0, 0]);
    }

    #[test]
    fn clipped_stroke_is_redrawn_with_more_room() {
        let font = FontFace::Builtin(BuiltinFace::Bold).at(36);
        let stroke = Some(Stroke { color: BLACK, width: 6 });
        let style = TextStyle { stroke, ..TextStyle::plain(WHITE) };

        let (tight, regrown) = render_from_margin(&font, "HELLO", &style, 0);
        assert!(regrown >= 1);
        assert_eq!(tight, render_line(&font, "HELLO", &style));
        assert_eq!(tight.get_pixel(0, tight.height() / 2).0, BLACK.0);
    }

    #[test]
    fn near_edge_checks_every_side() {
        let inner = ContentBounds { min_x: 4, min_y: 4, max_x: 5, max_y: 5 };
        for margin in [1, 2] {
            assert!(!inner.near_edge(10, 10, margin));

            let left = ContentBounds { min_x: margin - 1, ..inner };
            let top = ContentBounds { min_y: margin - 1, ..inner };
            let right = ContentBounds { max_x: 10 - margin, ..inner };
            let bottom = ContentBounds { max_y: 10 - margin, ..inner };
            for bounds in [left, top, right, bottom] {
                assert!(bounds.near_edge(10, 10, margin), "{bounds:?} at {margin}");
            }

            let clear = ContentBounds {
                min_x: margin,
                min_y: margin,
                max_x: 9 - margin,
                max_y: 9 - margin,
            };
            assert!(!clear.near_edge(10, 10, margin));
        }
    }

    #[test]
    fn empty_text_yields_blank_pixel() {
        let font = FontFace::Builtin(BuiltinFace::Regular).at(20);
        let layer = render_line(&font, "", &TextStyle::plain(WHITE));
        assert_eq!(layer.dimensions(), (1, 1));
        assert_eq!(layer.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn bounds_ignore_transparent_pixels() {
        let mut layer = RgbaImage::new(10, 10);
        layer.put_pixel(3, 4, WHITE);
        layer.put_pixel(6, 8, WHITE);
        let bounds = content_bounds(&layer).unwrap();
        assert_eq!(bounds, ContentBounds { min_x: 3, min_y: 4, max_x: 6, max_y: 8 });
        assert!(content_bounds(&RgbaImage::new(4, 4)).is_none());
    }
}
