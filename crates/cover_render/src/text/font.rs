use std::convert::Infallible;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use ab_glyph::{point, Font, FontArc, ScaleFont};
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Point, Size};
use embedded_graphics::mono_font::iso_8859_1::{FONT_10X20, FONT_9X18_BOLD};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::text::{Baseline, Text};
use embedded_graphics::{Drawable, Pixel};
use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use log::{debug, warn};

/// Candidate font files per role, tried in order.
#[derive(Clone, Debug, Default)]
pub struct FontSources {
    pub title: Vec<PathBuf>,
    pub body: Vec<PathBuf>,
    pub number: Vec<PathBuf>,
}

impl FontSources {
    /// No candidates at all, every role uses the built-in faces.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Common locations of DejaVu and Liberation fonts on Linux hosts.
    pub fn system_defaults() -> Self {
        let dirs = ["/usr/share/fonts/truetype/dejavu", "/usr/share/fonts/TTF"];
        let join = |names: &[&str]| -> Vec<PathBuf> {
            dirs.iter()
                .flat_map(|dir| names.iter().map(move |name| PathBuf::from(dir).join(name)))
                .collect()
        };

        Self {
            title: join(&["DejaVuSans-Bold.ttf", "LiberationSans-Bold.ttf"]),
            body: join(&["DejaVuSans.ttf", "LiberationSans-Regular.ttf"]),
            number: join(&["DejaVuSans-Bold.ttf", "LiberationSans-Bold.ttf"]),
        }
    }

    pub fn resolve(&self) -> FontSet {
        FontSet {
            title: FontFace::load(&self.title, BuiltinFace::Bold),
            body: FontFace::load(&self.body, BuiltinFace::Regular),
            number: FontFace::load(&self.number, BuiltinFace::Bold),
        }
    }
}

/// Resolved faces for one render.
#[derive(Clone, Debug)]
pub struct FontSet {
    pub title: FontFace,
    pub body: FontFace,
    pub number: FontFace,
}

impl FontSet {
    pub fn builtin() -> Self {
        FontSources::builtin().resolve()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuiltinFace {
    Regular,
    Bold,
}

impl BuiltinFace {
    fn mono(self) -> &'static MonoFont<'static> {
        match self {
            BuiltinFace::Regular => &FONT_10X20,
            BuiltinFace::Bold => &FONT_9X18_BOLD,
        }
    }
}

/// A font family independent of size.
#[derive(Clone)]
pub enum FontFace {
    Outline(FontArc),
    Builtin(BuiltinFace),
}

impl fmt::Debug for FontFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontFace::Outline(_) => f.write_str("FontFace::Outline"),
            FontFace::Builtin(face) => write!(f, "FontFace::Builtin({face:?})"),
        }
    }
}

impl FontFace {
    /// First candidate that reads and parses, otherwise the built-in face.
    pub fn load(candidates: &[PathBuf], fallback: BuiltinFace) -> Self {
        for path in candidates {
            let bytes = match fs::read(path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    debug!("font candidate {} unavailable: {err}", path.display());
                    continue;
                },
            };

            match FontArc::try_from_vec(bytes) {
                Ok(font) => {
                    debug!("using font {}", path.display());
                    return FontFace::Outline(font);
                },
                Err(err) => warn!("failed to parse font {}: {err}", path.display()),
            }
        }

        if !candidates.is_empty() {
            warn!("no usable font among {} candidates, using built-in face", candidates.len());
        }
        FontFace::Builtin(fallback)
    }

    pub fn at(&self, size: u32) -> FontHandle {
        FontHandle { face: self.clone(), size: size.max(1) }
    }
}

/// A face at a concrete pixel size.
#[derive(Clone, Debug)]
pub struct FontHandle {
    face: FontFace,
    size: u32,
}

impl FontHandle {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn face(&self) -> &FontFace {
        &self.face
    }

    /// Distance from the top of the line box to the baseline.
    pub fn ascent(&self) -> f32 {
        match &self.face {
            FontFace::Outline(font) => font.as_scaled(self.size as f32).ascent(),
            FontFace::Builtin(face) => {
                let mono = face.mono();
                (mono.baseline + 1) as f32 * self.bitmap_scale()
            },
        }
    }

    /// Distance from the baseline to the bottom of the line box, positive.
    pub fn descent(&self) -> f32 {
        match &self.face {
            FontFace::Outline(font) => -font.as_scaled(self.size as f32).descent(),
            FontFace::Builtin(face) => {
                let mono = face.mono();
                (mono.character_size.height - (mono.baseline + 1)) as f32 * self.bitmap_scale()
            },
        }
    }

    pub fn line_height(&self) -> f32 {
        self.ascent() + self.descent()
    }

    /// Advance width of `text` including `tracking` between characters.
    pub fn measure(&self, text: &str, tracking: f32) -> f32 {
        let count = text.chars().count();
        if count == 0 {
            return 0.0;
        }
        let spacing = tracking * (count - 1) as f32;

        match &self.face {
            FontFace::Outline(font) => {
                let scaled = font.as_scaled(self.size as f32);
                let mut width = 0.0;
                let mut previous = None;
                for ch in text.chars() {
                    let id = scaled.glyph_id(ch);
                    if let Some(previous) = previous {
                        width += scaled.kern(previous, id);
                    }
                    width += scaled.h_advance(id);
                    previous = Some(id);
                }
                width + spacing
            },
            FontFace::Builtin(_) => count as f32 * self.bitmap_advance() + spacing,
        }
    }

    /// Coverage mask of `text` with `margin` empty pixels on every side.
    ///
    /// The baseline sits at `margin + ascent`.
    pub fn rasterize(&self, text: &str, tracking: f32, margin: u32) -> GrayImage {
        let width = self.measure(text, tracking).ceil().max(0.0) as u32 + 2 * margin;
        let height = self.line_height().ceil().max(1.0) as u32 + 2 * margin;
        let mut mask = GrayImage::new(width.max(1), height);

        match &self.face {
            FontFace::Outline(font) => {
                self.rasterize_outline(font, &mut mask, text, tracking, margin)
            },
            FontFace::Builtin(face) => {
                self.rasterize_bitmap(face.mono(), &mut mask, text, tracking, margin)
            },
        }

        mask
    }

    fn rasterize_outline(
        &self,
        font: &FontArc,
        mask: &mut GrayImage,
        text: &str,
        tracking: f32,
        margin: u32,
    ) {
        let scaled = font.as_scaled(self.size as f32);
        let baseline = margin as f32 + scaled.ascent();
        let (mask_width, mask_height) = mask.dimensions();
        let mut caret = margin as f32;
        let mut previous = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, id);
            }

            let glyph = id.with_scale_and_position(self.size as f32, point(caret, baseline));
            if let Some(outlined) = scaled.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|x, y, coverage| {
                    let px = bounds.min.x as i32 + x as i32;
                    let py = bounds.min.y as i32 + y as i32;
                    if px < 0 || py < 0 || px as u32 >= mask_width || py as u32 >= mask_height {
                        return;
                    }
                    let value = (coverage.clamp(0.0, 1.0) * 255.0).round() as u8;
                    let pixel = mask.get_pixel_mut(px as u32, py as u32);
                    pixel.0[0] = pixel.0[0].max(value);
                });
            }

            caret += scaled.h_advance(id) + tracking;
            previous = Some(id);
        }
    }

    fn rasterize_bitmap(
        &self,
        mono: &'static MonoFont<'static>,
        mask: &mut GrayImage,
        text: &str,
        tracking: f32,
        margin: u32,
    ) {
        let cell = mono.character_size;
        let glyph_width = self.bitmap_advance().round().max(1.0) as u32;
        let glyph_height = (cell.height as f32 * self.bitmap_scale()).round().max(1.0) as u32;
        let style = MonoTextStyle::new(mono, BinaryColor::On);
        let mut caret = margin as f32;
        let mut buf = [0u8; 4];

        for ch in text.chars() {
            let mut target = MaskTarget::new(cell);
            let glyph = ch.encode_utf8(&mut buf);
            // Drawing into an in-memory mask cannot fail.
            let label = Text::with_baseline(glyph, Point::zero(), style, Baseline::Top);
            let _ = label.draw(&mut target);

            let scaled =
                imageops::resize(&target.mask, glyph_width, glyph_height, FilterType::Triangle);
            let x = caret.round() as i64;
            for (gx, gy, pixel) in scaled.enumerate_pixels() {
                let px = x + gx as i64;
                let py = (margin + gy) as i64;
                if px < 0 || px >= mask.width() as i64 || py >= mask.height() as i64 {
                    continue;
                }
                let dst = mask.get_pixel_mut(px as u32, py as u32);
                dst.0[0] = dst.0[0].max(pixel.0[0]);
            }

            caret += self.bitmap_advance() + tracking;
        }
    }

    fn bitmap_scale(&self) -> f32 {
        match &self.face {
            FontFace::Builtin(face) => self.size as f32 / face.mono().character_size.height as f32,
            FontFace::Outline(_) => 1.0,
        }
    }

    fn bitmap_advance(&self) -> f32 {
        match &self.face {
            FontFace::Builtin(face) => {
                let mono = face.mono();
                (mono.character_size.width + mono.character_spacing) as f32 * self.bitmap_scale()
            },
            FontFace::Outline(_) => 0.0,
        }
    }
}

/// Single-glyph drawing surface for the built-in mono fonts.
struct MaskTarget {
    mask: GrayImage,
}

impl MaskTarget {
    fn new(size: Size) -> Self {
        Self { mask: GrayImage::new(size.width, size.height) }
    }
}

impl OriginDimensions for MaskTarget {
    fn size(&self) -> Size {
        Size::new(self.mask.width(), self.mask.height())
    }
}

impl DrawTarget for MaskTarget {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < self.mask.width() && y < self.mask.height() && color.is_on() {
                self.mask.put_pixel(x, y, Luma([255]));
            }
        }
        Ok(())
    }
}
