use image::imageops;
use image::{DynamicImage, Rgb, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::image_pipeline::adjust::apply_vibe_filter;
use crate::image_pipeline::loader::PhotoSource;
use crate::image_pipeline::palette::{outline_for, Palette};
use crate::image_pipeline::resize::{shrink_to_fit, solid_square};
use crate::layout::geometry::{PosterGeometry, Region};
use crate::layout::stickers::{self, render_badge};
use crate::layout::tracklist::{self, TrackEntry};
use crate::record::PetRecord;
use crate::text::block::{paint_coverage, render_line, Stroke, TextStyle};
use crate::text::fit::{fit, FitOutcome};
use crate::text::font::FontSet;
use crate::text::vertical::{render_side, Side, VerticalStrategy};
use crate::text::wrap::wrap;
use crate::PosterOptions;

const FRAME_ALPHA: u8 = 235;
const NOTES_SCALE: f32 = 0.8;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TitlePlacement {
    pub text: String,
    pub region: Region,
    pub font_size: u32,
    pub outcome: FitOutcome,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SidePlacement {
    pub text: String,
    pub side: Side,
    pub region: Region,
    pub font_size: u32,
    pub strategy: VerticalStrategy,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrackListPlacement {
    pub region: Region,
    pub columns: usize,
    pub body_size: u32,
    pub number_size: u32,
    pub outcome: FitOutcome,
    pub entries: Vec<TrackEntry>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BadgePlacement {
    pub text: String,
    pub region: Region,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotesPlacement {
    pub region: Region,
    pub font_size: u32,
    pub lines: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PaletteRecord {
    pub dominant: [u8; 3],
    pub background: [u8; 3],
    pub foreground: [u8; 3],
}

impl From<Palette> for PaletteRecord {
    fn from(palette: Palette) -> Self {
        Self {
            dominant: palette.dominant.0,
            background: palette.background.0,
            foreground: palette.foreground.0,
        }
    }
}

/// Where everything on a poster ended up.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PosterLayout {
    pub width: u32,
    pub height: u32,
    pub palette: PaletteRecord,
    pub title: TitlePlacement,
    pub photo: Region,
    pub photo_supplied: bool,
    pub rule: Region,
    pub artist_left: SidePlacement,
    pub artist_right: SidePlacement,
    pub tracklist: TrackListPlacement,
    pub badges: Vec<BadgePlacement>,
    pub liner_notes: Option<NotesPlacement>,
}

#[derive(Clone, Debug)]
pub struct ComposedPoster {
    pub canvas: RgbaImage,
    pub layout: PosterLayout,
}

fn rgba(color: Rgb<u8>) -> Rgba<u8> {
    let [r, g, b] = color.0;
    Rgba([r, g, b, 255])
}

/// Paints one poster; every step degrades instead of failing.
pub(crate) struct PosterComposer<'a> {
    options: &'a PosterOptions,
    fonts: &'a FontSet,
    geometry: PosterGeometry,
}

impl<'a> PosterComposer<'a> {
    pub(crate) fn new(options: &'a PosterOptions, fonts: &'a FontSet) -> Self {
        Self { options, fonts, geometry: PosterGeometry::for_width(options.width) }
    }

    pub(crate) fn compose(
        &self,
        record: &PetRecord,
        tracks: &[String],
        photo: &PhotoSource,
    ) -> ComposedPoster {
        let g = &self.geometry;
        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let (square, photo_supplied) = self.treated_photo(record, photo);
        let palette = Palette::from_image(&DynamicImage::ImageRgba8(square.clone()));
        let background = rgba(palette.background);
        let foreground = rgba(palette.foreground);
        debug!("palette {palette:?}");

        let mut canvas = RgbaImage::from_pixel(g.width, g.height, background);

        let title = self.draw_title(&mut canvas, &record.display_title(), palette.foreground);
        imageops::overlay(&mut canvas, &square, g.photo.x as i64, g.photo.y as i64);

        let rule = g.rule;
        let rule_rect = Rect::at(rule.x as i32, rule.y as i32).of_size(rule.width, rule.height);
        draw_filled_rect_mut(&mut canvas, rule_rect, foreground);

        let artist = record.display_artist();
        let title_size = title.font_size;
        let artist_left = self.draw_side(&mut canvas, &artist, foreground, title_size, Side::Left);
        let artist_right =
            self.draw_side(&mut canvas, &artist, foreground, title_size, Side::Right);

        let tracklist = self.draw_tracklist(&mut canvas, tracks, foreground, title_size);
        let track_end = tracklist.region.bottom();

        let badge_texts = record.badges(&mut rng);
        let badges = self.draw_badges(&mut canvas, &badge_texts, track_end, palette);

        let liner_notes = match record.liner_notes() {
            Some(notes) if self.options.liner_notes => {
                self.draw_notes(&mut canvas, notes, track_end, &badges, foreground)
            },
            _ => None,
        };

        self.draw_frame(&mut canvas, foreground);

        let layout = PosterLayout {
            width: g.width,
            height: g.height,
            palette: palette.into(),
            title,
            photo: g.photo,
            photo_supplied,
            rule,
            artist_left,
            artist_right,
            tracklist,
            badges,
            liner_notes,
        };
        ComposedPoster { canvas, layout }
    }

    /// Square photo with the vibe treatment, or a solid vibe colour.
    fn treated_photo(&self, record: &PetRecord, photo: &PhotoSource) -> (RgbaImage, bool) {
        let side = self.geometry.photo.width;
        let vibe = record.vibe();
        let fill = vibe.fallback_color();

        let (square, supplied) = match photo.load() {
            Some(image) => (self.options.photo_fit.apply(&image, side, fill), true),
            None => (solid_square(side, fill), false),
        };
        let treated = apply_vibe_filter(&DynamicImage::ImageRgba8(square), vibe, record.energy());
        (treated, supplied)
    }

    fn draw_title(&self, canvas: &mut RgbaImage, text: &str, fill: Rgb<u8>) -> TitlePlacement {
        let g = &self.geometry;
        let band = g.title_band;
        let fitted = fit(
            text,
            &self.fonts.title,
            band.width,
            band.height,
            g.title_start_size,
            g.title_min_size,
            g.title_tracking,
        );

        let stroke = Stroke {
            color: rgba(outline_for(fill)),
            width: PosterGeometry::stroke_width(fitted.size()),
        };
        let style =
            TextStyle { fill: rgba(fill), stroke: Some(stroke), tracking: g.title_tracking };
        let layer = shrink_to_fit(render_line(&fitted.font, text, &style), band.width, band.height);

        let x = band.x + (band.width - layer.width()) / 2;
        let y = band.bottom() - layer.height();
        imageops::overlay(canvas, &layer, x as i64, y as i64);

        TitlePlacement {
            text: text.to_owned(),
            region: Region::new(x, y, layer.width(), layer.height()),
            font_size: fitted.size(),
            outcome: fitted.outcome,
        }
    }

    fn draw_side(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        color: Rgba<u8>,
        title_size: u32,
        side: Side,
    ) -> SidePlacement {
        let band = match side {
            Side::Left => self.geometry.left_band,
            Side::Right => self.geometry.right_band,
        };
        let max_size = title_size.saturating_sub(4).min(self.geometry.side_font_cap).max(1);

        let rendered = render_side(text, &self.fonts.title, color, band.height, max_size, side)
            .shrink_into(band.width, band.height);
        let layer = &rendered.layer;
        let x = band.x + band.width.saturating_sub(layer.width()) / 2;
        imageops::overlay(canvas, layer, x as i64, band.y as i64);

        SidePlacement {
            text: text.to_owned(),
            side,
            region: Region::new(x, band.y, layer.width(), layer.height()),
            font_size: rendered.font_size,
            strategy: rendered.strategy,
        }
    }

    fn draw_tracklist(
        &self,
        canvas: &mut RgbaImage,
        tracks: &[String],
        color: Rgba<u8>,
        title_size: u32,
    ) -> TrackListPlacement {
        let area = self.geometry.track_area;
        let entries = TrackEntry::from_titles(tracks);
        let plan = tracklist::layout(
            &entries,
            area.width,
            area.height,
            &self.fonts.number,
            &self.fonts.body,
            title_size,
        );

        let height = tracklist::draw(canvas, &plan, (area.x, area.y), color);
        TrackListPlacement {
            region: Region::new(area.x, area.y, area.width, height),
            columns: plan.columns.len(),
            body_size: plan.body.size(),
            number_size: plan.number.size(),
            outcome: plan.outcome,
            entries,
        }
    }

    fn draw_badges(
        &self,
        canvas: &mut RgbaImage,
        texts: &[String],
        ceiling: u32,
        palette: Palette,
    ) -> Vec<BadgePlacement> {
        let g = &self.geometry;
        let font = self.fonts.body.at(g.badge_size);
        let layers: Vec<RgbaImage> = texts
            .iter()
            .map(|text| {
                let badge =
                    render_badge(text, &font, rgba(palette.foreground), rgba(palette.background));
                shrink_to_fit(badge, g.footer.width / 2, g.footer.height.max(1))
            })
            .collect();

        let sizes: Vec<(u32, u32)> = layers.iter().map(RgbaImage::dimensions).collect();
        stickers::place(&sizes, g.footer.right(), g.floor(), ceiling, g.badge_gap)
            .into_iter()
            .map(|placement| {
                let region = placement.region;
                let layer = &layers[placement.index];
                imageops::overlay(canvas, layer, region.x as i64, region.y as i64);
                BadgePlacement { text: texts[placement.index].clone(), region }
            })
            .collect()
    }

    /// Wraps notes into the strip under the track list, left of the badges.
    fn draw_notes(
        &self,
        canvas: &mut RgbaImage,
        notes: &str,
        track_end: u32,
        badges: &[BadgePlacement],
        color: Rgba<u8>,
    ) -> Option<NotesPlacement> {
        let g = &self.geometry;
        let top = track_end + g.badge_gap;
        let right = badges.iter().map(|badge| badge.region.x).min().unwrap_or(g.footer.right());
        let width = right.saturating_sub(g.footer.x + g.badge_gap);
        let height = g.floor().saturating_sub(top);

        let size = (g.badge_size as f32 * NOTES_SCALE).round() as u32;
        let font = self.fonts.body.at(size.max(8));
        let pitch = font.line_height().ceil() as u32;
        let room = (height / pitch.max(1)) as usize;
        if width == 0 || room == 0 {
            debug!("no room for liner notes");
            return None;
        }

        let mut lines = wrap(&font, notes, width);
        if lines.len() > room {
            debug!("dropping {} liner note line(s)", lines.len() - room);
            lines.truncate(room);
        }

        for (index, line) in lines.iter().enumerate() {
            let mask = font.rasterize(line, 0.0, 0);
            let y = top + index as u32 * pitch;
            paint_coverage(canvas, &mask, g.footer.x as i64, y as i64, color);
        }

        let used = lines.len() as u32 * pitch;
        let region = Region::new(g.footer.x, top, width, used);
        Some(NotesPlacement { region, font_size: font.size(), lines })
    }

    fn draw_frame(&self, canvas: &mut RgbaImage, color: Rgba<u8>) {
        let (width, height) = canvas.dimensions();
        let border = self.geometry.border.min(width / 2).min(height / 2);
        let ink = Rgba([color.0[0], color.0[1], color.0[2], FRAME_ALPHA]);

        let mut frame = RgbaImage::new(width, height);
        let strips = [
            Rect::at(0, 0).of_size(width, border),
            Rect::at(0, (height - border) as i32).of_size(width, border),
            Rect::at(0, border as i32).of_size(border, height - 2 * border),
            Rect::at((width - border) as i32, border as i32).of_size(border, height - 2 * border),
        ];
        for strip in strips {
            draw_filled_rect_mut(&mut frame, strip, ink);
        }
        imageops::overlay(canvas, &frame, 0, 0);
    }
}
