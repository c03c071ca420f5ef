use image::imageops;
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;
use log::warn;

use super::geometry::Region;
use crate::text::block::{render_line, TextStyle};
use crate::text::font::FontHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Index into the badge list, which is also its priority.
    pub index: usize,
    pub region: Region,
}

/// Stacks badges of the given sizes upward from `floor_y`, right-aligned on `right_edge`.
///
/// The first badge that would rise above `ceiling_y` is dropped together with
/// every lower-priority badge after it.
pub fn place(
    sizes: &[(u32, u32)],
    right_edge: u32,
    floor_y: u32,
    ceiling_y: u32,
    gap: u32,
) -> Vec<Placement> {
    let mut placements = Vec::with_capacity(sizes.len());
    let mut bottom = floor_y;

    for (index, &(width, height)) in sizes.iter().enumerate() {
        let top = bottom.checked_sub(height).filter(|top| *top >= ceiling_y);
        let Some(top) = top else {
            warn!("dropping {} badge(s) that do not fit above the track list", sizes.len() - index);
            break;
        };

        let width = width.min(right_edge);
        let region = Region::new(right_edge - width, top, width, height);
        placements.push(Placement { index, region });
        bottom = top.saturating_sub(gap);
    }

    placements
}

/// Renders a badge: text in `ink` on a `fill` plate with an `ink` rim.
pub fn render_badge(text: &str, font: &FontHandle, fill: Rgba<u8>, ink: Rgba<u8>) -> RgbaImage {
    let label = render_line(font, text, &TextStyle::plain(ink));
    let pad_x = (font.size() / 2).max(3);
    let pad_y = (font.size() / 3).max(2);
    let width = label.width() + 2 * pad_x;
    let height = label.height() + 2 * pad_y;

    let mut badge = RgbaImage::new(width, height);
    draw_filled_rect_mut(&mut badge, Rect::at(0, 0).of_size(width, height), fill);
    let rim = (font.size() / 12).max(1);
    for inset in 0..rim.min(width / 2).min(height / 2) {
        let rect =
            Rect::at(inset as i32, inset as i32).of_size(width - 2 * inset, height - 2 * inset);
        draw_hollow_rect_mut(&mut badge, rect, ink);
    }
    imageops::overlay(&mut badge, &label, pad_x as i64, pad_y as i64);
    badge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::{BuiltinFace, FontFace};

    #[test]
    fn stacks_upward_from_floor() {
        let placements = place(&[(100, 30), (80, 20)], 500, 400, 200, 10);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].region, Region::new(400, 370, 100, 30));
        assert_eq!(placements[1].region, Region::new(420, 340, 80, 20));
    }

    #[test]
    fn drops_badges_crossing_the_ceiling() {
        let placements = place(&[(100, 30), (80, 30)], 500, 400, 350, 10);
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].index, 0);

        assert!(place(&[(100, 60)], 500, 400, 350, 10).is_empty());
    }

    #[test]
    fn later_badges_are_dropped_after_an_overflow() {
        let placements = place(&[(10, 50), (10, 5)], 100, 40, 0, 2);
        assert!(placements.is_empty());
    }

    #[test]
    fn badge_has_plate_and_text() {
        let font = FontFace::Builtin(BuiltinFace::Regular).at(20);
        let fill = Rgba([250, 240, 200, 255]);
        let ink = Rgba([30, 30, 30, 255]);
        let badge = render_badge("Opera Diva", &font, fill, ink);

        assert_eq!(badge.get_pixel(0, 0), &ink);
        assert_eq!(badge.get_pixel(3, badge.height() / 2), &fill);
        assert!(badge.pixels().all(|pixel| pixel.0[3] == 255));
    }
}
