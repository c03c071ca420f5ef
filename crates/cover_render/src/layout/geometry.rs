use serde::Serialize;

/// Reference width the fixed pixel amounts are tuned for.
pub const REFERENCE_WIDTH: u32 = 1080;
pub const MIN_WIDTH: u32 = 240;
pub const ASPECT: f32 = 1.25;

const BORDER: f32 = 0.018;
const TITLE_INSET: f32 = 0.03;
const SIDE_MARGIN: f32 = 0.13;
const TOP_MARGIN: f32 = 0.04;
const BOTTOM_MARGIN: f32 = 0.04;
const PHOTO_TOP: f32 = 0.19;
const TITLE_GAP: f32 = 0.006;
const RULE_GAP: f32 = 0.01;
const RULE_THICKNESS: f32 = 0.003;
const TRACK_GAP: f32 = 0.012;
const FOOTER: f32 = 0.055;
const BADGE_GAP: f32 = 0.005;
const BADGE_SIZE: f32 = 0.018;
const TITLE_MAX_SIZE: f32 = 0.16;
const TITLE_MIN_SIZE: f32 = 0.03;
const TITLE_TRACKING: f32 = 2.0;
/// Font size per pixel of side margin; capitals at this size roughly fill the margin.
const SIDE_FONT_PER_PIXEL: f32 = 1.4;

/// Axis-aligned pixel rectangle on the poster.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the half-open vertical spans of both regions overlap.
    pub fn overlaps_vertically(&self, other: &Region) -> bool {
        !self.is_empty() && !other.is_empty() && self.y < other.bottom() && other.y < self.bottom()
    }

    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }
}

/// Resolution-independent poster bands resolved for one canvas width.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PosterGeometry {
    pub width: u32,
    pub height: u32,
    pub border: u32,
    pub title_band: Region,
    pub photo: Region,
    pub rule: Region,
    pub left_band: Region,
    pub right_band: Region,
    pub track_area: Region,
    pub footer: Region,
    pub title_start_size: u32,
    pub title_min_size: u32,
    pub title_tracking: f32,
    pub side_font_cap: u32,
    pub badge_size: u32,
    pub badge_gap: u32,
}

impl PosterGeometry {
    pub fn for_width(width: u32) -> Self {
        let width = width.max(MIN_WIDTH);
        let height = (width as f32 * ASPECT).round() as u32;
        let w = |fraction: f32| (width as f32 * fraction).round() as u32;
        let h = |fraction: f32| (height as f32 * fraction).round() as u32;

        let border = w(BORDER).max(2);
        let floor = height - h(BOTTOM_MARGIN);

        let side = w(SIDE_MARGIN);
        let photo = Region::new(side, h(PHOTO_TOP), width - 2 * side, width - 2 * side);

        let title_x = border + w(TITLE_INSET);
        let title_top = h(TOP_MARGIN);
        let title_height = photo.y - h(TITLE_GAP) - title_top;
        let title_band = Region::new(title_x, title_top, width - 2 * title_x, title_height);

        let rule_y = photo.bottom() + h(RULE_GAP);
        let rule = Region::new(photo.x, rule_y, photo.width, w(RULE_THICKNESS).max(2));

        let footer_top = floor - h(FOOTER);
        let footer = Region::new(photo.x, footer_top, photo.width, floor - footer_top);
        let track_top = rule.bottom() + h(TRACK_GAP);
        let track_area =
            Region::new(photo.x, track_top, photo.width, footer_top.saturating_sub(track_top));

        let left_band = Region::new(border, photo.y, photo.x - border, floor - photo.y);
        let right_x = photo.right();
        let right_band = Region::new(right_x, photo.y, width - border - right_x, floor - photo.y);

        let title_min_size = w(TITLE_MIN_SIZE).max(12);
        Self {
            width,
            height,
            border,
            title_band,
            photo,
            rule,
            left_band,
            right_band,
            track_area,
            footer,
            title_start_size: title_band.height.min(w(TITLE_MAX_SIZE)).max(title_min_size),
            title_min_size,
            title_tracking: TITLE_TRACKING * width as f32 / REFERENCE_WIDTH as f32,
            side_font_cap: ((left_band.width as f32 * SIDE_FONT_PER_PIXEL).round() as u32).max(8),
            badge_size: w(BADGE_SIZE).max(10),
            badge_gap: h(BADGE_GAP).max(2),
        }
    }

    /// Bottom margin line every footer element rests on.
    pub fn floor(&self) -> u32 {
        self.footer.bottom()
    }

    /// Outline thickness for a title rendered at `size`.
    pub fn stroke_width(size: u32) -> u32 {
        (size / 24).max(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_is_four_by_five() {
        for width in [240, 541, 1080, 2160] {
            let geometry = PosterGeometry::for_width(width);
            assert_eq!(geometry.height, (width as f32 * 1.25).round() as u32);
        }
        assert_eq!(PosterGeometry::for_width(10).width, MIN_WIDTH);
    }

    #[test]
    fn bands_are_stacked_top_to_bottom() {
        for width in [240, 800, 1080, 1600, 2160] {
            let g = PosterGeometry::for_width(width);
            let canvas = Region::new(0, 0, g.width, g.height);

            assert!(g.title_band.bottom() < g.photo.y);
            assert!(g.photo.bottom() <= g.rule.y);
            assert!(g.rule.bottom() <= g.track_area.y);
            assert_eq!(g.track_area.bottom(), g.footer.y, "width {width}");
            assert_eq!(g.footer.bottom(), g.floor());
            assert!(g.footer.height > 0);
            assert!(!g.track_area.is_empty(), "width {width}");
            assert!(!g.title_band.overlaps_vertically(&g.photo));
            assert!(!g.photo.overlaps_vertically(&g.track_area));

            for region in [g.title_band, g.photo, g.rule, g.track_area, g.footer] {
                assert!(canvas.contains(&region));
            }
            assert!(g.left_band.right() <= g.photo.x);
            assert!(g.right_band.x >= g.photo.right());
            assert!(g.right_band.right() + g.border <= g.width);
        }
    }

    #[test]
    fn reference_sizes() {
        let g = PosterGeometry::for_width(1080);
        assert_eq!(g.photo.width, g.photo.height);
        assert_eq!(g.title_min_size, 32);
        assert!(g.title_start_size <= g.title_band.height);
        assert!((g.title_tracking - 2.0).abs() < f32::EPSILON);
        assert_eq!(PosterGeometry::stroke_width(24), 2);
        assert_eq!(PosterGeometry::stroke_width(120), 5);
    }

    #[test]
    fn vertical_overlap() {
        let a = Region::new(0, 0, 10, 10);
        assert!(a.overlaps_vertically(&Region::new(50, 9, 5, 5)));
        assert!(!a.overlaps_vertically(&Region::new(0, 10, 5, 5)));
        assert!(!a.overlaps_vertically(&Region::default()));
    }
}
