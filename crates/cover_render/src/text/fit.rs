use log::{debug, warn};
use serde::Serialize;

use super::font::{FontFace, FontHandle};

/// Extra vertical room reserved per pixel of font size for strokes and overshoot.
pub const HEIGHT_FUDGE: f32 = 0.1;

/// Final decision of a descending size search.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SizeDecision {
    /// Largest size that satisfied the constraints.
    Accept(u32),
    /// Nothing fit; the minimum size is used anyway.
    FallbackMin(u32),
}

impl SizeDecision {
    pub fn size(self) -> u32 {
        match self {
            SizeDecision::Accept(size) | SizeDecision::FallbackMin(size) => size,
        }
    }

    pub fn outcome(self) -> FitOutcome {
        match self {
            SizeDecision::Accept(_) => FitOutcome::Fitted,
            SizeDecision::FallbackMin(_) => FitOutcome::MinimumFallback,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum SearchState {
    Search(u32),
    Accept(u32),
    FallbackMin(u32),
}

/// Walks sizes from `start` down to `min` and accepts the first one `fits` allows.
///
/// `start` is raised to `min` when it is smaller, and both are at least 1.
pub fn search_sizes(start: u32, min: u32, mut fits: impl FnMut(u32) -> bool) -> SizeDecision {
    let min = min.max(1);
    let mut state = SearchState::Search(start.max(min));

    loop {
        state = match state {
            SearchState::Search(size) => {
                if fits(size) {
                    SearchState::Accept(size)
                } else if size > min {
                    SearchState::Search(size - 1)
                } else {
                    SearchState::FallbackMin(min)
                }
            },
            SearchState::Accept(size) => return SizeDecision::Accept(size),
            SearchState::FallbackMin(size) => return SizeDecision::FallbackMin(size),
        };
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FitOutcome {
    Fitted,
    MinimumFallback,
}

#[derive(Clone, Debug)]
pub struct FitResult {
    pub font: FontHandle,
    pub rendered_width: u32,
    pub rendered_height: u32,
    pub outcome: FitOutcome,
}

impl FitResult {
    pub fn size(&self) -> u32 {
        self.font.size()
    }
}

/// Height a line of text is assumed to occupy at `font`'s size.
pub fn estimated_height(font: &FontHandle) -> u32 {
    (font.line_height() + HEIGHT_FUDGE * font.size() as f32).ceil() as u32
}

pub fn rendered_width(font: &FontHandle, text: &str, tracking: f32) -> u32 {
    font.measure(text, tracking).ceil() as u32
}

/// Largest size in `[min_size, start_size]` at which `text` fits the box.
pub fn fit(
    text: &str,
    family: &FontFace,
    box_width: u32,
    box_height: u32,
    start_size: u32,
    min_size: u32,
    tracking: f32,
) -> FitResult {
    let decision = search_sizes(start_size, min_size, |size| {
        let font = family.at(size);
        rendered_width(&font, text, tracking) <= box_width && estimated_height(&font) <= box_height
    });

    let font = family.at(decision.size());
    let result = FitResult {
        rendered_width: rendered_width(&font, text, tracking),
        rendered_height: estimated_height(&font),
        outcome: decision.outcome(),
        font,
    };

    match result.outcome {
        FitOutcome::Fitted => {
            debug!("fit {:?} at {}px in {}x{}", text, result.size(), box_width, box_height)
        },
        FitOutcome::MinimumFallback => warn!(
            "{:?} does not fit {}x{} even at {}px ({}x{})",
            text,
            box_width,
            box_height,
            result.size(),
            result.rendered_width,
            result.rendered_height
        ),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::font::BuiltinFace;

    #[test]
    fn search_prefers_largest_feasible() {
        assert_eq!(search_sizes(40, 10, |size| size <= 23), SizeDecision::Accept(23));
        assert_eq!(search_sizes(40, 10, |_| true), SizeDecision::Accept(40));
        assert_eq!(search_sizes(40, 10, |_| false), SizeDecision::FallbackMin(10));
    }

    #[test]
    fn search_raises_start_to_min() {
        assert_eq!(search_sizes(5, 12, |_| true), SizeDecision::Accept(12));
        assert_eq!(search_sizes(0, 0, |_| false), SizeDecision::FallbackMin(1));
    }

    #[test]
    fn fitted_results_stay_inside_the_box() {
        let family = FontFace::Builtin(BuiltinFace::Bold);
        let texts = ["", "A", "SUNBEAM", "THE VERY LONG TITLE OF A DRAMATIC ALBUM", "MMMMMMMMMMMM"];
        let boxes = [(50, 20), (200, 60), (900, 180), (30, 300), (1000, 14)];

        for text in texts {
            for (width, height) in boxes {
                let result = fit(text, &family, width, height, 120, 12, 2.0);
                assert!((12..=120).contains(&result.size()));
                if result.size() != 12 {
                    assert_eq!(result.outcome, FitOutcome::Fitted);
                }
                if result.outcome == FitOutcome::Fitted {
                    assert!(result.rendered_width <= width, "{text} in {width}x{height}");
                    assert!(result.rendered_height <= height, "{text} in {width}x{height}");
                }
            }
        }
    }

    #[test]
    fn unfittable_text_falls_back_to_minimum() {
        let family = FontFace::Builtin(BuiltinFace::Regular);
        let result = fit("AN ABSURDLY LONG ALBUM TITLE", &family, 40, 200, 80, 16, 0.0);
        assert_eq!(result.outcome, FitOutcome::MinimumFallback);
        assert_eq!(result.size(), 16);
        assert!(result.rendered_width > 40);
    }
}
