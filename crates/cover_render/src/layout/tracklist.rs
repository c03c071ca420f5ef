use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use serde::Serialize;

use crate::text::block::paint_coverage;
use crate::text::fit::{search_sizes, FitOutcome};
use crate::text::font::{FontFace, FontHandle};

/// Lists this long are split into two columns.
pub const TWO_COLUMN_THRESHOLD: usize = 7;
pub const MIN_BODY_SIZE: u32 = 10;
pub const MIN_NUMBER_SIZE: u32 = 12;
const NUMBER_SCALE: f32 = 1.08;
const ROW_SPACING: f32 = 1.15;
const COLUMN_GAP: f32 = 0.05;
/// Widest possible ordinal prefix.
const PREFIX_PROBE: &str = "00. ";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TrackEntry {
    pub ordinal: u32,
    pub title: String,
}

impl TrackEntry {
    /// Numbers titles from 1 after cleaning them up; blank titles are skipped.
    pub fn from_titles<I, S>(titles: I) -> Vec<TrackEntry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        titles
            .into_iter()
            .map(|title| smart_title_case(strip_numbering(title.as_ref().trim())))
            .filter(|title| !title.is_empty())
            .enumerate()
            .map(|(index, title)| TrackEntry { ordinal: index as u32 + 1, title })
            .collect()
    }

    pub fn label(&self) -> String {
        format!("{:02}. ", self.ordinal)
    }
}

/// Drops a leading `"N. "`, `"N) "` or `"N - "` ordinal.
fn strip_numbering(title: &str) -> &str {
    let digits = title.len() - title.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return title;
    }

    let rest = &title[digits..];
    let stripped = if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        rest
    } else if let Some(rest) = rest.trim_start().strip_prefix('-') {
        rest
    } else {
        return title;
    };

    if !stripped.is_empty() && !stripped.starts_with(char::is_whitespace) {
        return title;
    }
    match stripped.trim() {
        "" => title,
        rest => rest,
    }
}

/// Upper-cases the first letter of every word and keeps the rest as typed.
fn smart_title_case(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut at_word_start = true;
    for ch in title.chars() {
        if at_word_start && ch.is_alphabetic() {
            out.extend(ch.to_uppercase());
            at_word_start = false;
        } else {
            out.push(ch);
            if ch.is_whitespace() {
                at_word_start = true;
            } else if ch.is_alphanumeric() {
                at_word_start = false;
            }
        }
    }
    out
}

#[derive(Clone, Debug)]
pub struct TrackListPlan {
    pub columns: Vec<Vec<TrackEntry>>,
    pub body: FontHandle,
    pub number: FontHandle,
    pub column_width: u32,
    pub column_gap: u32,
    pub prefix_width: u32,
    pub row_pitch: u32,
    pub block_height: u32,
    pub outcome: FitOutcome,
}

impl TrackListPlan {
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Vec::is_empty)
    }

    pub fn rows(&self) -> u32 {
        self.columns.iter().map(Vec::len).max().unwrap_or(0) as u32
    }
}

/// Size of the number font paired with a body size, kept below the title.
pub fn number_size(body_size: u32, title_size: u32) -> u32 {
    let size = ((body_size as f32 * NUMBER_SCALE).ceil() as u32).max(MIN_NUMBER_SIZE);
    clamp_below_title(size, title_size)
}

fn clamp_below_title(size: u32, title_size: u32) -> u32 {
    if size >= title_size {
        title_size.saturating_sub(2).max(1)
    } else {
        size
    }
}

fn row_pitch(body: &FontHandle, number: &FontHandle) -> u32 {
    (body.line_height().max(number.line_height()) * ROW_SPACING).ceil() as u32
}

/// Chooses columns and a shared body size so every row fits the area.
pub fn layout(
    tracks: &[TrackEntry],
    area_width: u32,
    area_height: u32,
    number_family: &FontFace,
    body_family: &FontFace,
    title_size: u32,
) -> TrackListPlan {
    let column_count = if tracks.len() >= TWO_COLUMN_THRESHOLD { 2 } else { 1 };
    let column_gap =
        if column_count == 2 { (area_width as f32 * COLUMN_GAP).round() as u32 } else { 0 };
    let column_width = area_width.saturating_sub(column_gap) / column_count as u32;

    let first = tracks.len().div_ceil(2);
    let columns = match column_count {
        2 => vec![tracks[..first].to_vec(), tracks[first..].to_vec()],
        _ if tracks.is_empty() => Vec::new(),
        _ => vec![tracks.to_vec()],
    };
    let rows = columns.iter().map(Vec::len).max().unwrap_or(0) as u32;

    let body_cap = title_size.saturating_sub(2).max(1);
    let fonts_at = |size: u32| {
        (body_family.at(size), number_family.at(number_size(size, title_size)))
    };

    let decision = search_sizes(body_cap, MIN_BODY_SIZE.min(body_cap), |size| {
        let (body, number) = fonts_at(size);
        let text_width = column_width as f32 - number.measure(PREFIX_PROBE, 0.0);
        let widest =
            tracks.iter().map(|track| body.measure(&track.title, 0.0)).fold(0.0, f32::max);
        widest <= text_width && rows * row_pitch(&body, &number) <= area_height
    });

    let (body, number) = fonts_at(decision.size());
    let pitch = row_pitch(&body, &number);
    let plan = TrackListPlan {
        prefix_width: number.measure(PREFIX_PROBE, 0.0).ceil() as u32,
        block_height: rows * pitch,
        row_pitch: pitch,
        outcome: decision.outcome(),
        columns,
        body,
        number,
        column_width,
        column_gap,
    };

    match plan.outcome {
        _ if tracks.is_empty() => debug!("empty track list"),
        FitOutcome::Fitted => debug!(
            "track list: {} tracks in {column_count} column(s) at {}px",
            tracks.len(),
            plan.body.size()
        ),
        FitOutcome::MinimumFallback => warn!(
            "track list of {} entries does not fit {area_width}x{area_height}, using {}px",
            tracks.len(),
            plan.body.size()
        ),
    }

    plan
}

/// Paints the planned rows with their top-left corner at `origin`.
///
/// Returns the height of the drawn block.
pub fn draw(
    canvas: &mut RgbaImage,
    plan: &TrackListPlan,
    origin: (u32, u32),
    color: Rgba<u8>,
) -> u32 {
    if plan.is_empty() {
        return 0;
    }

    let baseline = plan.body.ascent().max(plan.number.ascent());
    let text_width = plan.column_width.saturating_sub(plan.prefix_width).max(1);

    for (index, column) in plan.columns.iter().enumerate() {
        let x = origin.0 + index as u32 * (plan.column_width + plan.column_gap);
        for (row, track) in column.iter().enumerate() {
            let y = origin.1 + row as u32 * plan.row_pitch;

            let label = plan.number.rasterize(&track.label(), 0.0, 0);
            let label_y = y as f32 + baseline - plan.number.ascent();
            paint_coverage(canvas, &label, x as i64, label_y.round() as i64, color);

            let mut title = plan.body.rasterize(&track.title, 0.0, 0);
            if title.width() > text_width {
                let height =
                    (title.height() as u64 * text_width as u64 / title.width() as u64) as u32;
                title = imageops::resize(&title, text_width, height.max(1), FilterType::Triangle);
            }
            let title_y = y as f32 + baseline - plan.body.ascent();
            let title_x = (x + plan.prefix_width) as i64;
            paint_coverage(canvas, &title, title_x, title_y.round() as i64, color);
        }
    }

    plan.block_height
}
