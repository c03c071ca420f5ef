mod compose;
mod image_pipeline;
mod layout;
mod output;
mod record;
mod text;

use std::io;
use std::path::PathBuf;

pub use compose::{
    BadgePlacement, ComposedPoster, NotesPlacement, PaletteRecord, PosterLayout, SidePlacement,
    TitlePlacement, TrackListPlacement,
};
pub use image_pipeline::{
    adjust::{apply_vibe_filter, FilterPreset},
    loader::PhotoSource,
    palette::{background_from, dominant_color, foreground_from, luminance, outline_for, Palette},
    resize::PhotoFit,
};
pub use layout::{
    geometry::{PosterGeometry, Region},
    stickers::{place as place_badges, Placement},
    tracklist::{TrackEntry, TrackListPlan},
};
pub use record::{Energy, PetRecord, Sneakiness, Vibe, Vocalness, WingmanActivity};
pub use text::{
    fit::{fit, search_sizes, FitOutcome, FitResult, SizeDecision},
    font::{BuiltinFace, FontFace, FontHandle, FontSet, FontSources},
    vertical::{choose_strategy, render_side, Side, VerticalStrategy, VerticalText},
};

use compose::PosterComposer;

#[derive(Debug, thiserror::Error)]
pub enum PosterError {
    #[error("render failed: could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("render failed: could not encode poster: {0}")]
    Encode(#[from] image::ImageError),
}

#[derive(Clone, Debug)]
pub struct PosterOptions {
    /// Canvas width in pixels; the height is always 1.25 times this.
    pub width: u32,
    /// JPEG quality, 1 to 100.
    pub jpeg_quality: u8,
    pub output_dir: PathBuf,
    pub fonts: FontSources,
    pub photo_fit: PhotoFit,
    /// Seed for badge phrase variants; `None` draws from entropy.
    pub seed: Option<u64>,
    /// Wrap the record's liner notes into the footer strip.
    pub liner_notes: bool,
}

impl Default for PosterOptions {
    fn default() -> Self {
        Self {
            width: 1080,
            jpeg_quality: 90,
            output_dir: PathBuf::from("generated"),
            fonts: FontSources::system_defaults(),
            photo_fit: PhotoFit::Cover,
            seed: None,
            liner_notes: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct RenderedPoster {
    pub path: PathBuf,
    pub layout: PosterLayout,
}

pub struct PosterRenderer {
    options: PosterOptions,
    fonts: FontSet,
}

impl PosterRenderer {
    pub fn new(options: PosterOptions) -> Self {
        let fonts = options.fonts.resolve();
        Self { options, fonts }
    }

    /// Lays out and paints the poster in memory.
    pub fn compose(
        &self,
        record: &PetRecord,
        tracks: &[String],
        photo: &PhotoSource,
    ) -> ComposedPoster {
        PosterComposer::new(&self.options, &self.fonts).compose(record, tracks, photo)
    }

    /// Composes the poster and writes it as a JPEG into the output directory.
    pub fn render(
        &self,
        record: &PetRecord,
        tracks: &[String],
        photo: &PhotoSource,
    ) -> Result<RenderedPoster, PosterError> {
        let ComposedPoster { canvas, layout } = self.compose(record, tracks, photo);
        let options = &self.options;
        let path = output::save_poster(&canvas, &options.output_dir, options.jpeg_quality)?;
        Ok(RenderedPoster { path, layout })
    }
}
