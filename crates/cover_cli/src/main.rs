use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use cover_render::{FontSources, PetRecord, PhotoFit, PhotoSource, PosterOptions, PosterRenderer};
use indicatif::{ProgressBar, ProgressStyle};
use log::{Level, LevelFilter, Metadata, Record};
use serde::Deserialize;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render pet album cover posters")]
struct Cli {
    /// More log output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render one poster and print the written path
    Render(RenderArgs),
    /// Render every *.json job file found under a directory
    Batch(BatchArgs),
    /// Compute the layout without writing a file and print it as JSON
    Layout(LayoutArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    pet: PetArgs,
    /// Output directory for the JPEG
    #[arg(short, long, default_value = "generated")]
    out_dir: PathBuf,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory searched recursively for job files
    input: PathBuf,
    /// Output directory for the JPEGs
    #[arg(short, long, default_value = "generated")]
    out_dir: PathBuf,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    #[command(flatten)]
    pet: PetArgs,
    #[command(flatten)]
    settings: RenderSettings,
}

#[derive(Parser, Debug, Clone)]
struct PetArgs {
    /// Pet name, printed as the artist
    #[arg(long, default_value = "")]
    artist: String,
    /// Album title
    #[arg(long, default_value = "")]
    title: String,
    /// Regal, Goofball, Adventurer, Snuggler, Bossy or Wise Sage
    #[arg(long, default_value = "")]
    vibe: String,
    /// Chill, Balanced or Zoomies
    #[arg(long, default_value = "")]
    energy: String,
    /// Law-abiding, Occasional heist or Master thief
    #[arg(long, default_value = "")]
    sneakiness: String,
    /// Silent film star, Chatty or Opera
    #[arg(long, default_value = "")]
    vocalness: String,
    /// People-watching, Park meetups or Supervising from a distance
    #[arg(long, default_value = "")]
    wingman: String,
    /// The pet's artistic vision, shown with --liner-notes
    #[arg(long, default_value = "")]
    notes: String,
    /// Track title, repeat for every track
    #[arg(long = "track")]
    tracks: Vec<String>,
    /// Photo of the pet
    #[arg(long)]
    photo: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
struct RenderSettings {
    /// Canvas width in pixels
    #[arg(long, default_value_t = 1080)]
    width: u32,
    /// JPEG quality (1-100)
    #[arg(long, default_value_t = 90)]
    quality: u8,
    /// How the photo is squared
    #[arg(long, value_enum, default_value = "cover")]
    fit: FitChoice,
    /// Seed for badge phrase variants
    #[arg(long)]
    seed: Option<u64>,
    /// Print the liner notes below the track list
    #[arg(long, default_value_t = false)]
    liner_notes: bool,
    /// Font file tried first for the title and artist
    #[arg(long)]
    title_font: Option<PathBuf>,
    /// Font file tried first for track titles, badges and notes
    #[arg(long)]
    body_font: Option<PathBuf>,
    /// Font file tried first for track numbers
    #[arg(long)]
    number_font: Option<PathBuf>,
    /// Skip font discovery and use the built-in bitmap faces
    #[arg(long, default_value_t = false)]
    builtin_fonts: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FitChoice {
    Cover,
    Contain,
}

/// One batch job file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Job {
    pet: PetRecord,
    tracks: Vec<String>,
    /// Resolved against the job file's directory when relative.
    photo: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet)?;

    match cli.command {
        Commands::Render(args) => render(args),
        Commands::Batch(args) => batch(args),
        Commands::Layout(args) => layout(args),
    }
}

fn render(args: RenderArgs) -> Result<()> {
    let renderer = PosterRenderer::new(args.settings.to_options(&args.out_dir));
    let record = args.pet.to_record();
    let photo = PhotoSource::from_path(args.pet.photo.clone());

    let rendered = renderer
        .render(&record, &args.pet.tracks, &photo)
        .with_context(|| format!("failed to render poster for {:?}", record.display_artist()))?;

    println!("{}", rendered.path.display());
    Ok(())
}

fn layout(args: LayoutArgs) -> Result<()> {
    let renderer = PosterRenderer::new(args.settings.to_options(Path::new(".")));
    let record = args.pet.to_record();
    let photo = PhotoSource::from_path(args.pet.photo.clone());

    let composed = renderer.compose(&record, &args.pet.tracks, &photo);
    let json = serde_json::to_string_pretty(&composed.layout).context("failed to encode layout")?;
    println!("{json}");
    Ok(())
}

fn batch(args: BatchArgs) -> Result<()> {
    let jobs = find_jobs(&args.input)?;
    let renderer = PosterRenderer::new(args.settings.to_options(&args.out_dir));

    let progress = ProgressBar::new(jobs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template(
            "{spinner} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} posters {msg}",
        )
        .context("invalid progress template")?
        .progress_chars("=> "),
    );

    let mut failures = 0usize;
    for path in &jobs {
        progress.set_message(path.display().to_string());
        match run_job(&renderer, path) {
            Ok(output) => log::info!("{} -> {}", path.display(), output.display()),
            Err(err) => {
                failures += 1;
                progress.suspend(|| log::error!("{:#}", err));
            },
        }
        progress.inc(1);
    }

    progress.finish_with_message(format!("written to {:?}", args.out_dir));
    if failures > 0 {
        anyhow::bail!("{failures} of {} jobs failed", jobs.len());
    }
    Ok(())
}

fn find_jobs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut jobs: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.path().to_path_buf())
        .filter(|path| {
            let extension = path.extension().and_then(|ext| ext.to_str());
            extension.is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    jobs.sort();
    if jobs.is_empty() {
        anyhow::bail!("no job files found in {:?}", dir);
    }
    Ok(jobs)
}

fn run_job(renderer: &PosterRenderer, path: &Path) -> Result<PathBuf> {
    let raw = fs::read_to_string(path).with_context(|| format!("failed to read job {:?}", path))?;
    let job: Job =
        serde_json::from_str(&raw).with_context(|| format!("failed to parse job {:?}", path))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let photo = PhotoSource::from_path(job.photo.map(|photo| base.join(photo)));
    let rendered = renderer
        .render(&job.pet, &job.tracks, &photo)
        .with_context(|| format!("failed to render job {:?}", path))?;
    Ok(rendered.path)
}

impl PetArgs {
    fn to_record(&self) -> PetRecord {
        PetRecord {
            artist_name: self.artist.clone(),
            album_title: self.title.clone(),
            vibe: self.vibe.clone(),
            energy: self.energy.clone(),
            liner_notes: self.notes.clone(),
            wingman_activity: self.wingman.clone(),
            vocalness: self.vocalness.clone(),
            sneakiness: self.sneakiness.clone(),
        }
    }
}

impl RenderSettings {
    fn to_options(&self, out_dir: &Path) -> PosterOptions {
        let mut options = PosterOptions::default();
        options.width = self.width;
        options.jpeg_quality = self.quality.clamp(1, 100);
        options.output_dir = out_dir.to_path_buf();
        options.photo_fit = self.fit.to_fit();
        options.seed = self.seed;
        options.liner_notes = self.liner_notes;
        options.fonts = self.font_sources();
        options
    }

    fn font_sources(&self) -> FontSources {
        let mut sources = if self.builtin_fonts {
            FontSources::builtin()
        } else {
            FontSources::system_defaults()
        };
        let overrides = [
            (&mut sources.title, &self.title_font),
            (&mut sources.body, &self.body_font),
            (&mut sources.number, &self.number_font),
        ];
        for (candidates, path) in overrides {
            if let Some(path) = path {
                candidates.insert(0, path.clone());
            }
        }
        sources
    }
}

impl FitChoice {
    fn to_fit(self) -> PhotoFit {
        match self {
            FitChoice::Cover => PhotoFit::Cover,
            FitChoice::Contain => PhotoFit::Contain,
        }
    }
}

/// Plain stderr logger, one line per record.
struct StderrLogger {
    level: LevelFilter,
}

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let target = if record.level() >= Level::Debug { record.target() } else { "cover" };
        eprintln!("[{}] {}: {}", record.level(), target, record.args());
    }

    fn flush(&self) {}
}

fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    };

    log::set_boxed_logger(Box::new(StderrLogger { level })).context("logger already installed")?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_flag_skips_discovery_but_keeps_overrides() {
        let args = ["cover", "--builtin-fonts", "--title-font", "custom.ttf"];
        let settings = RenderSettings::try_parse_from(args).unwrap();
        let sources = settings.font_sources();
        assert_eq!(sources.title, vec![PathBuf::from("custom.ttf")]);
        assert!(sources.body.is_empty() && sources.number.is_empty());

        let settings = RenderSettings::try_parse_from(["cover", "--body-font", "b.ttf"]).unwrap();
        let sources = settings.font_sources();
        assert_eq!(sources.body[0], PathBuf::from("b.ttf"));
        assert!(sources.body.len() > 1);
        assert_eq!(sources.title, FontSources::system_defaults().title);
    }
}
