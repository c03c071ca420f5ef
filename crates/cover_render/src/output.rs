use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use log::debug;
use rand::Rng;

use crate::PosterError;

/// `album_<unix-millis>_<8 hex>.jpg`
pub fn unique_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let millis =
        SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |elapsed| elapsed.as_millis());
    format!("album_{millis}_{:08x}.jpg", rng.gen::<u32>())
}

/// Encodes the canvas as an RGB JPEG.
pub fn encode_jpeg(canvas: &RgbaImage, quality: u8) -> Result<Vec<u8>, PosterError> {
    let rgb = DynamicImage::ImageRgba8(canvas.clone()).into_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100)).encode_image(&rgb)?;
    Ok(bytes)
}

/// Writes `bytes` to `dir/name` through a temporary file renamed into place.
pub fn write_atomic(dir: &Path, name: &str, bytes: &[u8]) -> Result<PathBuf, PosterError> {
    let write_error = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| PosterError::Write { path, source }
    };

    fs::create_dir_all(dir).map_err(write_error(dir))?;
    let target = dir.join(name);
    let staging = dir.join(format!(".{name}.part"));

    fs::write(&staging, bytes).map_err(write_error(&staging))?;
    if let Err(source) = fs::rename(&staging, &target) {
        let _ = fs::remove_file(&staging);
        return Err(PosterError::Write { path: target, source });
    }

    debug!("wrote {} bytes to {}", bytes.len(), target.display());
    Ok(target)
}

/// Encodes and stores a finished poster under a fresh unique name.
pub fn save_poster(canvas: &RgbaImage, dir: &Path, quality: u8) -> Result<PathBuf, PosterError> {
    let bytes = encode_jpeg(canvas, quality)?;
    let name = unique_name(&mut rand::thread_rng());
    write_atomic(dir, &name, &bytes)
}

#[cfg(test)]
mod tests {
    use image::Rgba;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn names_follow_the_pattern() {
        let name = unique_name(&mut StdRng::seed_from_u64(7));
        let parts: Vec<&str> = name.trim_end_matches(".jpg").split('_').collect();
        assert!(name.ends_with(".jpg"));
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "album");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn saved_poster_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested/out");
        let canvas = RgbaImage::from_pixel(40, 50, Rgba([200, 100, 50, 255]));

        let path = save_poster(&canvas, &out, 90).unwrap();
        assert!(path.starts_with(&out));
        let decoded = image::open(&path).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 50));

        let leftovers: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn unwritable_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"x").unwrap();

        let err = write_atomic(&blocker.join("sub"), "a.jpg", b"data").unwrap_err();
        assert!(matches!(err, PosterError::Write { .. }));
        assert!(err.to_string().starts_with("render failed"));
    }
}
