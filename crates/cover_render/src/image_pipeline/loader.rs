use std::path::PathBuf;

use image::{DynamicImage, GenericImageView};
use log::{debug, warn};

/// Where the poster photo comes from.
#[derive(Clone, Debug, Default)]
pub enum PhotoSource {
    #[default]
    Absent,
    Path(PathBuf),
    Image(DynamicImage),
}

impl PhotoSource {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        path.map_or(PhotoSource::Absent, PhotoSource::Path)
    }

    /// Decodes the photo; unreadable or empty sources yield `None`.
    pub fn load(&self) -> Option<DynamicImage> {
        let image = match self {
            PhotoSource::Absent => return None,
            PhotoSource::Image(image) => image.clone(),
            PhotoSource::Path(path) => match image::open(path) {
                Ok(image) => {
                    let (w, h) = image.dimensions();
                    debug!("loaded photo {}x{} from {}", w, h, path.display());
                    image
                },
                Err(err) => {
                    warn!("failed to open photo {}: {err}", path.display());
                    return None;
                },
            },
        };

        if image.width() == 0 || image.height() == 0 {
            warn!("photo has no pixels, using solid fallback");
            return None;
        }

        Some(image)
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    #[test]
    fn missing_file_is_not_fatal() {
        let source = PhotoSource::from_path(Some(PathBuf::from("/definitely/not/here.jpg")));
        assert!(source.load().is_none());
        assert!(PhotoSource::Absent.load().is_none());
    }

    #[test]
    fn in_memory_image_is_used() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 2, Rgb([1, 2, 3])));
        let loaded = PhotoSource::Image(image).load().unwrap();
        assert_eq!(loaded.dimensions(), (3, 2));
    }

    #[test]
    fn empty_image_falls_back() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(PhotoSource::Image(image).load().is_none());
    }
}
