use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgb, Rgba, RgbaImage};

/// How a non-square photo is brought into the square photo slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PhotoFit {
    /// Centre-crop to a square, then scale to fill the slot.
    #[default]
    Cover,
    /// Scale the whole photo into the slot and pad with the fill colour.
    Contain,
}

impl PhotoFit {
    pub fn apply(self, image: &DynamicImage, side: u32, fill: Rgb<u8>) -> RgbaImage {
        let side = side.max(1);
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return solid_square(side, fill);
        }

        match self {
            PhotoFit::Cover => {
                let crop = width.min(height);
                let x = (width - crop) / 2;
                let y = (height - crop) / 2;
                image
                    .crop_imm(x, y, crop, crop)
                    .resize_exact(side, side, FilterType::Lanczos3)
                    .to_rgba8()
            },
            PhotoFit::Contain => {
                let scale = side as f32 / width.max(height) as f32;
                let scaled_width = ((width as f32 * scale).round() as u32).clamp(1, side);
                let scaled_height = ((height as f32 * scale).round() as u32).clamp(1, side);
                let scaled = image.resize_exact(scaled_width, scaled_height, FilterType::Lanczos3);

                let mut square = solid_square(side, fill);
                let x = (side - scaled_width) / 2;
                let y = (side - scaled_height) / 2;
                imageops::overlay(&mut square, &scaled.to_rgba8(), x as i64, y as i64);
                square
            },
        }
    }
}

pub fn solid_square(side: u32, fill: Rgb<u8>) -> RgbaImage {
    let [r, g, b] = fill.0;
    RgbaImage::from_pixel(side, side, Rgba([r, g, b, 255]))
}

/// Uniformly scales `layer` down so it fits within `max_width` x `max_height`.
///
/// Layers that already fit are returned untouched.
pub fn shrink_to_fit(layer: RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (width, height) = layer.dimensions();
    if width <= max_width && height <= max_height {
        return layer;
    }

    let scale = (max_width as f32 / width as f32).min(max_height as f32 / height as f32);
    let new_width = ((width as f32 * scale).floor() as u32).clamp(1, max_width.max(1));
    let new_height = ((height as f32 * scale).floor() as u32).clamp(1, max_height.max(1));
    imageops::resize(&layer, new_width, new_height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use image::RgbImage;

    use super::*;

    #[test]
    fn cover_crops_to_square() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 100, Rgb([10, 20, 30])));
        let square = PhotoFit::Cover.apply(&image, 64, Rgb([0, 0, 0]));
        assert_eq!(square.dimensions(), (64, 64));
    }

    #[test]
    fn contain_pads_with_fill() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 100, Rgb([10, 20, 30])));
        let square = PhotoFit::Contain.apply(&image, 100, Rgb([250, 0, 0]));
        assert_eq!(square.dimensions(), (100, 100));
        assert_eq!(square.get_pixel(50, 2).0, [250, 0, 0, 255]);
        let center = square.get_pixel(50, 50).0;
        for (actual, expected) in center.iter().zip([10u8, 20, 30, 255]) {
            assert!(actual.abs_diff(expected) <= 2);
        }
    }

    #[test]
    fn shrink_keeps_aspect_and_bounds() {
        let layer = RgbaImage::new(400, 100);
        let shrunk = shrink_to_fit(layer, 200, 200);
        assert_eq!(shrunk.dimensions(), (200, 50));

        let untouched = shrink_to_fit(RgbaImage::new(10, 10), 20, 20);
        assert_eq!(untouched.dimensions(), (10, 10));
    }
}
