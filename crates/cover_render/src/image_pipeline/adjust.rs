use image::{DynamicImage, Rgb, RgbaImage};

use crate::record::{Energy, Vibe};

/// Colour treatment applied to the photo before it is placed on the poster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterPreset {
    /// Brightness offset in the range [-255.0, 255.0].
    pub brightness: f32,
    /// Contrast offset in the range [-255.0, 255.0].
    pub contrast: f32,
    /// Saturation multiplier (1.0 = unchanged).
    pub saturation: f32,
    pub tint: Rgb<u8>,
    /// How strongly the tint is mixed in, 0.0 to 1.0.
    pub tint_strength: f32,
}

impl FilterPreset {
    pub const NEUTRAL: FilterPreset = FilterPreset {
        brightness: 0.0,
        contrast: 0.0,
        saturation: 1.0,
        tint: Rgb([255, 255, 255]),
        tint_strength: 0.0,
    };

    pub fn for_traits(vibe: Vibe, energy: Energy) -> Self {
        let mut preset = match vibe {
            Vibe::Regal => FilterPreset {
                brightness: -6.0,
                contrast: 18.0,
                saturation: 1.1,
                tint: Rgb([120, 60, 160]),
                tint_strength: 0.12,
            },
            Vibe::Goofball => FilterPreset {
                brightness: 10.0,
                contrast: 12.0,
                saturation: 1.3,
                tint: Rgb([255, 180, 60]),
                tint_strength: 0.08,
            },
            Vibe::Adventurer => FilterPreset {
                brightness: 0.0,
                contrast: 15.0,
                saturation: 1.05,
                tint: Rgb([90, 140, 80]),
                tint_strength: 0.1,
            },
            Vibe::Snuggler => FilterPreset {
                brightness: 12.0,
                contrast: -10.0,
                saturation: 0.9,
                tint: Rgb([255, 190, 200]),
                tint_strength: 0.12,
            },
            Vibe::Bossy => FilterPreset {
                brightness: -4.0,
                contrast: 28.0,
                saturation: 1.15,
                tint: Rgb([200, 40, 40]),
                tint_strength: 0.06,
            },
            Vibe::WiseSage => FilterPreset {
                brightness: -2.0,
                contrast: 8.0,
                saturation: 0.6,
                tint: Rgb([200, 170, 120]),
                tint_strength: 0.18,
            },
            Vibe::Neutral => FilterPreset::NEUTRAL,
        };

        match energy {
            Energy::Chill => {
                preset.contrast -= 8.0;
                preset.saturation *= 0.9;
            },
            Energy::Balanced => {},
            Energy::Zoomies => {
                preset.contrast += 12.0;
                preset.saturation *= 1.15;
            },
        }

        preset
    }

    pub fn is_identity(&self) -> bool {
        *self == FilterPreset::NEUTRAL
    }
}

pub fn apply_vibe_filter(image: &DynamicImage, vibe: Vibe, energy: Energy) -> RgbaImage {
    let mut pixels = image.to_rgba8();
    apply_preset(&mut pixels, FilterPreset::for_traits(vibe, energy));
    pixels
}

pub fn apply_preset(image: &mut RgbaImage, preset: FilterPreset) {
    if preset.is_identity() {
        return;
    }

    let contrast = preset.contrast.clamp(-255.0, 255.0);
    let contrast_factor = (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast));
    let brightness = (preset.brightness / 255.0).clamp(-1.0, 1.0);
    let saturation = preset.saturation.max(0.0);
    let tint = preset.tint.0.map(|channel| channel as f32 / 255.0);
    let tint_strength = preset.tint_strength.clamp(0.0, 1.0);

    for pixel in image.pixels_mut() {
        let mut rgb = [0.0f32; 3];
        for (value, channel) in rgb.iter_mut().zip(&pixel.0[..3]) {
            *value = *channel as f32 / 255.0;
        }

        let gray = 0.299 * rgb[0] + 0.587 * rgb[1] + 0.114 * rgb[2];
        for (index, value) in rgb.iter_mut().enumerate() {
            let mut v = gray + (*value - gray) * saturation;
            v = contrast_factor * (v - 0.5) + 0.5 + brightness;
            v += (tint[index] * v - v) * tint_strength;
            pixel.0[index] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    #[test]
    fn neutral_preset_leaves_pixels_alone() {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([12, 200, 90, 255]));
        apply_preset(&mut image, FilterPreset::for_traits(Vibe::Neutral, Energy::Balanced));
        assert!(image.pixels().all(|pixel| pixel.0 == [12, 200, 90, 255]));
    }

    #[test]
    fn desaturating_preset_pulls_channels_together() {
        let mut image = RgbaImage::from_pixel(2, 2, Rgba([220, 40, 40, 255]));
        let preset = FilterPreset { saturation: 0.0, ..FilterPreset::NEUTRAL };
        apply_preset(&mut image, preset);
        let [r, g, b, a] = image.get_pixel(0, 0).0;
        assert!(r.abs_diff(g) <= 1 && g.abs_diff(b) <= 1);
        assert_eq!(a, 255);
    }

    #[test]
    fn vibe_filter_tints_and_keeps_size() {
        let source = RgbaImage::from_pixel(6, 3, Rgba([128, 128, 128, 255]));
        let image = DynamicImage::ImageRgba8(source.clone());

        let neutral = apply_vibe_filter(&image, Vibe::Neutral, Energy::Balanced);
        assert_eq!(neutral, source);

        let regal = apply_vibe_filter(&image, Vibe::Regal, Energy::Balanced);
        assert_eq!(regal.dimensions(), (6, 3));
        let [r, g, b, a] = regal.get_pixel(2, 1).0;
        assert!(b > g && r > g, "{r} {g} {b}");
        assert_eq!(a, 255);
    }

    #[test]
    fn energy_modifies_contrast() {
        let chill = FilterPreset::for_traits(Vibe::Bossy, Energy::Chill);
        let zoomies = FilterPreset::for_traits(Vibe::Bossy, Energy::Zoomies);
        assert!(zoomies.contrast > chill.contrast);
        assert!(zoomies.saturation > chill.saturation);
    }
}
