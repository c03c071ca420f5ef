use image::imageops::FilterType;
use image::{DynamicImage, Rgb};

/// Side of the grid the source is sampled down to before quantization.
const SAMPLE_GRID: u32 = 120;
const MAX_CANDIDATES: usize = 5;

const DARK_THRESHOLD: f32 = 30.0;
const LIGHT_THRESHOLD: f32 = 230.0;
const BACKGROUND_MIN_LUMA: f32 = 210.0;
const FOREGROUND_MAX_LUMA: f32 = 150.0;
const BLEND_STEP: f32 = 0.15;
const MAX_BLEND_STEPS: usize = 10;

pub const NEUTRAL_CREAM: Rgb<u8> = Rgb([240, 230, 210]);

/// Perceived luminance in the range [0.0, 255.0].
pub fn luminance(color: Rgb<u8>) -> f32 {
    let [r, g, b] = color.0;
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Palette {
    pub dominant: Rgb<u8>,
    pub background: Rgb<u8>,
    pub foreground: Rgb<u8>,
}

impl Palette {
    pub fn from_image(image: &DynamicImage) -> Self {
        Self::from_dominant(dominant_color(image))
    }

    pub fn from_dominant(dominant: Rgb<u8>) -> Self {
        let background = background_from(dominant);
        let foreground = foreground_from(dominant);
        Self { dominant, background, foreground }
    }
}

/// Most frequent mid-luminance colour of the image, or cream when none qualifies.
pub fn dominant_color(image: &DynamicImage) -> Rgb<u8> {
    if image.width() == 0 || image.height() == 0 {
        return NEUTRAL_CREAM;
    }

    let sample = image.resize_exact(SAMPLE_GRID, SAMPLE_GRID, FilterType::Triangle).to_rgb8();
    let pixels: Vec<[u8; 3]> = sample.pixels().map(|pixel| pixel.0).collect();
    let candidates = median_cut(pixels.clone(), MAX_CANDIDATES);

    rank_by_share(&pixels, candidates)
        .into_iter()
        .map(|bucket| Rgb(bucket.average))
        .find(|&color| {
            let lum = luminance(color);
            lum > DARK_THRESHOLD && lum < LIGHT_THRESHOLD
        })
        .unwrap_or(NEUTRAL_CREAM)
}

/// Lightens `dominant` toward white until it is a usable backdrop.
pub fn background_from(dominant: Rgb<u8>) -> Rgb<u8> {
    let mut color = dominant;
    for _ in 0..MAX_BLEND_STEPS {
        if luminance(color) >= BACKGROUND_MIN_LUMA {
            return color;
        }
        color = blend(color, [255; 3], BLEND_STEP);
    }

    let lum = luminance(color);
    if lum >= BACKGROUND_MIN_LUMA {
        return color;
    }
    // Luminance is linear in the channels; the half step absorbs rounding.
    let amount = ((BACKGROUND_MIN_LUMA + 0.5 - lum) / (255.0 - lum)).min(1.0);
    blend_ceil(color, amount)
}

/// Darkens `dominant` toward black until text drawn with it reads on the backdrop.
pub fn foreground_from(dominant: Rgb<u8>) -> Rgb<u8> {
    let mut color = dominant;
    for _ in 0..MAX_BLEND_STEPS {
        if luminance(color) <= FOREGROUND_MAX_LUMA {
            return color;
        }
        color = blend(color, [0; 3], BLEND_STEP);
    }

    let lum = luminance(color);
    if lum <= FOREGROUND_MAX_LUMA {
        return color;
    }
    let factor = (FOREGROUND_MAX_LUMA - 0.5) / lum;
    Rgb(color.0.map(|channel| (channel as f32 * factor).floor() as u8))
}

/// Pure black or pure white, whichever stands further from `fill`.
pub fn outline_for(fill: Rgb<u8>) -> Rgb<u8> {
    let lum = luminance(fill);
    if lum > 255.0 - lum {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

fn blend(color: Rgb<u8>, target: [u8; 3], amount: f32) -> Rgb<u8> {
    let mut out = color.0;
    for (channel, target) in out.iter_mut().zip(target) {
        let value = *channel as f32 + (target as f32 - *channel as f32) * amount;
        *channel = value.round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

fn blend_ceil(color: Rgb<u8>, amount: f32) -> Rgb<u8> {
    Rgb(color.0.map(|channel| {
        let value = channel as f32 + (255.0 - channel as f32) * amount;
        value.ceil().clamp(0.0, 255.0) as u8
    }))
}

#[derive(Clone, Debug)]
struct ColorBucket {
    average: [u8; 3],
    count: usize,
}

/// Assigns every pixel to its nearest candidate and sorts candidates by how many they won.
///
/// Median cut can split one colour over several boxes, so candidates sharing an average are
/// merged before counting.
fn rank_by_share(pixels: &[[u8; 3]], candidates: Vec<ColorBucket>) -> Vec<ColorBucket> {
    let mut buckets: Vec<ColorBucket> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !buckets.iter().any(|bucket| bucket.average == candidate.average) {
            buckets.push(ColorBucket { average: candidate.average, count: 0 });
        }
    }
    if buckets.is_empty() {
        return buckets;
    }

    for pixel in pixels {
        let nearest = buckets
            .iter()
            .enumerate()
            .min_by_key(|(_, bucket)| distance(&bucket.average, pixel))
            .map(|(index, _)| index);
        if let Some(index) = nearest {
            buckets[index].count += 1;
        }
    }

    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

fn distance(a: &[u8; 3], b: &[u8; 3]) -> u32 {
    a.iter().zip(b).map(|(&x, &y)| (x as i32 - y as i32).unsigned_abs().pow(2)).sum()
}

/// Median-cut quantization, one bucket per box.
fn median_cut(pixels: Vec<[u8; 3]>, max_colors: usize) -> Vec<ColorBucket> {
    if pixels.is_empty() {
        return Vec::new();
    }

    let mut boxes = vec![pixels];
    while boxes.len() < max_colors {
        let widest = boxes
            .iter()
            .enumerate()
            .filter(|(_, pixels)| pixels.len() > 1)
            .map(|(index, pixels)| (index, widest_channel(pixels)))
            .filter(|(_, (_, range))| *range > 0)
            .max_by_key(|(_, (_, range))| *range);

        let Some((index, (channel, _))) = widest else {
            break;
        };

        let mut pixels = boxes.swap_remove(index);
        pixels.sort_unstable_by_key(|pixel| pixel[channel]);
        let upper = pixels.split_off(pixels.len() / 2);
        boxes.push(pixels);
        boxes.push(upper);
    }

    let mut buckets: Vec<ColorBucket> = boxes
        .into_iter()
        .filter(|pixels| !pixels.is_empty())
        .map(|pixels| {
            let mut sums = [0u64; 3];
            for pixel in &pixels {
                for (sum, value) in sums.iter_mut().zip(pixel) {
                    *sum += *value as u64;
                }
            }
            let count = pixels.len();
            let average = sums.map(|sum| (sum / count as u64) as u8);
            ColorBucket { average, count }
        })
        .collect();

    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets
}

fn widest_channel(pixels: &[[u8; 3]]) -> (usize, u8) {
    let mut min = [u8::MAX; 3];
    let mut max = [u8::MIN; 3];
    for pixel in pixels {
        for channel in 0..3 {
            min[channel] = min[channel].min(pixel[channel]);
            max[channel] = max[channel].max(pixel[channel]);
        }
    }

    (0..3)
        .map(|channel| (channel, max[channel] - min[channel]))
        .max_by_key(|(_, range)| *range)
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use image::RgbImage;

    use super::*;

    fn corner_colors() -> Vec<Rgb<u8>> {
        let mut colors = Vec::new();
        for r in [0u8, 64, 128, 200, 255] {
            for g in [0u8, 90, 180, 255] {
                for b in [0u8, 127, 255] {
                    colors.push(Rgb([r, g, b]));
                }
            }
        }
        colors
    }

    #[test]
    fn background_is_always_light() {
        for color in corner_colors() {
            let background = background_from(color);
            assert!(luminance(background) >= 210.0, "{color:?} -> {background:?}");
        }
    }

    #[test]
    fn foreground_is_always_dark() {
        for color in corner_colors() {
            let foreground = foreground_from(color);
            assert!(luminance(foreground) <= 150.0, "{color:?} -> {foreground:?}");
        }
    }

    #[test]
    fn outline_contrasts_with_fill() {
        assert_eq!(outline_for(Rgb([250, 250, 250])), Rgb([0, 0, 0]));
        assert_eq!(outline_for(Rgb([20, 30, 40])), Rgb([255, 255, 255]));
    }

    #[test]
    fn dominant_skips_near_black() {
        let mut image = RgbImage::from_pixel(100, 100, Rgb([5, 5, 5]));
        for y in 0..30 {
            for x in 0..100 {
                image.put_pixel(x, y, Rgb([200, 60, 60]));
            }
        }
        let dominant = dominant_color(&DynamicImage::ImageRgb8(image));
        let lum = luminance(dominant);
        assert!(lum > 30.0 && lum < 230.0);
        assert!(dominant.0[0] > dominant.0[1]);
    }

    #[test]
    fn dominant_is_the_largest_qualifying_share() {
        let mut image = RgbImage::new(120, 120);
        for (_, y, pixel) in image.enumerate_pixels_mut() {
            *pixel = match y {
                0..=53 => Rgb([150, 100, 100]),
                54..=89 => Rgb([50, 100, 100]),
                _ => Rgb([250, 100, 100]),
            };
        }

        let pixels: Vec<[u8; 3]> = image.pixels().map(|pixel| pixel.0).collect();
        let ranked = rank_by_share(&pixels, median_cut(pixels.clone(), MAX_CANDIDATES));
        let total: usize = ranked.iter().map(|bucket| bucket.count).sum();
        assert_eq!(total, pixels.len());
        assert_eq!(ranked[0].average, [150, 100, 100]);
        assert_eq!(ranked[0].count, 120 * 54);

        assert_eq!(dominant_color(&DynamicImage::ImageRgb8(image)), Rgb([150, 100, 100]));
    }

    #[test]
    fn dominant_falls_back_to_cream() {
        let white = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([255, 255, 255])));
        assert_eq!(dominant_color(&white), NEUTRAL_CREAM);

        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert_eq!(dominant_color(&empty), NEUTRAL_CREAM);
    }

    #[test]
    fn palette_has_contrast() {
        let palette = Palette::from_dominant(Rgb([90, 140, 200]));
        assert!(luminance(palette.background) - luminance(palette.foreground) >= 60.0);
    }
}
