//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that are rendered independently
//! and in parallel using rayon. Each bucket owns a generator seeded from
//! the render seed and its index, so the image does not depend on how
//! buckets are scheduled.

use log::debug;
use pbgi_core::Color;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use rayon::prelude::*;

use crate::renderer::{ImageBuffer, RenderConfig};
use crate::sampling::mix_seed;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this bucket.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Generate buckets for an image, sorted in spiral order from center.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, 0));
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);

    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center (stable, so equal distances
/// keep row-major order).
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;
    let distance = |b: &Bucket| {
        let cx = b.x as f32 + b.width as f32 / 2.0;
        let cy = b.y as f32 + b.height as f32 / 2.0;
        (cx - center_x).powi(2) + (cy - center_y).powi(2)
    };

    buckets.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Result of rendering a bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    /// The bucket that was rendered
    pub bucket: Bucket,
    /// Pixel colors in row-major order
    pub pixels: Vec<Color>,
}

/// Render a single bucket. Pixels for which `shade` returns `None` get the
/// background gradient.
pub fn render_bucket<F>(
    bucket: &Bucket,
    config: &RenderConfig,
    shade: &F,
    rng: &mut dyn RngCore,
) -> Vec<Color>
where
    F: Fn(u32, u32, &mut dyn RngCore) -> Option<Color>,
{
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            let global_x = bucket.x + local_x;
            let global_y = bucket.y + local_y;
            let color = shade(global_x, global_y, rng).unwrap_or_else(|| config.background(global_y));
            pixels.push(color);
        }
    }

    pixels
}

/// Render the whole image, buckets in parallel.
pub fn render_buckets<F>(config: &RenderConfig, shade: F) -> ImageBuffer
where
    F: Fn(u32, u32, &mut dyn RngCore) -> Option<Color> + Sync,
{
    let buckets = generate_buckets(config.width, config.height, config.bucket_size);

    let results: Vec<BucketResult> = buckets
        .par_iter()
        .map(|bucket| {
            let mut rng = StdRng::seed_from_u64(mix_seed(config.seed, &[bucket.index as u64]));
            let pixels = render_bucket(bucket, config, &shade, &mut rng);
            debug!(
                "Bucket {} at ({}, {}) done",
                bucket.index, bucket.x, bucket.y
            );
            BucketResult {
                bucket: *bucket,
                pixels,
            }
        })
        .collect();

    let mut image = ImageBuffer::new(config.width, config.height);
    for result in results {
        let bucket = result.bucket;
        for (k, color) in result.pixels.into_iter().enumerate() {
            let k = k as u32;
            image.set(bucket.x + k % bucket.width, bucket.y + k / bucket.width, color);
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_generate_buckets_exact_fit() {
        let buckets = generate_buckets(128, 128, 64);
        assert_eq!(buckets.len(), 4);

        let total_pixels: u32 = buckets.iter().map(|b| b.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_buckets_partial_fit() {
        let buckets = generate_buckets(100, 100, 64);
        assert_eq!(buckets.len(), 4);

        let total_pixels: u32 = buckets.iter().map(|b| b.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 100);
    }

    #[test]
    fn test_spiral_order() {
        let buckets = generate_buckets(192, 192, 64);
        assert_eq!(buckets.len(), 9);

        let first = &buckets[0];
        assert_eq!((first.x, first.y), (64, 64));
        assert!(buckets.iter().enumerate().all(|(i, b)| b.index == i));
    }

    #[test]
    fn test_render_buckets_covers_every_pixel() {
        let config = RenderConfig {
            width: 37,
            height: 21,
            bucket_size: 8,
            ..Default::default()
        };
        let image = render_buckets(&config, |x, y, _| Some(Color::new(x as f32, y as f32, 0.0)));

        for y in 0..21 {
            for x in 0..37 {
                assert_eq!(image.get(x, y), Color::new(x as f32, y as f32, 0.0));
            }
        }
    }

    #[test]
    fn test_misses_use_background() {
        let config = RenderConfig {
            width: 4,
            height: 4,
            bucket_size: 2,
            ..Default::default()
        };
        let image = render_buckets(&config, |_, _, _| None);
        for y in 0..4 {
            assert_eq!(image.get(1, y), config.background(y));
        }
    }

    #[test]
    fn test_random_streams_are_reproducible() {
        let config = RenderConfig {
            width: 40,
            height: 40,
            bucket_size: 16,
            seed: 99,
            ..Default::default()
        };
        let shade = |_: u32, _: u32, rng: &mut dyn RngCore| Some(Color::splat(rng.gen::<f32>()));

        assert_eq!(render_buckets(&config, shade), render_buckets(&config, shade));
    }
}
