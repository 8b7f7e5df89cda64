//! Render configuration and the output image buffer.
//!
//! Both renderers share the same settings and produce linear RGB images;
//! gamma correction only happens when converting to 8-bit.

use pbgi_core::{Color, SceneError, SceneResult};
use serde::{Deserialize, Serialize};

/// Render configuration.
///
/// Every field has a default, so a JSON file only needs the values it
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Micro-buffer resolution (cells per side)
    pub micro_buffer_size: usize,
    /// Jittered camera rays per pixel (ray tracer only)
    pub samples_per_pixel: u32,
    /// Indirect bounces for path tracing
    pub max_bounces: u32,
    /// Surfels per unit area
    pub sampling_rate: f32,
    pub seed: u64,
    /// Square tile edge in pixels
    pub bucket_size: u32,
    /// Background gradient, top row
    pub background_top: [f32; 3],
    /// Background gradient, bottom row
    pub background_bottom: [f32; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 700,
            height: 700,
            micro_buffer_size: 8,
            samples_per_pixel: 8,
            max_bounces: 1,
            sampling_rate: 400.0,
            seed: 0,
            bucket_size: 32,
            background_top: [0.5, 0.5, 0.5],
            background_bottom: [0.1, 0.1, 0.1],
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> SceneResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(SceneError::InvalidConfig(format!(
                "image size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.micro_buffer_size == 0 {
            return Err(SceneError::InvalidConfig(
                "micro-buffer size must be non-zero".into(),
            ));
        }
        if self.bucket_size == 0 {
            return Err(SceneError::InvalidConfig("bucket size must be non-zero".into()));
        }
        if !self.sampling_rate.is_finite() || self.sampling_rate <= 0.0 {
            return Err(SceneError::InvalidConfig(format!(
                "sampling rate must be positive, got {}",
                self.sampling_rate
            )));
        }
        Ok(())
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Background color for pixel row `y` (0 is the top row).
    pub fn background(&self, y: u32) -> Color {
        let t = y as f32 / self.height.max(1) as f32;
        Color::from(self.background_top) * (1.0 - t) + Color::from(self.background_bottom) * t
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Clamp a value to [0, 1] range.
#[inline]
pub fn clamp_01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

/// Convert a color to 8-bit RGBA.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * clamp_01(linear_to_gamma(color.x))) as u8;
    let g = (255.0 * clamp_01(linear_to_gamma(color.y))) as u8;
    let b = (255.0 * clamp_01(linear_to_gamma(color.z))) as u8;
    [r, g, b, 255]
}

/// Linear RGB image, row-major with row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_to_gamma() {
        assert_eq!(linear_to_gamma(0.0), 0.0);
        assert_eq!(linear_to_gamma(-1.0), 0.0);
        assert!((linear_to_gamma(1.0) - 1.0).abs() < 0.0001);
        assert!((linear_to_gamma(0.25) - 0.5).abs() < 0.0001);
    }

    #[test]
    fn test_color_to_rgba_clamps() {
        assert_eq!(color_to_rgba(Color::new(4.0, 0.25, -1.0)), [255, 127, 0, 255]);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = RenderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!((config.width, config.height), (700, 700));
        assert_eq!(config.micro_buffer_size, 8);
        assert_eq!(config.samples_per_pixel, 8);
    }

    #[test]
    fn test_validate_rejects_degenerate_settings() {
        let zero_width = RenderConfig {
            width: 0,
            ..Default::default()
        };
        assert!(matches!(zero_width.validate(), Err(SceneError::InvalidConfig(_))));

        let zero_buffer = RenderConfig {
            micro_buffer_size: 0,
            ..Default::default()
        };
        assert!(zero_buffer.validate().is_err());

        let nan_rate = RenderConfig {
            sampling_rate: f32::NAN,
            ..Default::default()
        };
        assert!(nan_rate.validate().is_err());
    }

    #[test]
    fn test_background_gradient_runs_top_to_bottom() {
        let config = RenderConfig {
            height: 10,
            background_top: [1.0, 0.0, 0.0],
            background_bottom: [0.0, 0.0, 1.0],
            ..Default::default()
        };
        assert_eq!(config.background(0), Color::new(1.0, 0.0, 0.0));
        let mid = config.background(5);
        assert!((mid - Color::new(0.5, 0.0, 0.5)).length() < 1e-6);
    }

    #[test]
    fn test_image_buffer_layout() {
        let mut image = ImageBuffer::new(3, 2);
        image.set(2, 1, Color::ONE);
        assert_eq!(image.get(2, 1), Color::ONE);
        assert_eq!(image.pixels[5], Color::ONE);

        let bytes = image.to_rgba();
        assert_eq!(bytes.len(), 3 * 2 * 4);
        assert_eq!(&bytes[20..24], &[255, 255, 255, 255]);
    }
}
