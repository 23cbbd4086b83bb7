use image::{GrayImage, Luma};
use imageproc::map::map_colors;

use crate::{error::Result, traits::ImagePreprocessor};

/// Simple thresholding preprocessor. Pixels brighter than `threshold` become
/// foreground (255), everything else background (0).
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
}

impl ThresholdPreprocessor {
    /// Build from a fraction of full intensity in `[0, 1]`
    pub fn from_fraction(fraction: f64) -> Self {
        let level = (fraction.clamp(0.0, 1.0) * u8::MAX as f64).round() as u8;
        Self { threshold: level }
    }
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self { threshold: 128 }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let level = self.threshold;
        Ok(map_colors(image, |p: Luma<u8>| {
            Luma([if p[0] > level { u8::MAX } else { 0 }])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_maps_to_level() {
        assert_eq!(ThresholdPreprocessor::from_fraction(0.0).threshold, 0);
        assert_eq!(ThresholdPreprocessor::from_fraction(0.5).threshold, 128);
        assert_eq!(ThresholdPreprocessor::from_fraction(1.0).threshold, 255);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut img = GrayImage::new(3, 1);
        img.put_pixel(0, 0, Luma([127]));
        img.put_pixel(1, 0, Luma([128]));
        img.put_pixel(2, 0, Luma([129]));

        let binary = ThresholdPreprocessor { threshold: 128 }.preprocess(&img).unwrap();
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(1, 0)[0], 0);
        assert_eq!(binary.get_pixel(2, 0)[0], 255);
    }
}
