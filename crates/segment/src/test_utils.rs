use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use stack_common::{OutputMode, ProcessPriority, RunConfig, RunSettings};

/// A resolved `final` run writing PNGs under `output_root`
pub(crate) fn test_run(output_root: &Path) -> RunConfig {
    let settings = RunSettings {
        directory: PathBuf::from("/stacks/slide_07"),
        output_root: output_root.to_path_buf(),
        input_ext: "tif".to_string(),
        output_ext: "png".to_string(),
        threshold: 0.5,
        minimum_size: 100.0,
        maximum_size: 900.0,
        units_per_pixel: 1.0,
        mode: OutputMode::Final,
        skip_last_plane: false,
        unique_id: "slide07".to_string(),
        author: None,
        location: "Yale".to_string(),
        catalog_prefix: None,
        age: "Holocene".to_string(),
        source: "core 3".to_string(),
        unit: "microns".to_string(),
        label_font: None,
        priority: ProcessPriority::Unchanged,
    };
    RunConfig::resolve_at(settings, "0.1.0", "2024-01-01 00:00:00").unwrap()
}

/// Each pixel encodes its own `(x, y)` in the red and green channels
pub(crate) fn coordinate_plane(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 0]))
}
