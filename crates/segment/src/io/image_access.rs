use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage, imageops};
use imageproc::drawing::{draw_text_mut, text_size};
use stack_common::{RunConfig, utils};
use tiff::{
    encoder::{TiffEncoder, colortype},
    tags::Tag,
};
use tracing::debug;

use crate::{
    error::{Result, SegmentError},
    traits::ImageAccess,
    types::CropRect,
};

const LABEL_FONT_SIZE: f32 = 14.0;
const LABEL_MARGIN: u32 = 6;
const LABEL_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const LABEL_INK: Rgb<u8> = Rgb([0, 0, 0]);

/// [`ImageAccess`] backed by the `image` and `imageproc` crates.
///
/// Labels are burned into a white band under the crop when a font is loaded.
/// Without a font, `annotate` passes the crop through and the label only
/// travels as file metadata: a PNG `Comment` text chunk or the TIFF
/// `ImageDescription` tag.
pub struct ImageCrateAccess {
    font: Option<FontVec>,
}

impl ImageCrateAccess {
    pub fn new() -> Self {
        Self { font: None }
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.font = Some(font);
        self
    }

    /// Load a TrueType/OpenType font from disk
    pub fn with_font_file(self, path: &Path) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| SegmentError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| SegmentError::Font {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(self.with_font(font))
    }

    /// Backend configured from a run's `label_font`
    pub fn for_run(run: &RunConfig) -> Result<Self> {
        match &run.settings.label_font {
            Some(path) => Self::new().with_font_file(path),
            None => Ok(Self::new()),
        }
    }

    fn write_png_with_comment(image: &RgbImage, path: &Path, comment: &str) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = png::Encoder::new(file, image.width(), image.height());
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);

        // tEXt is Latin-1 only
        if comment.is_ascii() {
            encoder.add_text_chunk("Comment".to_string(), comment.to_string())?;
        } else {
            encoder.add_itxt_chunk("Comment".to_string(), comment.to_string())?;
        }

        let mut writer = encoder.write_header()?;
        writer.write_image_data(image.as_raw())?;
        writer.finish()?;
        Ok(())
    }

    fn write_tiff_with_description(image: &RgbImage, path: &Path, description: &str) -> Result<()> {
        // ASCII tags only; anything else becomes '?'
        let description: String = description
            .chars()
            .map(|c| if c.is_ascii() && c != '\0' { c } else { '?' })
            .collect();

        let file = BufWriter::new(File::create(path)?);
        let mut encoder = TiffEncoder::new(file)?;
        let mut page = encoder.new_image::<colortype::RGB8>(image.width(), image.height())?;
        page.encoder().write_tag(Tag::ImageDescription, description.as_str())?;
        page.write_data(image.as_raw())?;
        Ok(())
    }
}

impl Default for ImageCrateAccess {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageAccess for ImageCrateAccess {
    fn load(&self, path: &Path) -> Result<RgbImage> {
        Ok(image::open(path)?.to_rgb8())
    }

    fn crop(&self, image: &RgbImage, rect: CropRect) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        if rect.x2 <= rect.x1 || rect.y2 <= rect.y1 || rect.x2 > width || rect.y2 > height {
            return Err(SegmentError::CropOutOfBounds { rect, width, height });
        }
        Ok(imageops::crop_imm(image, rect.x1, rect.y1, rect.width(), rect.height()).to_image())
    }

    fn resize(&self, image: &RgbImage, width: u32, height: u32) -> RgbImage {
        imageops::resize(image, width, height, imageops::FilterType::Lanczos3)
    }

    fn annotate(&self, image: &RgbImage, lines: &[String]) -> Result<RgbImage> {
        let Some(font) = &self.font else {
            debug!("No label font configured, leaving crop unannotated");
            return Ok(image.clone());
        };

        let scale = PxScale::from(LABEL_FONT_SIZE);
        let line_height = (LABEL_FONT_SIZE * 1.25).ceil() as u32;
        let text_width = lines
            .iter()
            .map(|line| text_size(scale, font, line).0 as u32)
            .max()
            .unwrap_or(0);

        let width = image.width().max(text_width + 2 * LABEL_MARGIN);
        let band = line_height * lines.len() as u32 + 2 * LABEL_MARGIN;
        let mut canvas = RgbImage::from_pixel(width, image.height() + band, LABEL_BACKGROUND);
        imageops::replace(&mut canvas, image, 0, 0);

        for (i, line) in lines.iter().enumerate() {
            let y = image.height() + LABEL_MARGIN + i as u32 * line_height;
            draw_text_mut(&mut canvas, LABEL_INK, LABEL_MARGIN as i32, y as i32, scale, font, line);
        }
        Ok(canvas)
    }

    fn save(&self, image: &RgbImage, path: &Path, comment: Option<&str>) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        match comment {
            Some(comment) if utils::has_extension(path, "png") => {
                Self::write_png_with_comment(image, path, comment)
            }
            Some(comment) if ["tif", "tiff"].iter().any(|ext| utils::has_extension(path, ext)) => {
                Self::write_tiff_with_description(image, path, comment)
            }
            _ => {
                image.save(path)?;
                Ok(())
            }
        }
    }

    fn list_files(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && utils::has_extension(&path, extension) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}
