//! Image resize and re-encode before upload.
//!
//! Output dimensions are scaled down (never up) to fit the configured
//! bounding box, preserving aspect ratio: width is fitted first, then height
//! is re-checked and fitted if still over the bound.

use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Output encoding for processed images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetFormat {
    #[default]
    Jpeg,
    Png,
    WebP,
}

impl TargetFormat {
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(TargetFormat::Jpeg),
            "png" => Ok(TargetFormat::Png),
            "webp" => Ok(TargetFormat::WebP),
            _ => Err(anyhow::anyhow!("Invalid format: {}", s)),
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "image/jpeg",
            TargetFormat::Png => "image/png",
            TargetFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpg",
            TargetFormat::Png => "png",
            TargetFormat::WebP => "webp",
        }
    }
}

/// Processing configuration.
///
/// `enable_compression` is recognized for configuration compatibility; the
/// re-encode quality itself comes from `quality`.
#[derive(Debug, Clone)]
pub struct ProcessingOptions {
    /// Re-encode quality, 0.0-1.0.
    pub quality: f32,
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub target_format: TargetFormat,
    pub enable_compression: bool,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            quality: 0.8,
            max_width: Some(1920),
            max_height: Some(1080),
            target_format: TargetFormat::Jpeg,
            enable_compression: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Result of a processing pass.
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    pub bytes: Bytes,
    pub content_type: String,
    pub width: u32,
    pub height: u32,
}

/// Stateless resize/re-encode transform.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Decode, fit into the bounding box, and re-encode.
    ///
    /// The decoded pixel buffer is scoped to this call and released on every
    /// path. Callers treat failures as non-fatal and upload the original.
    pub fn process(data: &[u8], options: &ProcessingOptions) -> Result<ProcessedImage, ProcessError> {
        let img = image::ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ProcessError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| ProcessError::Decode(e.to_string()))?;

        let (src_w, src_h) = img.dimensions();
        let (out_w, out_h) =
            Self::calculate_dimensions(src_w, src_h, options.max_width, options.max_height);

        let resized = if (out_w, out_h) != (src_w, src_h) {
            img.resize_exact(out_w, out_h, image::imageops::FilterType::Lanczos3)
        } else {
            img
        };

        let bytes = Self::encode(&resized, options)?;

        tracing::debug!(
            src_width = src_w,
            src_height = src_h,
            out_width = out_w,
            out_height = out_h,
            in_bytes = data.len(),
            out_bytes = bytes.len(),
            format = ?options.target_format,
            "Image processed"
        );

        Ok(ProcessedImage {
            bytes,
            content_type: options.target_format.to_mime_type().to_string(),
            width: out_w,
            height: out_h,
        })
    }

    /// Fit `(width, height)` inside the optional bounding box, scaling down
    /// only. Width is fitted first; height is then re-checked.
    pub fn calculate_dimensions(
        width: u32,
        height: u32,
        max_width: Option<u32>,
        max_height: Option<u32>,
    ) -> (u32, u32) {
        let mut w = width as f64;
        let mut h = height as f64;

        if let Some(max_w) = max_width {
            if w > max_w as f64 {
                h = h * max_w as f64 / w;
                w = max_w as f64;
            }
        }

        if let Some(max_h) = max_height {
            if h > max_h as f64 {
                w = w * max_h as f64 / h;
                h = max_h as f64;
            }
        }

        ((w.round() as u32).max(1), (h.round() as u32).max(1))
    }

    fn encode(img: &DynamicImage, options: &ProcessingOptions) -> Result<Bytes, ProcessError> {
        let quality = (options.quality.clamp(0.0, 1.0) * 100.0).round();

        match options.target_format {
            TargetFormat::Jpeg => {
                let mut buffer = Vec::new();
                let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
                    Cursor::new(&mut buffer),
                    quality as u8,
                );
                // JPEG has no alpha channel.
                img.to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|e| ProcessError::Encode(e.to_string()))?;
                Ok(Bytes::from(buffer))
            }
            TargetFormat::Png => {
                let mut buffer = Vec::new();
                img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
                    .map_err(|e| ProcessError::Encode(e.to_string()))?;
                Ok(Bytes::from(buffer))
            }
            TargetFormat::WebP => {
                let rgba = img.to_rgba8();
                let (w, h) = rgba.dimensions();
                let encoded = webp::Encoder::from_rgba(&rgba, w, h).encode(quality as f32);
                Ok(Bytes::from(encoded.to_vec()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_image(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([120, 40, 200, 255]),
        ));
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .unwrap();
        buffer
    }

    #[test]
    fn test_calculate_dimensions_width_first() {
        // 4000x3000 into 1920x1080: width fit gives 1920x1440, height
        // re-check gives 1440x1080.
        let (w, h) = ImageProcessor::calculate_dimensions(4000, 3000, Some(1920), Some(1080));
        assert_eq!((w, h), (1440, 1080));
    }

    #[test]
    fn test_calculate_dimensions_never_upscales() {
        let (w, h) = ImageProcessor::calculate_dimensions(640, 480, Some(1920), Some(1080));
        assert_eq!((w, h), (640, 480));
    }

    #[test]
    fn test_calculate_dimensions_unbounded_axis() {
        let (w, h) = ImageProcessor::calculate_dimensions(4000, 100, Some(2000), None);
        assert_eq!((w, h), (2000, 50));
    }

    #[test]
    fn test_output_fits_bounding_box_and_keeps_aspect() {
        let cases = [
            (3840u32, 2160u32),
            (2160, 3840),
            (1921, 1080),
            (100, 5000),
            (1, 1),
        ];
        for (w, h) in cases {
            let (out_w, out_h) =
                ImageProcessor::calculate_dimensions(w, h, Some(1920), Some(1080));
            assert!(out_w <= 1920 && out_h <= 1080, "{}x{} -> {}x{}", w, h, out_w, out_h);
            assert!(out_w <= w && out_h <= h, "no upscaling for {}x{}", w, h);
            // Aspect ratio preserved within rounding tolerance.
            let src_ratio = w as f64 / h as f64;
            let out_ratio = out_w as f64 / out_h as f64;
            assert!(
                (src_ratio - out_ratio).abs() / src_ratio < 0.05,
                "aspect drift for {}x{}",
                w,
                h
            );
        }
    }

    #[test]
    fn test_process_resizes_to_bounds() {
        let data = png_image(400, 300);
        let options = ProcessingOptions {
            quality: 0.8,
            max_width: Some(200),
            max_height: Some(200),
            target_format: TargetFormat::Jpeg,
            enable_compression: true,
        };

        let processed = ImageProcessor::process(&data, &options).unwrap();
        assert_eq!((processed.width, processed.height), (200, 150));
        assert_eq!(processed.content_type, "image/jpeg");
        assert!(!processed.bytes.is_empty());
    }

    #[test]
    fn test_process_small_image_untouched_dimensions() {
        let data = png_image(100, 80);
        let processed = ImageProcessor::process(&data, &ProcessingOptions::default()).unwrap();
        assert_eq!((processed.width, processed.height), (100, 80));
    }

    #[test]
    fn test_process_png_roundtrip_decodable() {
        let data = png_image(64, 64);
        let options = ProcessingOptions {
            target_format: TargetFormat::Png,
            ..ProcessingOptions::default()
        };
        let processed = ImageProcessor::process(&data, &options).unwrap();
        let decoded = image::load_from_memory(&processed.bytes).unwrap();
        assert_eq!(decoded.dimensions(), (64, 64));
    }

    #[test]
    fn test_process_rejects_non_image() {
        let err = ImageProcessor::process(b"definitely not an image", &ProcessingOptions::default())
            .unwrap_err();
        assert!(matches!(err, ProcessError::Decode(_)));
    }

    #[test]
    fn test_target_format_parse() {
        assert_eq!(TargetFormat::parse("jpg").unwrap(), TargetFormat::Jpeg);
        assert_eq!(TargetFormat::parse("WEBP").unwrap(), TargetFormat::WebP);
        assert!(TargetFormat::parse("avif").is_err());
    }
}
