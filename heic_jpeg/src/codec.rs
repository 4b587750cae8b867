//! Codec adapter: decode by path, normalize to RGB, encode JPEG.
//!
//! Only decoding is pluggable. Color normalization and JPEG encoding always
//! go through the `image` crate.

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageReader};
use shared_utils::{decode_heic_file, register_heif_decoder, ConvertError, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Opens a source image by path.
pub trait ImageCodec: Send + Sync {
    fn open(&self, path: &Path) -> Result<DynamicImage>;
}

/// libheif-backed HEIC decoder. Files libheif cannot read are handed to the
/// `image` crate, so other raster formats picked by the user still convert.
#[derive(Debug, Clone, Copy)]
pub struct HeifCodec;

impl HeifCodec {
    /// Registers libheif for the process on first use.
    pub fn new() -> Self {
        register_heif_decoder();
        Self
    }
}

impl Default for HeifCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for HeifCodec {
    fn open(&self, path: &Path) -> Result<DynamicImage> {
        match decode_heic_file(path) {
            Ok((img, info)) => {
                tracing::debug!(path = ?path, width = info.width, height = info.height, has_alpha = info.has_alpha, "Opened with libheif");
                Ok(img)
            }
            Err(heif_err) => match open_with_image_crate(path) {
                Ok(img) => {
                    tracing::debug!(path = ?path, heif_error = %heif_err, "Opened with the image crate");
                    Ok(img)
                }
                Err(err) => {
                    tracing::debug!(path = ?path, error = %err, "Fallback decode failed");
                    Err(heif_err)
                }
            },
        }
    }
}

fn open_with_image_crate(path: &Path) -> Result<DynamicImage> {
    Ok(ImageReader::open(path)?.with_guessed_format()?.decode()?)
}

/// The JPEG encoder needs three-channel 8-bit color.
pub fn normalize_color(img: DynamicImage) -> DynamicImage {
    if img.color() == ColorType::Rgb8 {
        img
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Encode `img` as JPEG at `quality`.
///
/// `quality` is not validated; the encoder clamps it to 1..=100. If encoding
/// fails after the file was created, the partial file is removed.
pub fn save_jpeg(img: &DynamicImage, path: &Path, quality: u8) -> Result<()> {
    let file = File::create(path)?;

    let written = write_jpeg(img, file, quality);
    if written.is_err() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!(path = ?path, error = %e, "Failed to remove partial output");
        } else {
            tracing::debug!(path = ?path, "Removed partial output");
        }
    }
    written
}

fn write_jpeg(img: &DynamicImage, file: File, quality: u8) -> Result<()> {
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| ConvertError::Encode(e.to_string()))?;
    writer
        .flush()
        .map_err(|e| ConvertError::Encode(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage, Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn test_normalize_rgba_to_rgb() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 128])));
        let out = normalize_color(img);
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(out.width(), 3);
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_normalize_gray_to_rgb() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(2, 2, Luma([77])));
        let out = normalize_color(img);
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(out.to_rgb8().get_pixel(0, 0), &Rgb([77, 77, 77]));
    }

    #[test]
    fn test_normalize_16bit_to_rgb8() {
        let buf: ImageBuffer<Rgb<u16>, Vec<u16>> = ImageBuffer::from_pixel(2, 2, Rgb([65535, 0, 0]));
        let out = normalize_color(DynamicImage::ImageRgb16(buf));
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_eq!(out.to_rgb8().get_pixel(1, 1), &Rgb([255, 0, 0]));
    }

    #[test]
    fn test_normalize_keeps_rgb8_pixels() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        let out = normalize_color(img.clone());
        assert_eq!(out, img);
    }

    #[test]
    fn test_save_jpeg_writes_decodable_rgb() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([200, 100, 50])));

        save_jpeg(&img, &path, 90).unwrap();

        let decoded = image::open(&path).unwrap();
        assert_eq!(decoded.color(), ColorType::Rgb8);
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_lower_quality_gives_smaller_file() {
        let temp = TempDir::new().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8])
        }));
        let low = temp.path().join("low.jpg");
        let high = temp.path().join("high.jpg");

        save_jpeg(&img, &low, 10).unwrap();
        save_jpeg(&img, &high, 100).unwrap();

        let low_size = std::fs::metadata(&low).unwrap().len();
        let high_size = std::fs::metadata(&high).unwrap().len();
        assert!(low_size < high_size, "{} vs {}", low_size, high_size);
    }

    #[test]
    fn test_failed_encode_removes_partial_output() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("too_wide.jpg");
        // wider than the JPEG format allows
        let img = DynamicImage::ImageRgb8(RgbImage::new(70_000, 1));

        let result = save_jpeg(&img, &path, 95);

        assert!(matches!(result, Err(ConvertError::Encode(_))), "got: {:?}", result);
        assert!(!path.exists());
    }

    #[test]
    fn test_heif_codec_falls_back_to_image_crate() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("picture.png");
        RgbaImage::from_pixel(5, 3, Rgba([1, 2, 3, 255])).save(&path).unwrap();

        let img = HeifCodec::new().open(&path).unwrap();

        assert_eq!((img.width(), img.height()), (5, 3));
    }

    #[test]
    fn test_heif_codec_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("garbage.heic");
        std::fs::write(&path, b"definitely not an image").unwrap();

        let result = HeifCodec::new().open(&path);

        assert!(matches!(result, Err(ConvertError::Decode(_))));
    }

    #[test]
    fn test_save_jpeg_into_missing_dir_fails_without_panic() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("out.jpg");
        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));

        assert!(matches!(save_jpeg(&img, &path, 95), Err(ConvertError::Io(_))));
    }
}
