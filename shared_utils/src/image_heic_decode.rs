//! HEIC/HEIF Decoding Module
//!
//! Uses libheif-rs to decode the primary image of a HEIC/HEIF container into
//! an `image::DynamicImage`.

use crate::img_errors::{ConvertError, Result};
use image::DynamicImage;
use libheif_rs::{ColorSpace, HeifContext, LibHeif, RgbChroma};
use std::path::Path;
use std::sync::Once;

static HEIF_REGISTRATION: Once = Once::new();

/// Process-wide libheif initialisation.
///
/// Safe to call any number of times from any thread; only the first call does
/// work. The registration handle is intentionally never dropped, so libheif
/// stays initialised until the process exits.
pub fn register_heif_decoder() {
    HEIF_REGISTRATION.call_once(|| {
        std::mem::forget(LibHeif::new());
        tracing::info!("libheif decoder registered");
    });
}

#[cfg(test)]
fn is_heif_registered() -> bool {
    HEIF_REGISTRATION.is_completed()
}

/// Properties of the primary image, read before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeicInfo {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub bit_depth: u8,
}

/// Decode the primary image of a HEIC file.
///
/// Images with an alpha channel come back as RGBA8, everything else as RGB8.
pub fn decode_heic_file(path: &Path) -> Result<(DynamicImage, HeicInfo)> {
    register_heif_decoder();
    let lib_heif = LibHeif::new();

    let ctx = HeifContext::read_from_file(path.to_string_lossy().as_ref()).map_err(|e| {
        let error_msg = format!("{}", e);
        if error_msg.contains("SecurityLimitExceeded") || error_msg.contains("ipco") {
            tracing::warn!(path = ?path, error = %e, "HEIC security limit exceeded");
            ConvertError::Decode(format!(
                "HEIC security limit exceeded (ipco box limit): {}",
                e
            ))
        } else {
            ConvertError::Decode(format!("failed to read HEIC: {}", e))
        }
    })?;

    let handle = ctx
        .primary_image_handle()
        .map_err(|e| ConvertError::Decode(format!("failed to get primary image: {}", e)))?;

    let info = HeicInfo {
        width: handle.width(),
        height: handle.height(),
        has_alpha: handle.has_alpha_channel(),
        bit_depth: handle.luma_bits_per_pixel(),
    };

    let (chroma, channels) = if info.has_alpha {
        (RgbChroma::Rgba, 4)
    } else {
        (RgbChroma::Rgb, 3)
    };

    let decoded = lib_heif
        .decode(&handle, ColorSpace::Rgb(chroma), None)
        .map_err(|e| ConvertError::Decode(format!("failed to decode HEIC: {}", e)))?;

    let planes = decoded.planes();
    let plane = planes
        .interleaved
        .ok_or_else(|| ConvertError::Decode("no interleaved RGB plane found".to_string()))?;

    let pixels = pack_rows(plane.data, plane.stride, plane.width, plane.height, channels)?;

    let img = if info.has_alpha {
        image::RgbaImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgba8)
    } else {
        image::RgbImage::from_raw(plane.width, plane.height, pixels).map(DynamicImage::ImageRgb8)
    }
    .ok_or_else(|| ConvertError::Decode("decoded buffer does not match image size".to_string()))?;

    tracing::debug!(
        path = ?path,
        width = info.width,
        height = info.height,
        has_alpha = info.has_alpha,
        bit_depth = info.bit_depth,
        "HEIC decoded"
    );

    Ok((img, info))
}

/// Drop per-row padding from a strided 8-bit interleaved plane.
fn pack_rows(data: &[u8], stride: usize, width: u32, height: u32, channels: usize) -> Result<Vec<u8>> {
    let row_bytes = width as usize * channels;
    if row_bytes == 0 || height == 0 {
        return Ok(Vec::new());
    }
    if stride < row_bytes {
        return Err(ConvertError::Decode(format!(
            "plane stride {} is smaller than row size {}",
            stride, row_bytes
        )));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in data.chunks(stride).take(height as usize) {
        let row = row
            .get(..row_bytes)
            .ok_or_else(|| ConvertError::Decode("truncated image plane".to_string()))?;
        pixels.extend_from_slice(row);
    }

    if pixels.len() != row_bytes * height as usize {
        return Err(ConvertError::Decode("truncated image plane".to_string()));
    }
    Ok(pixels)
}
