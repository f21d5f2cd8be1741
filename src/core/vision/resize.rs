//! Shrink oversized images before they are sent for analysis.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Longest edge after downscaling.
pub const MAX_EDGE: u32 = 1024;
/// JPEG quality used for the re-encoded image.
pub const JPEG_QUALITY: u8 = 80;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("not a base64 data URL")]
    InvalidDataUrl,
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image decode/encode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("image worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Raw bytes of a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ImageError> {
    let (header, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or(ImageError::InvalidDataUrl)?;
    if !header.ends_with(";base64") {
        return Err(ImageError::InvalidDataUrl);
    }
    Ok(STANDARD.decode(payload.trim())?)
}

/// Size that fits within `max` on the longer edge, keeping aspect ratio. Never upscales.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    let scale = |short: u32, long: u32| -> u32 {
        ((u64::from(short) * u64::from(max)) / u64::from(long)).max(1) as u32
    };
    if width >= height {
        (max, scale(height, width))
    } else {
        (scale(width, height), max)
    }
}

/// Decode, shrink to [`MAX_EDGE`], and re-encode as a JPEG data URL.
pub fn downscale_blocking(data_url: &str) -> Result<String, ImageError> {
    let bytes = decode_data_url(data_url)?;
    let img = image::load_from_memory(&bytes)?;
    let (w, h) = target_dimensions(img.width(), img.height(), MAX_EDGE);
    let img = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Triangle)
    };

    let mut out = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
    let out = out.into_inner();

    let result = format!("data:image/jpeg;base64,{}", STANDARD.encode(&out));
    log::info!(
        "Downscaled image from {} KB to {} KB ({}x{})",
        data_url.len() / 1024,
        result.len() / 1024,
        w,
        h
    );
    Ok(result)
}

/// [`downscale_blocking`] on the blocking pool.
pub async fn downscale(data_url: String) -> Result<String, ImageError> {
    tokio::task::spawn_blocking(move || downscale_blocking(&data_url)).await?
}
