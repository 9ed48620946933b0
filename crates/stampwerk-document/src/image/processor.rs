// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image preparation — decode a raster image and split it into the RGB and
// alpha planes a PDF image XObject and its soft mask need.

use image::{DynamicImage, ImageFormat};
use stampwerk_core::error::{Result, StampwerkError};
use tracing::{debug, instrument};

/// Formats accepted for image and signature edits.
const SUPPORTED_FORMATS: &[ImageFormat] = &[
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::Tiff,
    ImageFormat::WebP,
];

/// Decoded 8-bit pixel planes.
#[derive(Debug, Clone)]
pub struct PixelData {
    /// Interleaved RGB samples, `width * height * 3` bytes.
    pub rgb: Vec<u8>,
    /// One alpha sample per pixel, present only if any pixel is translucent.
    pub alpha: Option<Vec<u8>>,
}

/// An image ready to be embedded in a PDF.
#[derive(Debug, Clone)]
pub struct EmbeddableImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub pixels: PixelData,
}

/// Decodes images for embedding.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Sniff, decode, and split `bytes` into embeddable planes.
    ///
    /// Unknown or unsupported formats, and data that fails to decode, are
    /// reported as `UnsupportedImageFormat` so the edit is skipped softly.
    #[instrument(skip_all, fields(bytes_len = bytes.len()))]
    pub fn prepare(bytes: &[u8]) -> Result<EmbeddableImage> {
        let format = image::guess_format(bytes).map_err(|err| {
            StampwerkError::UnsupportedImageFormat(format!("unrecognised image data: {err}"))
        })?;
        if !SUPPORTED_FORMATS.contains(&format) {
            return Err(StampwerkError::UnsupportedImageFormat(format!("{format:?}")));
        }

        let decoded = image::load_from_memory_with_format(bytes, format).map_err(|err| {
            StampwerkError::UnsupportedImageFormat(format!("failed to decode {format:?}: {err}"))
        })?;

        let image = Self::from_dynamic(&decoded, format);
        debug!(
            ?format,
            width = image.width,
            height = image.height,
            has_alpha = image.pixels.alpha.is_some(),
            "Image prepared"
        );
        Ok(image)
    }

    /// Split an already decoded image.
    pub fn from_dynamic(decoded: &DynamicImage, format: ImageFormat) -> EmbeddableImage {
        let (width, height) = (decoded.width(), decoded.height());

        let alpha = if decoded.color().has_alpha() {
            let rgba = decoded.to_rgba8();
            let plane: Vec<u8> = rgba.pixels().map(|p| p.0[3]).collect();
            // A fully opaque alpha channel adds nothing but bytes.
            plane.iter().any(|&a| a < u8::MAX).then_some(plane)
        } else {
            None
        };

        EmbeddableImage {
            width,
            height,
            format,
            pixels: PixelData {
                rgb: decoded.to_rgb8().into_raw(),
                alpha,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode(img: &RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img.clone())
            .write_to(&mut bytes, format)
            .unwrap();
        bytes.into_inner()
    }

    #[test]
    fn translucent_png_keeps_alpha_plane() {
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([0, 0, 255, 255]));
        img.put_pixel(0, 0, Rgba([0, 0, 0, 0]));

        let prepared = ImageProcessor::prepare(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!((prepared.width, prepared.height), (3, 2));
        assert_eq!(prepared.pixels.rgb.len(), 3 * 2 * 3);
        let alpha = prepared.pixels.alpha.expect("alpha plane");
        assert_eq!(alpha[0], 0);
        assert_eq!(alpha[1], 255);
    }

    #[test]
    fn opaque_png_drops_alpha_plane() {
        let img = RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255]));
        let prepared = ImageProcessor::prepare(&encode(&img, ImageFormat::Png)).unwrap();
        assert!(prepared.pixels.alpha.is_none());
        assert_eq!(&prepared.pixels.rgb[..3], &[10, 20, 30]);
    }

    #[test]
    fn text_bytes_are_unsupported() {
        assert!(matches!(
            ImageProcessor::prepare(b"definitely not an image"),
            Err(StampwerkError::UnsupportedImageFormat(_))
        ));
    }

    #[test]
    fn truncated_png_is_unsupported() {
        let img = RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255]));
        let bytes = encode(&img, ImageFormat::Png);
        assert!(matches!(
            ImageProcessor::prepare(&bytes[..20]),
            Err(StampwerkError::UnsupportedImageFormat(_))
        ));
    }
}
