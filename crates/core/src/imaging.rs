//! Image codec: canonicalization, cropping and aspect-ratio normalization.
//!
//! All functions take and return raw encoded byte buffers. Every decode
//! failure collapses into [`ImageError::UnsupportedOrCorrupt`].

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

/// Neutral letterbox colour used by [`scale_to_aspect`].
pub const PAD_COLOR: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// MIME type assumed when the format cannot be sniffed.
pub const DEFAULT_MIME: &str = "image/png";

/// Errors raised by the image codec.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("unsupported-or-corrupt-image: {0}")]
    UnsupportedOrCorrupt(String),

    #[error("Image encoding failed: {0}")]
    Encode(String),

    #[error("Invalid aspect ratio {0}:{1}")]
    InvalidAspect(u32, u32),
}

/// A crop rectangle in source pixel coordinates, as submitted by clients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes).map_err(|e| ImageError::UnsupportedOrCorrupt(e.to_string()))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, ImageError> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .map_err(|e| ImageError::Encode(e.to_string()))?;
    Ok(out.into_inner())
}

/// Decode any supported image and re-encode it as an 8-bit RGBA PNG.
pub fn to_png(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = decode(bytes)?;
    encode(&DynamicImage::ImageRgba8(img.to_rgba8()), ImageFormat::Png)
}

/// Decode any supported image and re-encode it as (lossless) WebP.
pub fn to_webp(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    let img = decode(bytes)?;
    encode(&DynamicImage::ImageRgba8(img.to_rgba8()), ImageFormat::WebP)
}

/// Decode an image straight into an 8-bit RGBA buffer.
pub fn decode_rgba8(bytes: &[u8]) -> Result<RgbaImage, ImageError> {
    Ok(decode(bytes)?.to_rgba8())
}

/// Crop `bytes` to `rect`, re-encoding the result as PNG.
///
/// When the rectangle is empty or not fully inside the decoded bounds the
/// input bytes are returned unchanged.
pub fn crop(bytes: &[u8], rect: CropRect) -> Result<Vec<u8>, ImageError> {
    let img = decode(bytes)?;

    let (x, y, w, h) = (
        rect.x.round(),
        rect.y.round(),
        rect.width.round(),
        rect.height.round(),
    );
    let inside = x >= 0.0
        && y >= 0.0
        && w >= 1.0
        && h >= 1.0
        && x + w <= f64::from(img.width())
        && y + h <= f64::from(img.height());
    if !inside {
        return Ok(bytes.to_vec());
    }

    let cropped = img.crop_imm(x as u32, y as u32, w as u32, h as u32);
    encode(&DynamicImage::ImageRgba8(cropped.to_rgba8()), ImageFormat::Png)
}

/// Rescale so the output aspect ratio equals `aspect_w:aspect_h`.
///
/// The whole source is kept: it is fitted onto a canvas of the target ratio
/// and the remaining area is padded with [`PAD_COLOR`]. Inputs that already
/// have the target ratio are returned unchanged.
pub fn scale_to_aspect(bytes: &[u8], aspect_w: u32, aspect_h: u32) -> Result<Vec<u8>, ImageError> {
    if aspect_w == 0 || aspect_h == 0 {
        return Err(ImageError::InvalidAspect(aspect_w, aspect_h));
    }
    let img = decode(bytes)?;
    let (w, h) = (u64::from(img.width()), u64::from(img.height()));
    let (aw, ah) = (u64::from(aspect_w), u64::from(aspect_h));

    if w * ah == h * aw {
        return Ok(bytes.to_vec());
    }

    let (canvas_w, canvas_h) = if w * ah > h * aw {
        // Wider than target: keep width, grow height.
        (w, (w * ah + aw / 2) / aw)
    } else {
        (((h * aw) + ah / 2) / ah, h)
    };

    let mut canvas = RgbaImage::from_pixel(canvas_w as u32, canvas_h as u32, PAD_COLOR);
    let offset_x = ((canvas_w - w) / 2) as i64;
    let offset_y = ((canvas_h - h) / 2) as i64;
    image::imageops::overlay(&mut canvas, &img.to_rgba8(), offset_x, offset_y);

    encode(&DynamicImage::ImageRgba8(canvas), ImageFormat::Png)
}

/// Sniff the MIME type of an encoded image, defaulting to `image/png`.
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    image::guess_format(bytes)
        .map(|f| f.to_mime_type())
        .unwrap_or(DEFAULT_MIME)
}

/// Pixel dimensions of an encoded image.
pub fn dimensions(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
    let img = decode(bytes)?;
    Ok((img.width(), img.height()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sample_png(w: u32, h: u32) -> Vec<u8> {
        let img = RgbaImage::from_fn(w, h, |x, y| Rgba([(x * 7) as u8, (y * 3) as u8, 90, 255]));
        encode(&DynamicImage::ImageRgba8(img), ImageFormat::Png).unwrap()
    }

    fn sample_jpeg(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([10, 200, 30]));
        encode(&DynamicImage::ImageRgb8(img), ImageFormat::Jpeg).unwrap()
    }

    #[test]
    fn to_png_converts_jpeg() {
        let png = to_png(&sample_jpeg(8, 4)).unwrap();
        assert_eq!(sniff_mime(&png), "image/png");
        assert_eq!(dimensions(&png).unwrap(), (8, 4));
    }

    #[test]
    fn to_png_is_pixel_idempotent() {
        let once = to_png(&sample_jpeg(16, 9)).unwrap();
        let twice = to_png(&once).unwrap();
        assert_eq!(
            decode_rgba8(&once).unwrap().into_raw(),
            decode_rgba8(&twice).unwrap().into_raw()
        );
    }

    #[test]
    fn garbage_is_unsupported_or_corrupt() {
        assert_matches!(
            to_png(b"definitely not an image"),
            Err(ImageError::UnsupportedOrCorrupt(_))
        );
        assert_matches!(
            to_webp(b"nope"),
            Err(ImageError::UnsupportedOrCorrupt(_))
        );
    }

    #[test]
    fn to_webp_produces_webp() {
        let webp = to_webp(&sample_png(5, 5)).unwrap();
        assert_eq!(sniff_mime(&webp), "image/webp");
    }

    #[test]
    fn crop_inside_bounds() {
        let src = sample_png(20, 10);
        let out = crop(
            &src,
            CropRect { x: 2.0, y: 1.0, width: 8.0, height: 5.0 },
        )
        .unwrap();
        assert_eq!(dimensions(&out).unwrap(), (8, 5));
    }

    #[test]
    fn crop_outside_bounds_returns_input_unchanged() {
        let src = sample_png(20, 10);
        for rect in [
            CropRect { x: 15.0, y: 0.0, width: 10.0, height: 5.0 },
            CropRect { x: -1.0, y: 0.0, width: 5.0, height: 5.0 },
            CropRect { x: 0.0, y: 0.0, width: 0.0, height: 5.0 },
            CropRect { x: 0.0, y: 8.0, width: 5.0, height: 5.0 },
        ] {
            assert_eq!(crop(&src, rect).unwrap(), src, "rect {rect:?}");
        }
    }

    #[test]
    fn scale_to_aspect_pads_square_to_wide() {
        let out = scale_to_aspect(&sample_png(90, 90), 16, 9).unwrap();
        assert_eq!(dimensions(&out).unwrap(), (160, 90));

        let rgba = decode_rgba8(&out).unwrap();
        // Left edge is padding, centre is source.
        assert_eq!(*rgba.get_pixel(0, 45), PAD_COLOR);
        assert_ne!(*rgba.get_pixel(80, 45), PAD_COLOR);
    }

    #[test]
    fn scale_to_aspect_pads_wide_to_tall() {
        let out = scale_to_aspect(&sample_png(40, 10), 1, 1).unwrap();
        assert_eq!(dimensions(&out).unwrap(), (40, 40));
    }

    #[test]
    fn scale_to_aspect_keeps_matching_ratio() {
        let src = sample_png(32, 18);
        assert_eq!(scale_to_aspect(&src, 16, 9).unwrap(), src);
    }

    #[test]
    fn scale_to_aspect_rejects_zero() {
        assert_matches!(
            scale_to_aspect(&sample_png(2, 2), 0, 9),
            Err(ImageError::InvalidAspect(0, 9))
        );
    }

    #[test]
    fn sniff_defaults_to_png() {
        assert_eq!(sniff_mime(b"???"), "image/png");
        assert_eq!(sniff_mime(&sample_jpeg(2, 2)), "image/jpeg");
    }
}
