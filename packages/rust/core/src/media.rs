//! Upload normalization: make sure the vision model only ever sees PNG,
//! JPEG, GIF or WEBP.

use std::io::Cursor;

use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use tracing::{debug, info, instrument};

use screenlens_shared::{ImageInput, Result, ScreenlensError};

/// JPEG quality used when re-encoding other formats.
const JPEG_QUALITY: u8 = 90;

const CONVERSION_FAILED: &str =
    "Unsupported image type, and conversion failed. Please upload PNG/JPEG/WEBP/GIF.";

/// Canonical MIME type for formats passed through untouched.
fn passthrough_mime(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        _ => None,
    }
}

/// Sniff the real format of `bytes` and convert to JPEG when it is not allow-listed.
///
/// The declared MIME type and filename are informational only; the bytes decide.
#[instrument(skip(bytes), fields(len = bytes.len()))]
pub fn normalize_image(
    bytes: Vec<u8>,
    declared_mime: Option<&str>,
    filename: Option<&str>,
) -> Result<ImageInput> {
    if bytes.is_empty() {
        return Err(ScreenlensError::bad_request("Uploaded image is empty."));
    }

    let sniffed = image::guess_format(&bytes).ok();
    if let Some(mime) = sniffed.and_then(passthrough_mime) {
        if declared_mime.is_some_and(|d| !d.eq_ignore_ascii_case(mime)) {
            debug!(sniffed = mime, "declared content type differs from bytes");
        }
        return Ok(ImageInput {
            bytes,
            mime: mime.to_string(),
        });
    }

    let decoded = image::load_from_memory(&bytes).map_err(|e| {
        debug!(error = %e, "image decode failed");
        ScreenlensError::unsupported_media(CONVERSION_FAILED)
    })?;

    let rgb = decoded.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .encode_image(&rgb)
        .map_err(|e| {
            debug!(error = %e, "jpeg encode failed");
            ScreenlensError::unsupported_media(CONVERSION_FAILED)
        })?;

    info!(
        from = ?sniffed,
        width = rgb.width(),
        height = rgb.height(),
        "converted upload to jpeg"
    );
    Ok(ImageInput {
        bytes: out.into_inner(),
        mime: "image/jpeg".into(),
    })
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;

    fn encoded(format: ImageFormat) -> Vec<u8> {
        let img = RgbImage::from_pixel(4, 3, Rgb([200, 40, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn png_passes_through_unchanged() {
        let bytes = encoded(ImageFormat::Png);
        let input = normalize_image(bytes.clone(), Some("application/octet-stream"), None).unwrap();
        assert_eq!(input.mime, "image/png");
        assert_eq!(input.bytes, bytes);
    }

    #[test]
    fn bytes_win_over_declared_type() {
        let bytes = encoded(ImageFormat::Jpeg);
        let input = normalize_image(bytes, Some("image/png"), Some("shot.png")).unwrap();
        assert_eq!(input.mime, "image/jpeg");
    }

    #[test]
    fn other_formats_become_jpeg() {
        let input = normalize_image(encoded(ImageFormat::Bmp), Some("image/bmp"), Some("a.bmp"))
            .unwrap();
        assert_eq!(input.mime, "image/jpeg");
        assert_eq!(&input.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn undecodable_is_unsupported_media() {
        let err = normalize_image(b"%PDF-1.7 not an image".to_vec(), Some("application/pdf"), None)
            .unwrap_err();
        assert!(matches!(err, ScreenlensError::UnsupportedMedia { .. }));
        assert!(err.to_string().contains("Please upload PNG/JPEG/WEBP/GIF."));
    }

    #[test]
    fn empty_upload_is_bad_request() {
        let err = normalize_image(Vec::new(), None, None).unwrap_err();
        assert!(matches!(err, ScreenlensError::BadRequest { .. }));
    }
}
