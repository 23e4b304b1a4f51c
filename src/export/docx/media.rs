//! Inline image decoding for the DOCX package.
//!
//! Only `data:` URLs are embedded. The pixel size is read straight from the
//! PNG, JPEG or GIF header so no image codec is needed.

use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use percent_encoding::percent_decode;

/// EMU per pixel at 96 dpi.
pub const EMU_PER_PIXEL: u64 = 9525;

/// Largest coordinate WordprocessingML accepts in a drawing extent.
pub const MAX_EXTENT_EMU: u64 = 27_273_042_316_900;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
}

impl ImageKind {
    fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(ImageKind::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(ImageKind::Jpeg),
            "image/gif" => Some(ImageKind::Gif),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageKind::Png => "png",
            ImageKind::Jpeg => "jpeg",
            ImageKind::Gif => "gif",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Gif => "image/gif",
        }
    }
}

/// A decoded image ready to be stored under `word/media/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub kind: ImageKind,
    pub data: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl DecodedImage {
    /// Display extent in EMU, scaled down to fit `max_width`.
    ///
    /// `None` when either side is empty or too large for a drawing extent.
    pub fn extent_emu(&self, max_width: u64) -> Option<(u64, u64)> {
        let cx = u64::from(self.width_px) * EMU_PER_PIXEL;
        let cy = u64::from(self.height_px) * EMU_PER_PIXEL;
        let (cx, cy) = if cx <= max_width || cx == 0 {
            (cx, cy)
        } else {
            let scaled = u128::from(cy) * u128::from(max_width) / u128::from(cx);
            (max_width, u64::try_from(scaled).ok()?)
        };
        let fits = |v: u64| v > 0 && v <= MAX_EXTENT_EMU;
        (fits(cx) && fits(cy)).then_some((cx, cy))
    }
}

/// Decode a `data:` URL into an embeddable image.
///
/// The error is a human-readable reason for the skip warning.
pub fn decode_data_url(url: &str) -> Result<DecodedImage, &'static str> {
    let rest = url
        .trim()
        .strip_prefix("data:")
        .ok_or("not a data URL")?;
    let (header, payload) = rest.split_once(',').ok_or("malformed data URL")?;

    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default();
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let data: Vec<u8> = if is_base64 {
        let cleaned: Cow<'_, str> = if payload.contains(|c: char| c.is_ascii_whitespace()) {
            Cow::Owned(payload.split_ascii_whitespace().collect())
        } else {
            Cow::Borrowed(payload)
        };
        STANDARD
            .decode(cleaned.as_bytes())
            .map_err(|_| "invalid base64 payload")?
    } else {
        percent_decode(payload.as_bytes()).collect()
    };

    let sniffed = sniff(&data);
    let kind = sniffed
        .or_else(|| ImageKind::from_mime(mime))
        .ok_or("unsupported image type")?;
    let (width_px, height_px) = dimensions(kind, &data).ok_or("unreadable image header")?;
    if width_px == 0 || height_px == 0 {
        return Err("image has no pixels");
    }

    Ok(DecodedImage {
        kind,
        data,
        width_px,
        height_px,
    })
}

fn sniff(data: &[u8]) -> Option<ImageKind> {
    if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some(ImageKind::Png)
    } else if data.starts_with(&[0xFF, 0xD8]) {
        Some(ImageKind::Jpeg)
    } else if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some(ImageKind::Gif)
    } else {
        None
    }
}

/// Pixel size from the image header.
pub fn dimensions(kind: ImageKind, data: &[u8]) -> Option<(u32, u32)> {
    match kind {
        ImageKind::Png => {
            // Signature, IHDR length and tag, then width and height.
            if data.len() < 24 || &data[12..16] != b"IHDR" {
                return None;
            }
            let w = u32::from_be_bytes(data[16..20].try_into().ok()?);
            let h = u32::from_be_bytes(data[20..24].try_into().ok()?);
            Some((w, h))
        }
        ImageKind::Gif => {
            if data.len() < 10 {
                return None;
            }
            let w = u16::from_le_bytes([data[6], data[7]]);
            let h = u16::from_le_bytes([data[8], data[9]]);
            Some((u32::from(w), u32::from(h)))
        }
        ImageKind::Jpeg => jpeg_dimensions(data),
    }
}

/// Walk JPEG segments up to the first start-of-frame marker.
fn jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // Standalone markers carry no length.
        if marker == 0x01 || (0xD0..=0xD7).contains(&marker) {
            pos += 2;
            continue;
        }
        let len = usize::from(u16::from_be_bytes([data[pos + 2], data[pos + 3]]));
        let is_sof = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_sof {
            let seg = data.get(pos + 4..pos + 9)?;
            let h = u16::from_be_bytes([seg[1], seg[2]]);
            let w = u16::from_be_bytes([seg[3], seg[4]]);
            return Some((u32::from(w), u32::from(h)));
        }
        if len < 2 {
            return None;
        }
        pos += 2 + len;
    }
    None
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Minimal PNG header (signature + IHDR) for a `w`×`h` image.
    pub(crate) fn png_header(w: u32, h: u32) -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend_from_slice(&13u32.to_be_bytes());
        data.extend_from_slice(b"IHDR");
        data.extend_from_slice(&w.to_be_bytes());
        data.extend_from_slice(&h.to_be_bytes());
        data.extend_from_slice(&[8, 6, 0, 0, 0]);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data
    }

    pub(crate) fn png_data_url(w: u32, h: u32) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(png_header(w, h)))
    }

    #[test]
    fn test_decode_png_data_url() {
        let image = decode_data_url(&png_data_url(640, 480)).unwrap();
        assert_eq!(image.kind, ImageKind::Png);
        assert_eq!((image.width_px, image.height_px), (640, 480));
    }

    #[test]
    fn test_rejects_remote_and_unknown() {
        assert_eq!(
            decode_data_url("https://example.com/a.png"),
            Err("not a data URL")
        );
        assert_eq!(
            decode_data_url("data:image/png;base64,!!!"),
            Err("invalid base64 payload")
        );
        assert_eq!(
            decode_data_url("data:text/plain,hello"),
            Err("unsupported image type")
        );
    }

    #[test]
    fn test_gif_and_jpeg_headers() {
        let gif = [b"GIF89a".as_slice(), &[0x20, 0x01, 0x10, 0x00]].concat();
        assert_eq!(dimensions(ImageKind::Gif, &gif), Some((288, 16)));

        let jpeg = [
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0, empty
            0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0x2C, 0x02, 0x58, // SOF0 600x300
        ];
        assert_eq!(dimensions(ImageKind::Jpeg, &jpeg), Some((600, 300)));
    }

    #[test]
    fn test_extent_scales_to_max_width() {
        let image = decode_data_url(&png_data_url(1200, 600)).unwrap();
        assert_eq!(image.extent_emu(u64::MAX), Some((1200 * 9525, 600 * 9525)));
        assert_eq!(image.extent_emu(5_715_000), Some((5_715_000, 2_857_500)));
    }

    #[test]
    fn test_extent_of_huge_header_is_rejected() {
        let tall = decode_data_url(&png_data_url(1000, 2_000_000_000)).unwrap();
        assert_eq!(tall.extent_emu(6 * 914_400), None);

        let wide = decode_data_url(&png_data_url(u32::MAX, u32::MAX)).unwrap();
        assert_eq!(wide.extent_emu(6 * 914_400), Some((6 * 914_400, 6 * 914_400)));
        assert_eq!(wide.extent_emu(u64::MAX), None);
    }

    #[test]
    fn test_percent_encoded_payload() {
        let raw = png_header(2, 3);
        let encoded: String = raw.iter().map(|b| format!("%{b:02X}")).collect();
        let image = decode_data_url(&format!("data:image/png,{encoded}")).unwrap();
        assert_eq!((image.width_px, image.height_px), (2, 3));
    }
}
