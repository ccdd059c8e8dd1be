//! Image upload schema.
//!
//! Example images are posted as JSON with a base64 payload, either bare or
//! as a `data:image/<type>;base64,` URL. The image type is sniffed from the
//! decoded bytes and must agree with a declared data URL type.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;

use poster_studio_core::{ValidationError, Validator};

/// Maximum filename length before sanitizing.
pub const MAX_FILENAME_LENGTH: usize = 255;

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Raw upload body. Both fields are required at the JSON level.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
    pub image: String,
    pub filename: String,
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Png,
    Jpeg,
    Webp,
}

impl ImageType {
    /// MIME type sent with the upload.
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }

    fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(PNG_MAGIC) {
            Some(Self::Png)
        } else if bytes.starts_with(JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(b"WEBP".as_slice()) {
            Some(Self::Webp)
        } else {
            None
        }
    }

    fn from_subtype(subtype: &str) -> Option<Self> {
        match subtype.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// A validated image ready for object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub image_type: ImageType,
    /// Sanitized to `[A-Za-z0-9._-]`, never starting with `.`.
    pub filename: String,
}

impl UploadBody {
    /// Decode and validate the upload.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` on `image` and/or `filename`.
    pub fn validate(&self, max_bytes: usize) -> Result<ImageUpload, ValidationError> {
        let mut v = Validator::new();
        let image = decode_image(&mut v, &self.image, max_bytes);
        let filename = sanitize_filename(&mut v, &self.filename);

        match (image, filename) {
            (Some((bytes, image_type)), Some(filename)) => Ok(ImageUpload {
                bytes,
                image_type,
                filename,
            }),
            _ => Err(v.into_error()),
        }
    }
}

fn decode_image(v: &mut Validator, raw: &str, max_bytes: usize) -> Option<(Vec<u8>, ImageType)> {
    let raw = raw.trim();
    let (declared, payload) = match raw.strip_prefix("data:") {
        Some(rest) => {
            let Some((meta, payload)) = rest.split_once(',') else {
                v.push("image", "data URL has no payload");
                return None;
            };
            let declared = meta
                .strip_suffix(";base64")
                .and_then(|mime| mime.strip_prefix("image/"))
                .and_then(ImageType::from_subtype);
            if declared.is_none() {
                v.push("image", "must be a base64 PNG, JPEG or WebP data URL");
                return None;
            }
            (declared, payload)
        }
        None => (None, raw),
    };

    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let Ok(bytes) = STANDARD.decode(compact.as_bytes()) else {
        v.push("image", "must be valid base64");
        return None;
    };

    if bytes.is_empty() {
        v.push("image", "cannot be empty");
        return None;
    }
    if bytes.len() > max_bytes {
        v.push("image", format!("must be at most {max_bytes} bytes"));
        return None;
    }

    let Some(image_type) = ImageType::sniff(&bytes) else {
        v.push("image", "must be a PNG, JPEG or WebP image");
        return None;
    };
    if declared.is_some_and(|d| d != image_type) {
        v.push("image", "content does not match the declared image type");
        return None;
    }

    Some((bytes, image_type))
}

fn sanitize_filename(v: &mut Validator, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        v.push("filename", "cannot be empty");
        return None;
    }
    if raw.chars().count() > MAX_FILENAME_LENGTH {
        v.push(
            "filename",
            format!("must be at most {MAX_FILENAME_LENGTH} characters"),
        );
        return None;
    }

    // Drop any client-side directory part.
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = sanitized.trim_start_matches('.');

    if sanitized.is_empty() {
        v.push("filename", "must contain a usable name");
        return None;
    }
    Some(sanitized.to_owned())
}
