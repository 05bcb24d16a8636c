use std::path::Path;

pub const GIF_MIME: &str = "image/gif";
pub const WEBP_MIME: &str = "image/webp";
/// Placeholder type the host's converter ignores.
pub const OPAQUE_MIME: &str = "application/octet-stream";

pub const GIF_EXTENSION: &str = "gif";
pub const WEBP_EXTENSION: &str = "webp";

const STATIC_RASTER_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "webp", "tif", "tiff", "bmp", "avif",
];

/// Transcoding path chosen for an incoming byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    AnimatedRaster,
    StaticRaster,
    Other,
}

impl MediaFormat {
    pub fn is_animated(&self) -> bool {
        matches!(self, MediaFormat::AnimatedRaster)
    }
}

/// Lowercased extension of `filename`, if any.
pub fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// True when the declared type carries no information about the encoding.
pub fn is_generic_mime(mime_type: &str) -> bool {
    let mime_type = mime_type.trim();
    mime_type.is_empty() || mime_type.eq_ignore_ascii_case(OPAQUE_MIME)
}

pub fn is_static_raster_extension(ext: &str) -> bool {
    STATIC_RASTER_EXTENSIONS.contains(&ext)
}

/// Swaps the last extension of `filename` for `ext`. Names that already carry `ext`
/// (any case) are returned as-is; names without an extension get it appended.
pub fn replace_extension(filename: &str, ext: &str) -> String {
    if extension(filename).as_deref() == Some(ext) {
        return filename.to_string();
    }

    match filename.rfind('.') {
        Some(idx) if idx > 0 && !filename[idx..].contains('/') => {
            format!("{}.{}", &filename[..idx], ext)
        }
        _ => format!("{}.{}", filename, ext),
    }
}

/// `filename` with `-n` inserted before the extension; `n == 0` is the name itself.
pub fn numbered_name(filename: &str, n: u32) -> String {
    if n == 0 {
        return filename.to_string();
    }

    match filename.rfind('.') {
        Some(idx) if idx > 0 && !filename[idx..].contains('/') => {
            format!("{}-{}{}", &filename[..idx], n, &filename[idx..])
        }
        _ => format!("{}-{}", filename, n),
    }
}
