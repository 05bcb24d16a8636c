use crate::domain::models::format::{
    extension, is_generic_mime, is_static_raster_extension, MediaFormat, GIF_EXTENSION, GIF_MIME,
};

const SVG_MIME: &str = "image/svg+xml";

/// Decides the transcoding path from the declared type and the filename.
///
/// A GIF type or a `.gif` extension always wins, so an animated file declared as
/// something generic is never handed to a single-frame converter.
pub fn classify(mime_type: &str, filename: &str) -> MediaFormat {
    let mime = essence(mime_type);
    let ext = extension(filename);

    if mime == GIF_MIME || ext.as_deref() == Some(GIF_EXTENSION) {
        return MediaFormat::AnimatedRaster;
    }

    if is_generic_mime(&mime) {
        return match ext {
            Some(ext) if is_static_raster_extension(&ext) => MediaFormat::StaticRaster,
            _ => MediaFormat::Other,
        };
    }

    if mime.starts_with("image/") && mime != SVG_MIME {
        MediaFormat::StaticRaster
    } else {
        MediaFormat::Other
    }
}

/// Replaces every run of whitespace with a single hyphen.
pub fn normalize_filename(filename: &str) -> String {
    let mut normalized = String::with_capacity(filename.len());
    let mut in_whitespace = false;

    for c in filename.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                normalized.push('-');
                in_whitespace = true;
            }
        } else {
            normalized.push(c);
            in_whitespace = false;
        }
    }

    normalized
}

/// Lowercased type without parameters (`image/GIF; foo=bar` -> `image/gif`).
fn essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
