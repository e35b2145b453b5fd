//! MIME type helpers for stored images.

/// MIME type assumed when a filename carries no recognisable extension.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Extension used when a MIME type is unknown.
pub const DEFAULT_IMAGE_EXTENSION: &str = ".png";

/// Guess the MIME type of `filename` from its extension.
pub fn mime_from_filename(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string())
}

/// File extension (with leading dot) for an image MIME type.
pub fn extension_for_mime(mime_type: &str) -> String {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let known = match essence.as_str() {
        "image/png" => Some(".png"),
        "image/jpeg" | "image/jpg" => Some(".jpg"),
        "image/webp" => Some(".webp"),
        "image/gif" => Some(".gif"),
        "image/bmp" => Some(".bmp"),
        "image/tiff" => Some(".tiff"),
        "image/heic" => Some(".heic"),
        _ => None,
    };
    if let Some(ext) = known {
        return ext.to_string();
    }

    mime_guess::get_mime_extensions_str(&essence)
        .and_then(|exts| exts.first())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string())
}
