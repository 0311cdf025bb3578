/// File extension for a signature image upload, derived from the multipart
/// field's content type. Unknown types fall back through `mime_guess`, then
/// to a neutral extension.
pub fn signature_image_extension(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        Some("image/webp") => "webp",
        Some("image/gif") => "gif",
        Some(other) => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
        None => "png",
    }
}

/// Display filename for a pinned signature image.
pub fn signature_filename(number: &str, timestamp_millis: i64, ext: &str) -> String {
    format!("signature-{number}-{timestamp_millis}.{ext}")
}

/// Display filename for a pinned or downloaded delivery note PDF.
pub fn pdf_filename(number: &str, timestamp_millis: i64) -> String {
    format!("deliverynote-{number}-{timestamp_millis}.pdf")
}
