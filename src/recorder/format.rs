//! Container negotiation and download naming.

/// Formats tried in order before falling back to the platform default.
pub const PREFERRED_FORMATS: [&str; 4] = [
    "audio/webm;codecs=opus",
    "audio/ogg;codecs=opus",
    "audio/mp4",
    "audio/webm",
];

/// First preferred format the platform supports, or `None` for its default.
pub fn negotiate_format(is_supported: impl Fn(&str) -> bool) -> Option<&'static str> {
    PREFERRED_FORMATS
        .iter()
        .copied()
        .find(|mime| is_supported(mime))
}

/// File extension for the MIME type an encoder actually produced.
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let mime = mime_type.to_ascii_lowercase();
    if mime.contains("mp4") {
        "m4a"
    } else if mime.contains("ogg") {
        "ogg"
    } else if mime.contains("wav") {
        "wav"
    } else {
        "webm"
    }
}

/// `<app>-<unix epoch ms>.<ext>`
pub fn file_name(app_name: &str, epoch_ms: u128, mime_type: &str) -> String {
    format!("{app_name}-{epoch_ms}.{}", extension_for_mime(mime_type))
}
