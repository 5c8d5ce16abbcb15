//! Content-type detection for fetched payloads.

/// Sniff a content type from the leading bytes of a payload.
pub fn sniff_content_type(bytes: &[u8]) -> Option<&'static str> {
    let starts = |sig: &[u8]| bytes.starts_with(sig);

    if starts(b"\x89PNG\r\n\x1a\n") {
        return Some("image/png");
    }
    if starts(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }
    if starts(b"GIF87a") || starts(b"GIF89a") {
        return Some("image/gif");
    }
    if bytes.len() >= 12 && starts(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }
    if starts(b"OggS") {
        return Some("audio/ogg");
    }
    if starts(b"ID3") || (bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0) {
        return Some("audio/mpeg");
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return match &bytes[8..12] {
            b"qt  " => Some("video/quicktime"),
            b"M4A " => Some("audio/mp4"),
            _ => Some("video/mp4"),
        };
    }
    if starts(b"%PDF-") {
        return Some("application/pdf");
    }
    None
}

/// Content type implied by a file name's extension.
pub fn content_type_from_file_name(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    let ct = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(ct)
}

/// Pick the most specific content type available.
///
/// A declared type wins unless it is missing or the generic
/// `application/octet-stream`; then the bytes, then the file name decide.
pub fn resolve_content_type(
    declared: Option<&str>,
    bytes: &[u8],
    file_name: Option<&str>,
) -> Option<String> {
    let declared = declared
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .filter(|ct| !ct.is_empty());

    match declared {
        Some(ct) if ct != "application/octet-stream" => Some(ct),
        other => sniff_content_type(bytes)
            .or_else(|| file_name.and_then(content_type_from_file_name))
            .map(str::to_string)
            .or(other),
    }
}
