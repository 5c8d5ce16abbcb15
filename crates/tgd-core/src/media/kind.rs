//! Outbound payload classification and the kind → Bot API method table.

/// Delivery shape for a fetched media payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    Image,
    Video,
    Audio,
    Animation,
    Document,
}

impl PayloadKind {
    /// File name used when the fetch did not supply one.
    pub fn default_file_name(self) -> &'static str {
        match self {
            PayloadKind::Image => "image.jpg",
            PayloadKind::Video => "video.mp4",
            PayloadKind::Audio => "audio.ogg",
            PayloadKind::Animation => "animation.gif",
            PayloadKind::Document => "file.bin",
        }
    }
}

/// Top-level MIME class mapping (no animation detection).
pub fn kind_from_mime(content_type: Option<&str>) -> PayloadKind {
    let Some(ct) = content_type else {
        return PayloadKind::Document;
    };
    let ct = ct.trim().to_ascii_lowercase();
    if ct.starts_with("image/") {
        PayloadKind::Image
    } else if ct.starts_with("video/") {
        PayloadKind::Video
    } else if ct.starts_with("audio/") {
        PayloadKind::Audio
    } else {
        PayloadKind::Document
    }
}

/// GIFs loop on Telegram only when sent as animations.
pub fn is_gif_media(content_type: Option<&str>, file_name: Option<&str>) -> bool {
    let by_type = content_type
        .map(|ct| essence(ct).eq_ignore_ascii_case("image/gif"))
        .unwrap_or(false);
    let by_name = file_name
        .map(|n| n.trim().to_ascii_lowercase().ends_with(".gif"))
        .unwrap_or(false);
    by_type || by_name
}

/// Classify a fetched payload. Animation wins over the MIME class.
pub fn classify(content_type: Option<&str>, file_name: Option<&str>) -> PayloadKind {
    if is_gif_media(content_type, file_name) {
        return PayloadKind::Animation;
    }
    kind_from_mime(content_type)
}

fn essence(content_type: &str) -> &str {
    content_type.split(';').next().unwrap_or("").trim()
}

/// Bot API send method for a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SendMethod {
    Photo,
    Video,
    Animation,
    Audio,
    Voice,
    Document,
}

impl SendMethod {
    /// Audio goes out as a voice bubble only when asked; plain audio files are the default.
    pub fn for_kind(kind: PayloadKind, as_voice: bool) -> Self {
        match (kind, as_voice) {
            (PayloadKind::Image, _) => SendMethod::Photo,
            (PayloadKind::Video, _) => SendMethod::Video,
            (PayloadKind::Animation, _) => SendMethod::Animation,
            (PayloadKind::Audio, true) => SendMethod::Voice,
            (PayloadKind::Audio, false) => SendMethod::Audio,
            (PayloadKind::Document, _) => SendMethod::Document,
        }
    }

    /// Label used in retry logs and error messages.
    pub fn label(self) -> &'static str {
        match self {
            SendMethod::Photo => "photo",
            SendMethod::Video => "video",
            SendMethod::Animation => "animation",
            SendMethod::Audio => "audio",
            SendMethod::Voice => "voice",
            SendMethod::Document => "document",
        }
    }
}
