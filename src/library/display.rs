use std::path::Path;

use crate::config::TrackDisplayField;

/// Build a track's display name according to the provided `fields` and separator.
///
/// Empty or missing fields are skipped. When nothing is produced the file name
/// is used, so every track has a non-empty name to sort by.
pub fn display_from_fields(
    path: &Path,
    title: Option<&str>,
    artist: Option<&str>,
    album: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let file_name = || path.file_name().and_then(|s| s.to_str());

    let parts: Vec<&str> = fields
        .iter()
        .filter_map(|f| match f {
            TrackDisplayField::Filename => file_name(),
            TrackDisplayField::Stem => path.file_stem().and_then(|s| s.to_str()),
            TrackDisplayField::Title => title,
            TrackDisplayField::Artist => artist,
            TrackDisplayField::Album => album,
        })
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if parts.is_empty() {
        file_name().unwrap_or("Unknown").to_string()
    } else {
        parts.join(sep)
    }
}

/// Best-effort MIME type from the file extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "ogg" | "oga" => "audio/ogg",
        "opus" => "audio/opus",
        "m4a" | "mp4" | "aac" => "audio/mp4",
        _ => "audio/*",
    }
}
