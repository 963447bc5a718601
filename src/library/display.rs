use crate::config::TrackDisplayField;
use crate::model::TrackMetadata;

/// Build a display string for a track according to the provided `fields` and separator.
///
/// This composes metadata fields (artist, title, album, filename, path) in the
/// configured order and falls back to the track's best name when no parts
/// were produced.
pub fn display_from_fields(meta: &TrackMetadata, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    for f in fields {
        match f {
            TrackDisplayField::Display => parts.push(meta.display_title()),
            TrackDisplayField::Title => parts.push(meta.title_or_name().to_string()),
            TrackDisplayField::Artist => {
                if let Some(a) = meta.artist() {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Album => {
                if let Some(a) = meta.album() {
                    parts.push(a.to_string());
                }
            }
            TrackDisplayField::Filename => {
                let stem = meta.path.file_stem();
                if !stem.trim().is_empty() {
                    parts.push(stem.to_string());
                }
            }
            TrackDisplayField::Path => parts.push(meta.path.to_string()),
        }
    }

    if parts.is_empty() {
        meta.title_or_name().to_string()
    } else {
        parts.join(sep)
    }
}
