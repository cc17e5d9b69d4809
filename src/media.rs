use std::path::Path;

use serde::{Deserialize, Serialize};

/// Photo and video extensions kept by `MediaOnly`
pub const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", // images
    "mp4", "mov", "avi", "mkv", "webm", "wmv", "3gp", // videos
];

/// Which files the walk hands to the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtensionFilter {
    /// Every regular file
    #[default]
    Any,
    /// Names ending in one of these extensions (case-insensitive, stored as ".ext")
    Only(Vec<String>),
    /// Common photo and video formats only (`MEDIA_EXTENSIONS`)
    MediaOnly,
}

impl ExtensionFilter {
    /// Build an `Only` filter from user input such as `["jpg", ".PNG"]`.
    pub fn only<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self::Only(
            extensions
                .iter()
                .map(|e| format!(".{}", e.as_ref().trim_start_matches('.').to_lowercase()))
                .collect(),
        )
    }

    pub fn accepts(&self, path: &Path) -> bool {
        match self {
            Self::Any => true,
            Self::Only(extensions) => {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    return false;
                };
                let name = name.to_lowercase();
                extensions.iter().any(|ext| name.ends_with(ext.as_str()))
            }
            Self::MediaOnly => is_media(path),
        }
    }
}

/// Check if the extension is one of the common photo or video formats
pub fn is_media(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| MEDIA_EXTENSIONS.contains(&e.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_filter() {
        let filter = ExtensionFilter::only(&["jpg", ".PNG"]);
        assert_eq!(filter, ExtensionFilter::Only(vec![".jpg".to_string(), ".png".to_string()]));
        assert!(filter.accepts(Path::new("a/20181128_110755.JPG")));
        assert!(filter.accepts(Path::new("shot.png")));
        assert!(!filter.accepts(Path::new("clip.mp4")));
        assert!(!filter.accepts(Path::new("notes_jpg")));
    }

    #[test]
    fn test_media_filter() {
        let filter = ExtensionFilter::MediaOnly;
        assert!(filter.accepts(Path::new("photo.jpeg")));
        assert!(filter.accepts(Path::new("clip.MP4")));
        assert!(filter.accepts(Path::new("clip.mov")));
        assert!(!filter.accepts(Path::new("readme.txt")));
        assert!(!filter.accepts(Path::new("script.py")));
        assert!(!filter.accepts(Path::new("no_extension")));
        assert!(filter.accepts(Path::new("VID_0001.3gp")));
        assert!(filter.accepts(Path::new("clip.wmv")));
    }

    #[test]
    fn test_media_filter_skips_other_image_types() {
        let filter = ExtensionFilter::MediaOnly;
        for name in ["logo.svg", "favicon.ico", "layers.psd", "photo.heic", "scan.webp"] {
            assert!(!filter.accepts(Path::new(name)), "{name} should be skipped");
        }
    }

    #[test]
    fn test_any_filter() {
        assert!(ExtensionFilter::Any.accepts(Path::new("anything.at.all")));
    }
}
