//! Per-image metadata: title, alt text, caption, description.
//!
//! ## Defaults
//!
//! When a file is loaded, title and alt text both default to the filename
//! without its extension (`001-sunset.jpg` → `001-sunset`). Caption and
//! description start empty. All four are free text afterwards; edits arrive as
//! [`MetadataPatch`]es that touch only the fields they carry.
//!
//! ## Sidecar descriptions
//!
//! The CLI picks up a sidecar text file with the same stem as the image
//! (`001-sunset.txt` next to `001-sunset.jpg`) as the initial description.
//!
//! ## WordPress import flags
//!
//! Each field maps to one `wp media import` flag. Empty fields are omitted
//! from the command entirely rather than passed as empty strings:
//!
//! | Field | Flag | CSV column |
//! |---|---|---|
//! | title | `--title` | `title` |
//! | alt text | `--alt` | `alt` |
//! | caption | `--caption` | `caption` |
//! | description | `--desc` | `description` |

use crate::naming::strip_extension;
use std::path::Path;

/// Editable metadata attached to a queued image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    pub title: String,
    pub alt_text: String,
    pub caption: String,
    pub description: String,
}

impl ImageMetadata {
    /// Initial metadata for a freshly loaded file.
    pub fn for_file(filename: &str) -> Self {
        let stem = strip_extension(filename);
        Self {
            title: stem.to_string(),
            alt_text: stem.to_string(),
            caption: String::new(),
            description: String::new(),
        }
    }

    /// Apply a partial update.
    pub fn apply(&mut self, patch: MetadataPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(alt_text) = patch.alt_text {
            self.alt_text = alt_text;
        }
        if let Some(caption) = patch.caption {
            self.caption = caption;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
    }

    /// `(flag, value)` pairs for `wp media import`, skipping empty fields.
    pub fn import_flags(&self) -> Vec<(&'static str, &str)> {
        [
            ("--title", self.title.as_str()),
            ("--alt", self.alt_text.as_str()),
            ("--caption", self.caption.as_str()),
            ("--desc", self.description.as_str()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
    }
}

/// Partial metadata update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataPatch {
    pub title: Option<String>,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub description: Option<String>,
}

impl MetadataPatch {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn description(value: impl Into<String>) -> Self {
        Self {
            description: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.alt_text.is_none()
            && self.caption.is_none()
            && self.description.is_none()
    }
}

/// Read a sidecar `.txt` file for an image.
///
/// Given `photos/001-sunset.jpg`, looks for `photos/001-sunset.txt` and
/// returns its trimmed contents. Returns `None` if the file doesn't exist or
/// is empty.
pub fn read_sidecar(image_path: &Path) -> Option<String> {
    let sidecar = image_path.with_extension("txt");
    std::fs::read_to_string(sidecar)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
