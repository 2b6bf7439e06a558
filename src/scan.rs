//! Input collection for the command line.
//!
//! Turns the paths given on the command line into queue-ready source files.
//!
//! ## Rules
//!
//! - A file argument must have a supported image extension (`jpg`, `jpeg`,
//!   `png`, `tif`, `tiff`, `webp`; case-insensitive), otherwise the scan fails.
//! - A directory argument is walked recursively. Images are picked up in
//!   sorted path order; other files and hidden entries (`.name`) are skipped.
//! - Arguments keep their command-line order, and a path named twice is only
//!   loaded once.
//! - Ending up with no images at all is an error ("no files selected").
//!
//! ## Sidecar descriptions
//!
//! `photo.txt` next to `photo.jpg` becomes the initial description of that
//! image (see [`crate::metadata::read_sidecar`]).

use crate::imaging::supported_input_extensions;
use crate::metadata::read_sidecar;
use crate::queue::SourceFile;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Path not found: {0}")]
    NotFound(PathBuf),
    #[error("Not a supported image file: {0}")]
    Unsupported(PathBuf),
    #[error("No image files selected")]
    NoImages,
}

/// An image read from disk, with its optional sidecar description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedImage {
    pub path: PathBuf,
    pub source: SourceFile,
    pub description: Option<String>,
}

pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| supported_input_extensions().contains(&ext.as_str()))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Expand files and directories into image paths.
pub fn collect_image_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, ScanError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut push = |path: PathBuf| {
        if !paths.contains(&path) {
            paths.push(path);
        }
    };

    for input in inputs {
        if input.is_dir() {
            let walker = WalkDir::new(input)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
            for entry in walker {
                let entry = entry?;
                if entry.file_type().is_file() && is_image(entry.path()) {
                    push(entry.into_path());
                }
            }
        } else if input.is_file() {
            if !is_image(input) {
                return Err(ScanError::Unsupported(input.clone()));
            }
            push(input.clone());
        } else {
            return Err(ScanError::NotFound(input.clone()));
        }
    }

    if paths.is_empty() {
        return Err(ScanError::NoImages);
    }
    log::debug!("Collected {} image(s)", paths.len());
    Ok(paths)
}

/// Collect and read every image named by `inputs`.
pub fn scan_inputs(inputs: &[PathBuf]) -> Result<Vec<ScannedImage>, ScanError> {
    collect_image_paths(inputs)?
        .into_iter()
        .map(|path| -> Result<ScannedImage, ScanError> {
            let source = SourceFile::read(&path)?;
            let description = read_sidecar(&path);
            Ok(ScannedImage {
                path,
                source,
                description,
            })
        })
        .collect()
}
