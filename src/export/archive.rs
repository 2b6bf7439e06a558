//! Archive assembly: named entries in, one byte blob out.
//!
//! [`ArchiveWriter`] is the seam; [`ZipArchiveWriter`] is the production
//! implementation on the `zip` crate. Images are stored as-is (they are
//! already compressed), text files are deflated, and scripts get `0o755`
//! so they can be run straight after unpacking on macOS and Linux.

use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Image,
    Text,
    Script,
}

/// One file of the export bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub name: String,
    pub bytes: Vec<u8>,
    pub kind: EntryKind,
}

impl ArchiveEntry {
    pub fn image(name: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.to_vec(),
            kind: EntryKind::Image,
        }
    }

    pub fn text(name: impl Into<String>, text: String) -> Self {
        Self {
            name: name.into(),
            bytes: text.into_bytes(),
            kind: EntryKind::Text,
        }
    }

    pub fn script(name: impl Into<String>, text: String) -> Self {
        Self {
            name: name.into(),
            bytes: text.into_bytes(),
            kind: EntryKind::Script,
        }
    }
}

/// Add named entries; finish into the final byte blob.
pub trait ArchiveWriter {
    fn add_entry(&mut self, entry: &ArchiveEntry) -> Result<(), ArchiveError>;
    fn finish(self) -> Result<Vec<u8>, ArchiveError>;
}

/// In-memory zip archive.
pub struct ZipArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl ZipArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn options_for(kind: EntryKind) -> FileOptions {
    let options = FileOptions::default();
    match kind {
        EntryKind::Image => options
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644),
        EntryKind::Text => options
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644),
        EntryKind::Script => options
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o755),
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn add_entry(&mut self, entry: &ArchiveEntry) -> Result<(), ArchiveError> {
        self.zip
            .start_file(entry.name.as_str(), options_for(entry.kind))?;
        self.zip.write_all(&entry.bytes)?;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, ArchiveError> {
        let cursor = self.zip.finish()?;
        Ok(cursor.into_inner())
    }
}

/// Write every entry in order and finish. On error the partial archive is
/// dropped with the writer.
pub fn assemble<W: ArchiveWriter>(
    mut writer: W,
    entries: &[ArchiveEntry],
) -> Result<Vec<u8>, ArchiveError> {
    for entry in entries {
        writer.add_entry(entry)?;
    }
    writer.finish()
}
