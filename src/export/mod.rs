//! Export: completed queue entries → one downloadable zip bundle.
//!
//! ## Bundle contents
//!
//! | Entry | When |
//! |---|---|
//! | `<result file name>` per completed image | always |
//! | `metadata.csv` | always |
//! | `ssh-config.txt` (plaintext password) | SSH configured |
//! | `import.sh`, `import.bat` | always |
//! | `import.ps1` | SSH configured |
//! | `wp-setup.sh`, `wp-setup.bat` | SSH configured |
//! | `README.txt` | SSH configured |
//!
//! Entries are added in that order. The scripts and README refer to each other
//! by these exact names. The archive itself is named
//! `<prefix>-<YYYY-MM-DD>.zip` by [`archive_file_name`].
//!
//! ## Guards
//!
//! Checked before any archive work, in this order:
//!
//! 1. another export still running → [`ExportError::Busy`]
//! 2. no completed images → [`ExportError::NothingToExport`]
//! 3. SSH configured without a password → [`ExportError::MissingPassword`]
//!
//! Building the entry list is pure. Only [`archive::assemble`] can fail after
//! the guards, and its failure is reported as one [`ExportError::Assembly`]
//! with nothing returned.
//!
//! ## Credentials
//!
//! The SSH password is written to `ssh-config.txt` in plain text so
//! `import.sh` can feed it to `sshpass`. The file carries a warning header and
//! the README tells the user to delete it.

pub mod archive;
pub mod csv;
pub mod dialect;
pub mod scripts;

use crate::metadata::ImageMetadata;
use crate::queue::QueueStore;
use crate::settings::SshSettings;
use archive::{ArchiveEntry, ArchiveError, ArchiveWriter, ZipArchiveWriter, assemble};
use chrono::NaiveDate;
use dialect::Dialect;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

pub const DEFAULT_ARCHIVE_PREFIX: &str = "wordpress-images";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No processed images to export")]
    NothingToExport,
    #[error("SSH is configured but no password is set")]
    MissingPassword,
    #[error("An export is already in progress")]
    Busy,
    #[error("Export failed: {0}")]
    Assembly(#[from] ArchiveError),
}

/// A completed image as seen by the export step.
#[derive(Debug, Clone, Copy)]
pub struct ExportItem<'a> {
    pub file_name: &'a str,
    pub metadata: &'a ImageMetadata,
    pub tags: &'a [String],
    pub bytes: &'a [u8],
}

/// Completed entries of `queue`, in queue order.
pub fn export_items(queue: &QueueStore) -> Vec<ExportItem<'_>> {
    queue
        .completed()
        .map(|(entry, output)| ExportItem {
            file_name: &output.file_name,
            metadata: entry.metadata(),
            tags: entry.tags().as_slice(),
            bytes: &output.bytes,
        })
        .collect()
}

/// `<prefix>-YYYY-MM-DD.zip`
pub fn archive_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}-{}.zip", prefix, date.format("%Y-%m-%d"))
}

/// Every entry of the bundle, in archive order.
///
/// Scripts and README are derived from the items alone. An image completed
/// before the output format changed keeps its old extension, and the upload
/// step covers every extension present.
pub fn build_entries(items: &[ExportItem<'_>], ssh: &SshSettings) -> Vec<ArchiveEntry> {
    let remote = ssh.is_configured().then_some(ssh);

    let mut entries: Vec<ArchiveEntry> = items
        .iter()
        .map(|item| ArchiveEntry::image(item.file_name, item.bytes))
        .collect();

    let extensions = scripts::upload_extensions(items);
    if extensions.len() > 1 {
        log::info!("Bundle mixes formats: {}", extensions.join(", "));
    }

    entries.push(ArchiveEntry::text(csv::CSV_FILE_NAME, csv::metadata_csv(items)));

    if let Some(ssh) = remote {
        entries.push(ArchiveEntry::text(
            scripts::SSH_CONFIG_FILE_NAME,
            scripts::ssh_config(ssh),
        ));
    }

    for dialect in Dialect::ALL {
        if dialect == Dialect::PowerShell && remote.is_none() {
            continue;
        }
        entries.push(ArchiveEntry::script(
            scripts::import_script_name(dialect),
            scripts::import_script(dialect, items, remote),
        ));
    }

    if let Some(ssh) = remote {
        for dialect in [Dialect::Posix, Dialect::Batch] {
            entries.push(ArchiveEntry::script(
                scripts::setup_script_name(dialect),
                scripts::setup_script(dialect, ssh),
            ));
        }
        entries.push(ArchiveEntry::text(
            scripts::README_FILE_NAME,
            scripts::readme(ssh, items),
        ));
    }

    entries
}

/// A finished bundle ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBundle {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub image_count: usize,
    pub entry_names: Vec<String>,
}

/// Builds export bundles, one at a time.
#[derive(Debug)]
pub struct Exporter {
    prefix: String,
    in_flight: AtomicBool,
}

/// Clears the in-flight flag when dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Exporter {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_ARCHIVE_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(&self.in_flight))
    }

    /// Export every completed entry of `queue` as a zip bundle.
    pub fn export(
        &self,
        queue: &QueueStore,
        ssh: &SshSettings,
        date: NaiveDate,
    ) -> Result<ExportBundle, ExportError> {
        self.export_with(ZipArchiveWriter::new(), queue, ssh, date)
    }

    /// Like [`Exporter::export`], with a caller-supplied archive writer.
    pub fn export_with<W: ArchiveWriter>(
        &self,
        writer: W,
        queue: &QueueStore,
        ssh: &SshSettings,
        date: NaiveDate,
    ) -> Result<ExportBundle, ExportError> {
        let Some(_guard) = self.try_begin() else {
            return Err(ExportError::Busy);
        };

        let items = export_items(queue);
        if items.is_empty() {
            return Err(ExportError::NothingToExport);
        }
        if ssh.is_configured() && !ssh.has_password() {
            return Err(ExportError::MissingPassword);
        }

        let entries = build_entries(&items, ssh);
        let bytes = assemble(writer, &entries).map_err(|e| {
            log::error!("Archive assembly failed: {}", e);
            ExportError::Assembly(e)
        })?;

        let file_name = archive_file_name(&self.prefix, date);
        log::info!(
            "Exported {} image(s) into {} ({} entries, {} bytes)",
            items.len(),
            file_name,
            entries.len(),
            bytes.len()
        );
        Ok(ExportBundle {
            file_name,
            bytes,
            image_count: items.len(),
            entry_names: entries.into_iter().map(|e| e.name).collect(),
        })
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new()
    }
}
