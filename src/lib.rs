//! # WP Image Optimiser
//!
//! Batch image optimiser for WordPress media libraries. Load a set of images,
//! tag them, compress them to one output format, and download a single zip
//! that carries the optimised files plus everything needed to import them
//! into WordPress with WP-CLI.
//!
//! # Architecture: Queue → Process → Export
//!
//! ```text
//! 1. Queue     files     →  QueueStore        (pending entries with tags and metadata)
//! 2. Process   queue     →  completed entries (sequential, one compressor call each)
//! 3. Export    completed →  <prefix>-<date>.zip (images, metadata.csv, import scripts)
//! ```
//!
//! Settings live outside that flow in a [`settings::SettingsService`] backed by
//! a [`storage::KeyValueStore`], so the same code runs against an in-memory
//! map in tests and a state directory on disk in the CLI.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`storage`] | Key-value storage port with in-memory and directory backends |
//! | [`settings`] | Processing, SSH and tag settings with load/save and legacy migration |
//! | [`taxonomy`] | Tag lists and the arena-indexed WordPress category tree |
//! | [`naming`] | Output file names: stem stripping, tag suffix, canonical extension |
//! | [`metadata`] | Per-image title/alt/caption/description and sidecar descriptions |
//! | [`queue`] | Image queue: ids, per-status state, buffer release accounting |
//! | [`imaging`] | `Compressor` seam and the pure-Rust `image` crate backend |
//! | [`process`] | Processing engine: single-image transition and sequential batches |
//! | [`export`] | Zip bundle: CSV, per-shell escaping, import/setup scripts, README |
//! | [`scan`] | CLI input collection from files and directories |
//! | [`session`] | Façade tying settings, queue, engine and exporter together |
//! | [`output`] | CLI output formatting: pure `format_*` plus `print_*` wrappers |
//!
//! # Design Decisions
//!
//! ## Result Travels With the State
//!
//! A completed entry is `ImageState::Completed(ProcessedOutput)`. There is no
//! separate "result" slot that could be set on a pending entry or left behind
//! on a failed one, and leaving `Completed` drops the result bytes with it.
//!
//! ## Sequential Processing
//!
//! Images are processed one after another. Progress stays easy to follow, at
//! most one decoded image is held at a time, and an entry's outcome is always
//! recorded before the next one starts.
//!
//! ## One Remote Command, Three Local Shells
//!
//! The import command that runs on the server is always a POSIX command line.
//! Each local script (`import.sh`, `import.bat`, `import.ps1`) embeds that
//! same string using its own quoting rule. Escaping is owned by the
//! [`export::dialect::ShellSyntax`] implementations and never done ad hoc in
//! the templates.
//!
//! ## Pure-Rust Imaging
//!
//! The [`imaging`] module uses the `image` crate (Lanczos3 resampling and
//! pure-Rust JPEG, PNG and WebP codecs). No system libraries are needed.

pub mod export;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod queue;
pub mod scan;
pub mod session;
pub mod settings;
pub mod storage;
pub mod taxonomy;

#[cfg(test)]
pub(crate) mod test_helpers;
