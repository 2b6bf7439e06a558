//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Queue
//!
//! ```text
//! Queue (3 images)
//! 001 a.png (2.4 KB) [Hero]
//!     Status: completed → a [Hero].webp (812 Bytes, 67% smaller)
//! 002 b.jpg (1.1 MB)
//!     Status: error: decode failed
//! ```
//!
//! ## Process
//!
//! ```text
//! [1/2] a.png
//!     a [Hero].webp: 2.4 KB → 812 Bytes (67% smaller)
//! [2/2] b.jpg
//!     Failed: Decode failed: ...
//! Processed 2 images: 1 completed, 1 failed
//! ```
//!
//! ## Export
//!
//! ```text
//! wordpress-images-2025-01-31.zip (1 images, 48.2 KB)
//!     a [Hero].webp
//!     metadata.csv
//!     import.sh
//!     import.bat
//! ```
//!
//! ## Category tree
//!
//! ```text
//! Products
//!     Shoes
//!         Running
//! Blog
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::export::ExportBundle;
use crate::process::ProcessEvent;
use crate::queue::{ImageState, QueueStore};
use crate::settings::{ProcessingSettings, SshSettings};
use crate::taxonomy::{CategoryTree, TagList, TagSettings};

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Human-readable byte size: `0 Bytes`, `812 Bytes`, `1.5 KB`, `2 MB`.
///
/// Powers of 1024, at most two decimals, trailing zeros dropped.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[unit])
}

/// Size reduction in whole percent; negative when the output grew.
pub fn savings_percent(original: usize, output: usize) -> i64 {
    if original == 0 {
        return 0;
    }
    let saved = original as f64 - output as f64;
    (saved / original as f64 * 100.0).round() as i64
}

fn savings_label(original: usize, output: usize) -> String {
    let pct = savings_percent(original, output);
    if pct >= 0 {
        format!("{}% smaller", pct)
    } else {
        format!("{}% larger", -pct)
    }
}

fn size_change(original: usize, output: usize) -> String {
    format!(
        "{} → {} ({})",
        format_size(original),
        format_size(output),
        savings_label(original, output)
    )
}

fn join_tags(tags: &TagList) -> String {
    tags.iter().collect::<Vec<_>>().join(", ")
}

// ============================================================================
// Queue
// ============================================================================

/// `Queue (N images)` followed by one block per entry.
pub fn format_queue(queue: &QueueStore) -> Vec<String> {
    let mut lines = vec![format!("Queue ({} images)", queue.len())];
    for (i, entry) in queue.iter().enumerate() {
        let mut header = format!(
            "{} {} ({})",
            format_index(i + 1),
            entry.source_name(),
            format_size(entry.source_size())
        );
        if !entry.tags().is_empty() {
            header.push_str(&format!(" [{}]", join_tags(entry.tags())));
        }
        lines.push(header);

        let status = match entry.state() {
            ImageState::Completed(output) => format!(
                "completed → {} ({}, {})",
                output.file_name,
                format_size(output.size()),
                savings_label(entry.source_size(), output.size())
            ),
            ImageState::Error(reason) => format!("error: {}", reason),
            other => other.status().to_string(),
        };
        lines.push(format!("{}Status: {}", indent(1), status));
    }
    lines
}

pub fn print_queue(queue: &QueueStore) {
    for line in format_queue(queue) {
        println!("{}", line);
    }
}

// ============================================================================
// Process
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            source_name,
            index,
            total,
            ..
        } => vec![format!("[{}/{}] {}", index, total, source_name)],
        ProcessEvent::Completed {
            file_name,
            original_size,
            output_size,
            ..
        } => vec![format!(
            "{}{}: {}",
            indent(1),
            file_name,
            size_change(*original_size, *output_size)
        )],
        ProcessEvent::Failed { reason, .. } => {
            vec![format!("{}Failed: {}", indent(1), reason)]
        }
        ProcessEvent::BatchFinished(summary) => vec![format!(
            "Processed {} images: {} completed, {} failed",
            summary.attempted, summary.completed, summary.failed
        )],
    }
}

// ============================================================================
// Export
// ============================================================================

/// Archive name, image count and total size, then every entry.
pub fn format_export(bundle: &ExportBundle) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} images, {})",
        bundle.file_name,
        bundle.image_count,
        format_size(bundle.bytes.len())
    )];
    lines.extend(
        bundle
            .entry_names
            .iter()
            .map(|name| format!("{}{}", indent(1), name)),
    );
    lines
}

pub fn print_export(bundle: &ExportBundle) {
    for line in format_export(bundle) {
        println!("{}", line);
    }
}

// ============================================================================
// Settings
// ============================================================================

/// Both settings groups. The password is never echoed.
pub fn format_settings(processing: &ProcessingSettings, ssh: &SshSettings) -> Vec<String> {
    let or_unset = |value: &str| {
        if value.trim().is_empty() {
            "(not set)".to_string()
        } else {
            value.to_string()
        }
    };
    let password = if ssh.has_password() { "(set)" } else { "(not set)" };
    let port = if ssh.port == 0 {
        format!("{} (default)", ssh.effective_port())
    } else {
        ssh.port.to_string()
    };

    vec![
        "Processing".to_string(),
        format!("{}Max width: {}px", indent(1), processing.max_width),
        format!("{}Quality: {}", indent(1), processing.quality),
        format!("{}Format: {}", indent(1), processing.format),
        "SSH".to_string(),
        format!("{}Host: {}", indent(1), or_unset(&ssh.host)),
        format!("{}Port: {}", indent(1), port),
        format!("{}Username: {}", indent(1), or_unset(&ssh.username)),
        format!("{}Password: {}", indent(1), password),
        format!("{}Remote path: {}", indent(1), or_unset(&ssh.remote_path)),
        format!(
            "{}Status: {}",
            indent(1),
            if ssh.is_configured() {
                "configured"
            } else {
                "not configured"
            }
        ),
    ]
}

pub fn print_settings(processing: &ProcessingSettings, ssh: &SshSettings) {
    for line in format_settings(processing, ssh) {
        println!("{}", line);
    }
}

// ============================================================================
// Tags and categories
// ============================================================================

/// `Tags (N)` then one tag per line.
pub fn format_tags(tags: &TagList) -> Vec<String> {
    let mut lines = vec![format!("Tags ({})", tags.len())];
    lines.extend(tags.iter().map(|t| format!("{}{}", indent(1), t)));
    lines
}

pub fn print_tags(tags: &TagList) {
    for line in format_tags(tags) {
        println!("{}", line);
    }
}

/// One category per line, indented by depth.
pub fn format_category_tree(tree: &CategoryTree) -> Vec<String> {
    tree.walk()
        .into_iter()
        .filter_map(|(depth, id)| tree.name(id).map(|name| format!("{}{}", indent(depth), name)))
        .collect()
}

pub fn format_tag_settings(settings: &TagSettings) -> Vec<String> {
    let mut lines = vec!["Categories".to_string()];
    if settings.categories.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    } else {
        lines.extend(
            format_category_tree(&settings.categories)
                .into_iter()
                .map(|l| format!("{}{}", indent(1), l)),
        );
    }
    lines.push(format!("WordPress tags ({})", settings.tags.len()));
    lines.extend(settings.tags.iter().map(|t| format!("{}{}", indent(1), t)));
    lines
}

pub fn print_tag_settings(settings: &TagSettings) {
    for line in format_tag_settings(settings) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
