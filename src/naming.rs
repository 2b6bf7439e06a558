//! Output filename derivation.
//!
//! Every processed image gets a filename of the form
//!
//! ```text
//! <base><tag suffix>.<ext>
//! ```
//!
//! - **base**: the user-editable output name, defaulting to the source
//!   filename without its last extension (`holiday.final.png` → `holiday.final`).
//! - **tag suffix**: empty when the image has no tags, otherwise a space and
//!   the tags in their current order, space-joined inside brackets
//!   (` [Hero Banner]`). Tags are not sorted.
//! - **ext**: the canonical extension of the output format (`webp`, `jpg`, `png`).
//!
//! The same name is used as the archive entry, the `filename` column of
//! `metadata.csv`, and the argument to `wp media import` in the scripts, so
//! no two completed images may share it. [`unique_file_name`] appends
//! ` (2)`, ` (3)`, … before the extension when the derived name is taken
//! (`a.png` and `a.jpg` both at webp → `a.webp`, `a (2).webp`). Names are
//! compared case-insensitively, as Windows and macOS unpack them.

use crate::settings::OutputFormat;

/// Strip the last extension from a filename.
///
/// - `"photo.png"` → `"photo"`
/// - `"holiday.final.png"` → `"holiday.final"`
/// - `"README"` → `"README"`
/// - `".hidden"` → `".hidden"` (a leading dot is not an extension)
pub fn strip_extension(filename: &str) -> &str {
    match filename.rfind('.') {
        Some(pos) if pos > 0 => &filename[..pos],
        _ => filename,
    }
}

/// Build the bracketed tag suffix (` [a b]`), or an empty string without tags.
pub fn tag_suffix<S: AsRef<str>>(tags: &[S]) -> String {
    if tags.is_empty() {
        return String::new();
    }
    let joined = tags.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(" ");
    format!(" [{joined}]")
}

/// Derive the final output filename for a processed image.
///
/// ```
/// # use wp_image_optimiser::naming::output_file_name;
/// # use wp_image_optimiser::settings::OutputFormat;
/// assert_eq!(output_file_name("photo", &["a", "b"], OutputFormat::Webp), "photo [a b].webp");
/// assert_eq!(output_file_name("photo", &[] as &[&str], OutputFormat::Jpeg), "photo.jpg");
/// ```
pub fn output_file_name<S: AsRef<str>>(base: &str, tags: &[S], format: OutputFormat) -> String {
    format!("{}{}.{}", base, tag_suffix(tags), format.extension())
}

/// `name`, or the first `<base> (n).<ext>` (n ≥ 2) not in `taken`.
pub fn unique_file_name<'a>(name: String, taken: impl IntoIterator<Item = &'a str>) -> String {
    let taken: Vec<String> = taken.into_iter().map(str::to_lowercase).collect();
    let is_free = |candidate: &str| !taken.contains(&candidate.to_lowercase());
    if is_free(&name) {
        return name;
    }

    let base = strip_extension(&name);
    let ext = &name[base.len()..];
    let mut n = 2;
    loop {
        let candidate = format!("{base} ({n}){ext}");
        if is_free(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
