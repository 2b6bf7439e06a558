//! `metadata.csv`: one row per exported image.
//!
//! The header is fixed, since the WordPress CSV-import plugin and the
//! PowerShell script read columns by name:
//!
//! ```text
//! filename,title,alt,caption,description,tags
//! ```
//!
//! A field is wrapped in double quotes, with inner quotes doubled, whenever it
//! contains a comma, a double quote, or a line break. Anything else is written
//! verbatim. Tags are joined with commas first, so a multi-tag cell is always
//! quoted.

use super::ExportItem;
use std::borrow::Cow;

pub const CSV_FILE_NAME: &str = "metadata.csv";

pub const HEADER: [&str; 6] = ["filename", "title", "alt", "caption", "description", "tags"];

pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn row(fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render the whole table, header first, rows in item order.
pub fn metadata_csv(items: &[ExportItem<'_>]) -> String {
    let mut out = row(&HEADER);
    out.push('\n');
    for item in items {
        let tags = item.tags.join(",");
        let meta = item.metadata;
        out.push_str(&row(&[
            item.file_name,
            meta.title.as_str(),
            meta.alt_text.as_str(),
            meta.caption.as_str(),
            meta.description.as_str(),
            tags.as_str(),
        ]));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::ImageMetadata;

    /// Minimal RFC 4180 reader for checking what we write.
    fn parse_csv(input: &str) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        let mut row = Vec::new();
        let mut field = String::new();
        let mut in_quotes = false;
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quotes {
                match c {
                    '"' if chars.peek() == Some(&'"') => {
                        field.push('"');
                        chars.next();
                    }
                    '"' => in_quotes = false,
                    _ => field.push(c),
                }
            } else {
                match c {
                    '"' => in_quotes = true,
                    ',' => row.push(std::mem::take(&mut field)),
                    '\n' => {
                        row.push(std::mem::take(&mut field));
                        rows.push(std::mem::take(&mut row));
                    }
                    _ => field.push(c),
                }
            }
        }
        assert!(!in_quotes, "unterminated quoted field");
        rows
    }

    fn item<'a>(
        file_name: &'a str,
        metadata: &'a ImageMetadata,
        tags: &'a [String],
    ) -> ExportItem<'a> {
        ExportItem {
            file_name,
            metadata,
            tags,
            bytes: &[],
        }
    }

    #[test]
    fn plain_values_verbatim() {
        assert_eq!(escape_field("hello world"), "hello world");
        assert!(matches!(escape_field("x"), Cow::Borrowed(_)));
    }

    #[test]
    fn special_values_quoted() {
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("line\nbreak"), "\"line\nbreak\"");
        assert_eq!(escape_field("cr\rhere"), "\"cr\rhere\"");
    }

    #[test]
    fn header_only_for_no_items() {
        assert_eq!(
            metadata_csv(&[]),
            "filename,title,alt,caption,description,tags\n"
        );
    }

    #[test]
    fn rows_follow_item_order_with_joined_tags() {
        let meta_a = ImageMetadata::for_file("a.png");
        let meta_b = ImageMetadata::for_file("b.jpg");
        let tags_a = vec!["Hero".to_string(), "Banner".to_string()];
        let csv = metadata_csv(&[
            item("a [Hero Banner].webp", &meta_a, &tags_a),
            item("b.webp", &meta_b, &[]),
        ]);

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "a [Hero Banner].webp,a,a,,,\"Hero,Banner\"");
        assert_eq!(lines[2], "b.webp,b,b,,,");
    }

    #[test]
    fn tricky_title_round_trips() {
        let title = "Sale, \"50%\" off\nthis week";
        let meta = ImageMetadata {
            title: title.to_string(),
            alt_text: "alt".into(),
            caption: String::new(),
            description: "d".into(),
        };
        let tags = vec!["x".to_string()];
        let csv = metadata_csv(&[item("p.webp", &meta, &tags)]);

        let rows = parse_csv(&csv);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], HEADER.map(String::from).to_vec());
        assert_eq!(rows[1][1], title);
        assert_eq!(rows[1].len(), 6);
    }

    #[test]
    fn tags_cell_round_trips_to_list() {
        let meta = ImageMetadata::for_file("a.png");
        let tags = vec!["one".to_string(), "two words".to_string()];
        let rows = parse_csv(&metadata_csv(&[item("a.webp", &meta, &tags)]));
        let parsed: Vec<&str> = rows[1][5].split(',').collect();
        assert_eq!(parsed, vec!["one", "two words"]);
    }
}
