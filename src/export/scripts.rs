//! Generated scripts and companion text files of the export bundle.
//!
//! One template produces `import.sh`, `import.bat` and `import.ps1`; each
//! dialect only contributes its [`ShellSyntax`] fragments. Every script:
//!
//! 1. checks for its companion files and tools (`ssh-config.txt`, `ssh`,
//!    `scp`, `metadata.csv`; or `wp` when importing locally)
//! 2. uploads every `*.<ext>` file next to it to the remote path with `scp`,
//!    once per extension the bundled images carry
//! 3. runs `wp media import` once per image
//!
//! ## Two layers of quoting
//!
//! The remote host is a POSIX shell, so the remote command is always built
//! with POSIX quoting:
//!
//! ```text
//! cd '/var/www/html' && wp media import 'a [Hero].webp' --title='It'\''s'
//! ```
//!
//! That whole string is then quoted again, with the local dialect's rule, as
//! the last argument of `ssh`.
//!
//! ## Metadata source
//!
//! `import.sh` and `import.bat` carry each image's title, alt text, caption
//! and description inline, taken from the same items as `metadata.csv`.
//! `import.ps1` re-reads `metadata.csv` with `Import-Csv` and builds each
//! remote command at run time. Empty fields never produce a flag.
//!
//! Without SSH settings only `import.sh` and `import.bat` are produced, and
//! they run `wp media import` locally. The folder then has to sit inside the
//! WordPress installation, where WP-CLI finds it on its own.

use super::ExportItem;
use super::csv::CSV_FILE_NAME;
use super::dialect::{Dialect, Posix, ShellSyntax};
use crate::metadata::ImageMetadata;
use crate::settings::SshSettings;

pub const SSH_CONFIG_FILE_NAME: &str = "ssh-config.txt";
pub const README_FILE_NAME: &str = "README.txt";

/// CSV column → `wp media import` flag, in command order.
const IMPORT_COLUMNS: [(&str, &str); 4] = [
    ("title", "--title"),
    ("alt", "--alt"),
    ("caption", "--caption"),
    ("description", "--desc"),
];

pub fn import_script_name(dialect: Dialect) -> String {
    format!("import.{}", dialect.extension())
}

pub fn setup_script_name(dialect: Dialect) -> String {
    format!("wp-setup.{}", dialect.extension())
}

fn render(syntax: &dyn ShellSyntax, lines: Vec<String>) -> String {
    let eol = syntax.line_ending();
    let mut out = lines.join(eol);
    out.push_str(eol);
    out
}

/// `<program> media import '<file>' --title='…' …` in the given dialect.
///
/// Arguments are quoted with [`ShellSyntax::quote_wp_arg`], which differs
/// from plain quoting only where the dialect starts `wp` in an unusual way.
pub fn import_command(
    syntax: &dyn ShellSyntax,
    program: &str,
    file_name: &str,
    metadata: &ImageMetadata,
) -> String {
    let mut command = format!("{program} media import {}", syntax.quote_wp_arg(file_name));
    for (flag, value) in metadata.import_flags() {
        command.push(' ');
        command.push_str(flag);
        command.push('=');
        command.push_str(&syntax.quote_wp_arg(value));
    }
    command
}

/// POSIX command prefix that enters the WordPress directory.
fn remote_cd(ssh: &SshSettings) -> String {
    format!(
        "cd {}{}",
        Posix.quote(ssh.remote_dir()),
        Posix.command_joiner()
    )
}

/// The POSIX command run on the server for one image.
pub fn remote_import_command(ssh: &SshSettings, file_name: &str, metadata: &ImageMetadata) -> String {
    format!(
        "{}{}",
        remote_cd(ssh),
        import_command(&Posix, "wp", file_name, metadata)
    )
}

// ============================================================================
// Import scripts
// ============================================================================

/// Distinct file extensions of `items`, in first-seen order.
pub fn upload_extensions<'a>(items: &[ExportItem<'a>]) -> Vec<&'a str> {
    let mut extensions: Vec<&'a str> = Vec::new();
    let found = items
        .iter()
        .filter_map(|item| item.file_name.rsplit_once('.').map(|(_, ext)| ext));
    for ext in found {
        if !extensions.contains(&ext) {
            extensions.push(ext);
        }
    }
    extensions
}

fn glob_list(extensions: &[&str]) -> String {
    extensions
        .iter()
        .map(|ext| format!("*.{ext}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render `import.<ext>` for one dialect.
///
/// `ssh` is `None` when SSH export is not configured; the script then imports
/// locally.
pub fn import_script(
    dialect: Dialect,
    items: &[ExportItem<'_>],
    ssh: Option<&SshSettings>,
) -> String {
    let sx = dialect.syntax();
    let extensions = upload_extensions(items);
    let mut lines: Vec<String> = sx.shebang().into_iter().map(String::from).collect();

    lines.push(sx.comment(&format!(
        "WordPress media import for {} image(s), generated by wp-image-optimiser.",
        items.len()
    )));
    match ssh {
        Some(ssh) => {
            lines.push(sx.comment(&format!(
                "Uploads the {} files in this folder and imports them with WP-CLI.",
                glob_list(&extensions)
            )));
            lines.push(sx.comment(&format!(
                "Run {} once first.",
                setup_script_name(setup_dialect(dialect))
            )));
        }
        None => {
            lines.push(sx.comment(
                "Imports the images with a local WP-CLI. Run it from a folder inside",
            ));
            lines.push(sx.comment("the WordPress installation."));
        }
    }
    lines.extend(sx.preamble());
    lines.push(String::new());

    match ssh {
        Some(ssh) => {
            lines.extend(sx.require_file(
                SSH_CONFIG_FILE_NAME,
                "ssh-config.txt not found next to this script",
            ));
            lines.extend(sx.require_command("ssh"));
            lines.extend(sx.require_command("scp"));
            lines.extend(sx.require_file(
                CSV_FILE_NAME,
                "metadata.csv not found next to this script",
            ));
            lines.push(String::new());
            lines.extend(sx.credentials());
            lines.push(String::new());

            lines.push(sx.echo(&format!("Uploading images to {}...", ssh.target())));
            for ext in &extensions {
                lines.extend(sx.upload(ssh, ext));
            }
            lines.push(String::new());

            if dialect == Dialect::PowerShell {
                lines.extend(csv_lookup_section(sx, ssh));
            } else {
                for item in items {
                    lines.push(sx.echo(&format!("Importing {}", item.file_name)));
                    let remote = remote_import_command(ssh, item.file_name, item.metadata);
                    lines.extend(sx.checked(sx.ssh_command(ssh, &remote)));
                }
            }
        }
        None => {
            lines.extend(sx.require_command("wp"));
            lines.extend(sx.require_file(
                CSV_FILE_NAME,
                "metadata.csv not found next to this script",
            ));
            lines.push(String::new());
            for item in items {
                lines.push(sx.echo(&format!("Importing {}", item.file_name)));
                lines.extend(sx.checked(import_command(
                    sx,
                    sx.wp_program(),
                    item.file_name,
                    item.metadata,
                )));
            }
        }
    }

    lines.push(String::new());
    lines.extend(sx.epilogue());
    render(sx, lines)
}

/// PowerShell has no setup script of its own; it shares the batch one.
fn setup_dialect(dialect: Dialect) -> Dialect {
    match dialect {
        Dialect::PowerShell => Dialect::Batch,
        other => other,
    }
}

/// PowerShell import loop driven by `metadata.csv`.
fn csv_lookup_section(sx: &dyn ShellSyntax, ssh: &SshSettings) -> Vec<String> {
    let mut lines = vec![
        "function ConvertTo-ShellLiteral([string]$Value) {".to_string(),
        r#"    "'" + $Value.Replace("'", "'\''") + "'""#.to_string(),
        "}".to_string(),
        String::new(),
    ];

    let flags = IMPORT_COLUMNS
        .iter()
        .map(|(column, flag)| format!("{column} = {}", sx.quote(flag)))
        .collect::<Vec<_>>()
        .join("; ");
    lines.push(format!("$flags = [ordered]@{{ {flags} }}"));
    lines.push(format!(
        "$rows = @(Import-Csv -LiteralPath {})",
        sx.quote(CSV_FILE_NAME)
    ));
    lines.push("foreach ($row in $rows) {".into());
    lines.push(format!(
        "    $command = {} + (ConvertTo-ShellLiteral $row.filename)",
        sx.quote(&format!("{}wp media import ", remote_cd(ssh)))
    ));
    lines.push("    foreach ($column in $flags.Keys) {".into());
    lines.push("        $value = $row.$column".into());
    lines.push("        if ($value) {".into());
    lines.push(
        "            $command += ' ' + $flags[$column] + '=' + (ConvertTo-ShellLiteral $value)".into(),
    );
    lines.push("        }".into());
    lines.push("    }".into());
    lines.push("    Write-Host ('Importing ' + $row.filename)".into());
    for line in sx.checked(format!(
        "ssh -p {} {} $command",
        ssh.effective_port(),
        sx.quote(&ssh.target())
    )) {
        lines.push(format!("    {line}"));
    }
    lines.push("}".into());
    lines
}

// ============================================================================
// Setup scripts, README, ssh-config
// ============================================================================

/// One-time script: accept the host key and check WP-CLI on the server.
pub fn setup_script(dialect: Dialect, ssh: &SshSettings) -> String {
    let sx = dialect.syntax();
    let mut lines: Vec<String> = sx.shebang().into_iter().map(String::from).collect();
    lines.push(sx.comment(&format!(
        "One-time setup for {}: accepts the server's host key and checks",
        import_script_name(dialect)
    )));
    lines.push(sx.comment("that WP-CLI runs in the WordPress directory."));
    lines.extend(sx.preamble());
    lines.push(String::new());
    lines.extend(sx.require_command("ssh"));
    lines.push(String::new());
    lines.push(sx.echo(&format!("Connecting to {}...", ssh.target())));

    let check = format!("{}wp core version", remote_cd(ssh));
    let connect = format!(
        "ssh -p {} -o StrictHostKeyChecking=accept-new {} {}",
        ssh.effective_port(),
        sx.quote(&ssh.target()),
        sx.quote(&check)
    );
    let done = sx.echo(&format!(
        "Setup complete. Run {} next.",
        import_script_name(dialect)
    ));
    lines.extend(sx.checked(format!("{connect}{}{done}", sx.command_joiner())));
    render(sx, lines)
}

/// Plain-text usage notes for the SSH bundle.
pub fn readme(ssh: &SshSettings, items: &[ExportItem<'_>]) -> String {
    format!(
        "\
WordPress image import
======================

This archive holds {count} optimised image(s) ({formats}) and the scripts
that upload them to {target} and import them into the media library.

Files
-----
  metadata.csv    Title, alt text, caption, description and tags per image.
                  CSV media-import plugins accept it as well.
  import.sh       Upload + import for macOS and Linux (sh).
  import.bat      Upload + import for Windows (cmd).
  import.ps1      Upload + import for Windows PowerShell; reads metadata.csv.
  wp-setup.sh     One-time host key and WP-CLI check (macOS and Linux).
  wp-setup.bat    The same for Windows.
  ssh-config.txt  Connection details, INCLUDING THE PASSWORD IN PLAIN TEXT.

Steps
-----
1. Unpack the archive into an empty folder.
2. Run wp-setup.sh (or wp-setup.bat) once to accept the server's host key.
3. Run import.sh, import.bat or import.ps1 from the same folder.
   import.sh uses sshpass when it is installed; otherwise ssh asks for
   the password from ssh-config.txt.
4. Delete ssh-config.txt when you are done.

Server:         {target} (port {port})
WordPress path: {path}

Needs WP-CLI (wp) on the server and ssh/scp on this machine.
",
        count = items.len(),
        formats = upload_extensions(items).join(", "),
        target = ssh.target(),
        port = ssh.effective_port(),
        path = ssh.remote_dir(),
    )
}

/// `key=value` connection file read by `import.sh`.
pub fn ssh_config(ssh: &SshSettings) -> String {
    format!(
        "\
# WARNING: this file contains your SSH password in plain text.
# Delete it after the import and never share or commit it.
host={}
port={}
username={}
password={}
remote_path={}
",
        ssh.host.trim(),
        ssh.effective_port(),
        ssh.username.trim(),
        ssh.password,
        ssh.remote_dir(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ssh() -> SshSettings {
        SshSettings {
            host: "example.com".into(),
            port: 0,
            username: "deploy".into(),
            password: "s3cret".into(),
            remote_path: "/var/www/html".into(),
        }
    }

    fn meta(title: &str, description: &str) -> ImageMetadata {
        ImageMetadata {
            title: title.into(),
            alt_text: String::new(),
            caption: String::new(),
            description: description.into(),
        }
    }

    fn items<'a>(entries: &'a [(&'a str, ImageMetadata)]) -> Vec<ExportItem<'a>> {
        entries
            .iter()
            .map(|(name, metadata)| ExportItem {
                file_name: *name,
                metadata,
                tags: &[],
                bytes: &[],
            })
            .collect()
    }

    // =========================================================================
    // Commands
    // =========================================================================

    #[test]
    fn remote_command_is_posix_and_skips_empty_fields() {
        let cmd = remote_import_command(&ssh(), "a [Hero].webp", &meta("It's", ""));
        assert_eq!(
            cmd,
            r"cd '/var/www/html' && wp media import 'a [Hero].webp' --title='It'\''s'"
        );
    }

    #[test]
    fn import_command_flag_order() {
        let m = ImageMetadata {
            title: "t".into(),
            alt_text: "a".into(),
            caption: "c".into(),
            description: "d".into(),
        };
        assert_eq!(
            import_command(Dialect::Batch.syntax(), "call wp", "x.webp", &m),
            r#"call wp media import "x.webp" --title="t" --alt="a" --caption="c" --desc="d""#
        );
    }

    // =========================================================================
    // Import scripts with SSH
    // =========================================================================

    #[test]
    fn sh_script_structure() {
        let entries = [("a [Hero].webp", meta("a", "")), ("b.webp", meta("b", ""))];
        let script = import_script(
            Dialect::Posix,
            &items(&entries),
            Some(&ssh()),
        );

        assert!(script.starts_with("#!/bin/sh\n"));
        assert!(script.contains("if [ ! -f 'ssh-config.txt' ]; then"));
        assert!(script.contains("if ! command -v scp >/dev/null 2>&1; then"));
        assert!(script.contains("if [ ! -f 'metadata.csv' ]; then"));
        assert!(script.contains("SSHPASS=$(sed -n 's/^password=//p' ssh-config.txt)"));
        assert!(script.contains("$SSH_RUN scp -P 22 ./*.webp 'deploy@example.com:/var/www/html/'"));
        assert!(script.contains(
            r"$SSH_RUN ssh -p 22 'deploy@example.com' 'cd '\''/var/www/html'\'' && wp media import '\''a [Hero].webp'\'' --title='\''a'\'''"
        ));
        assert!(!script.contains('\r'));
    }

    #[test]
    fn bat_script_structure() {
        let entries = [("b.webp", meta("50% \"off\"", ""))];
        let script = import_script(
            Dialect::Batch,
            &items(&entries),
            Some(&ssh()),
        );

        assert!(script.starts_with("@echo off\r\n"));
        assert!(script.contains("if not exist \"ssh-config.txt\" ("));
        assert!(script.contains("where ssh >nul 2>nul"));
        assert!(script.contains(
            "for %%F in (*.webp) do scp -P 22 \"%%F\" \"deploy@example.com:/var/www/html/\" || exit /b 1"
        ));
        assert!(script.contains(
            "ssh -p 22 \"deploy@example.com\" \"cd '/var/www/html' && wp media import 'b.webp' --title='50%% \"\"off\"\"'\" || exit /b 1"
        ));
        assert!(
            script
                .split('\n')
                .filter(|l| !l.is_empty())
                .all(|l| l.ends_with('\r'))
        );
        assert!(script.ends_with("endlocal\r\n"));
    }

    #[test]
    fn ps1_reads_metadata_csv() {
        let entries = [("a.jpg", meta("a", ""))];
        let script = import_script(
            Dialect::PowerShell,
            &items(&entries),
            Some(&ssh()),
        );

        assert!(script.contains("$rows = @(Import-Csv -LiteralPath 'metadata.csv')"));
        assert!(script.contains("function ConvertTo-ShellLiteral([string]$Value) {"));
        assert!(script.contains(
            "$flags = [ordered]@{ title = '--title'; alt = '--alt'; caption = '--caption'; description = '--desc' }"
        ));
        assert!(script.contains(
            "    $command = 'cd ''/var/www/html'' && wp media import ' + (ConvertTo-ShellLiteral $row.filename)"
        ));
        assert!(script.contains("Get-ChildItem -File -Filter '*.jpg'"));
        assert!(script.contains("    ssh -p 22 'deploy@example.com' $command"));
        // Metadata comes from the CSV, not the script
        assert!(!script.contains("--title='a'"));
    }

    #[test]
    fn custom_port_used_everywhere() {
        let mut s = ssh();
        s.port = 2222;
        let entries = [("a.webp", meta("a", ""))];
        for dialect in Dialect::ALL {
            let script = import_script(dialect, &items(&entries), Some(&s));
            assert!(script.contains("-P 2222"), "{dialect:?} upload");
            assert!(script.contains("ssh -p 2222"), "{dialect:?} import");
            assert!(!script.contains(" 22 "), "{dialect:?} default port leaked");
        }
    }

    #[test]
    fn padded_remote_path_is_trimmed_everywhere() {
        let mut s = ssh();
        s.remote_path = "  /var/www/html \t".into();
        let entries = [("a.webp", meta("a", ""))];

        let sh = import_script(Dialect::Posix, &items(&entries), Some(&s));
        assert!(sh.contains("./*.webp 'deploy@example.com:/var/www/html/'"));
        assert!(sh.contains(r"'cd '\''/var/www/html'\'' && wp media import"));
        let bat = import_script(Dialect::Batch, &items(&entries), Some(&s));
        assert!(bat.contains("\"%%F\" \"deploy@example.com:/var/www/html/\""));
        let ps1 = import_script(Dialect::PowerShell, &items(&entries), Some(&s));
        assert!(ps1.contains("$_.Name 'deploy@example.com:/var/www/html/'"));
        assert!(ps1.contains("'cd ''/var/www/html'' && wp media import '"));
        assert!(ssh_config(&s).contains("\nremote_path=/var/www/html\n"));
        assert!(readme(&s, &items(&entries)).contains("WordPress path: /var/www/html\n"));
    }

    #[test]
    fn hostile_remote_path_is_quoted() {
        let mut s = ssh();
        s.remote_path = "/srv/it's here".into();
        let cmd = remote_import_command(&s, "a.webp", &meta("", ""));
        assert_eq!(cmd, r"cd '/srv/it'\''s here' && wp media import 'a.webp'");
    }

    // =========================================================================
    // Import scripts without SSH
    // =========================================================================

    #[test]
    fn local_scripts_run_wp_directly() {
        let entries = [("a.webp", meta("A", "desc"))];
        let sh = import_script(Dialect::Posix, &items(&entries), None);
        let bat = import_script(Dialect::Batch, &items(&entries), None);

        assert!(sh.contains("wp media import 'a.webp' --title='A' --desc='desc'"));
        assert!(bat.contains("call wp media import \"a.webp\" --title=\"A\" --desc=\"desc\" || exit /b 1"));
        for script in [&sh, &bat] {
            assert!(!script.contains("ssh"));
            assert!(!script.contains("scp"));
        }
    }

    #[test]
    fn local_bat_survives_the_call_pass() {
        let entries = [("100%.webp", meta("100%PATH%", ""))];
        let bat = import_script(Dialect::Batch, &items(&entries), None);
        assert!(bat.contains(
            "call wp media import \"100%%%%.webp\" --title=\"100%%%%PATH%%%%\" || exit /b 1"
        ));
        // Only the call line is doubled twice
        assert!(bat.contains("echo Importing 100%%.webp"));
    }

    #[test]
    fn upload_extensions_are_distinct_in_first_seen_order() {
        let entries = [
            ("a.webp", meta("a", "")),
            ("b.jpg", meta("b", "")),
            ("c.webp", meta("c", "")),
        ];
        assert_eq!(upload_extensions(&items(&entries)), vec!["webp", "jpg"]);

        let script = import_script(Dialect::Posix, &items(&entries), Some(&ssh()));
        assert!(script.contains("# Uploads the *.webp, *.jpg files in this folder"));
        let webp = script.find("./*.webp").unwrap();
        let jpg = script.find("./*.jpg").unwrap();
        assert!(webp < jpg);
    }

    // =========================================================================
    // Setup, README, ssh-config
    // =========================================================================

    #[test]
    fn setup_scripts_accept_host_key() {
        let sh = setup_script(Dialect::Posix, &ssh());
        assert!(sh.contains(
            r"ssh -p 22 -o StrictHostKeyChecking=accept-new 'deploy@example.com' 'cd '\''/var/www/html'\'' && wp core version' && echo 'Setup complete. Run import.sh next.'"
        ));

        let bat = setup_script(Dialect::Batch, &ssh());
        assert!(bat.contains(
            "ssh -p 22 -o StrictHostKeyChecking=accept-new \"deploy@example.com\" \"cd '/var/www/html' && wp core version\" && echo Setup complete. Run import.bat next. || exit /b 1"
        ));
    }

    #[test]
    fn ssh_config_contents() {
        let config = ssh_config(&ssh());
        assert!(config.starts_with("# WARNING"));
        assert!(config.contains("plain text"));
        assert!(config.contains("\nhost=example.com\n"));
        assert!(config.contains("\nport=22\n"));
        assert!(config.contains("\nusername=deploy\n"));
        assert!(config.contains("\npassword=s3cret\n"));
        assert!(config.contains("\nremote_path=/var/www/html\n"));
    }

    #[test]
    fn readme_names_every_file() {
        let entries = [
            ("a.webp", meta("a", "")),
            ("b.webp", meta("b", "")),
            ("c.webp", meta("c", "")),
        ];
        let text = readme(&ssh(), &items(&entries));
        for name in [
            "metadata.csv",
            "import.sh",
            "import.bat",
            "import.ps1",
            "wp-setup.sh",
            "wp-setup.bat",
            "ssh-config.txt",
        ] {
            assert!(text.contains(name), "README misses {name}");
        }
        assert!(text.contains("3 optimised image(s) (webp)"));
        assert!(text.contains("deploy@example.com (port 22)"));
    }

    #[test]
    fn script_names() {
        assert_eq!(import_script_name(Dialect::PowerShell), "import.ps1");
        assert_eq!(setup_script_name(Dialect::Posix), "wp-setup.sh");
    }
}
