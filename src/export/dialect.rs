//! Quoting grammars of the three script dialects.
//!
//! Every generated script embeds arbitrary user text (file names, titles,
//! descriptions, host and path values) inside its own quoting. Each dialect
//! has one rule for doing that, and the rule must round-trip: the interpreter
//! reading the quoted word gets back exactly the original text.
//!
//! | Dialect | Quote | Escape inside |
//! |---|---|---|
//! | POSIX `sh` | `'…'` | `'` → `'\''` |
//! | Windows `cmd` | `"…"` | `"` → `""`, `%` → `%%`, line breaks → space |
//! | PowerShell | `'…'` | `'` and `‘ ’ ‚ ‛` doubled |
//!
//! `cmd` cannot carry a line break inside an argument at all, so batch
//! quoting flattens CR/LF to spaces.
//!
//! A local `import.bat` starts WP-CLI with `call wp`, because `wp` is itself
//! a batch file there. `call` runs the line through percent expansion a
//! second time, so [`ShellSyntax::quote_wp_arg`] writes each `%` as `%%%%`.
//! The same pass doubles every `^` inside quotes and nothing undoes that, so
//! a caret in a title reaches WordPress as `^^`. That and line breaks are
//! the lossy cases.
//!
//! Besides quoting, a [`ShellSyntax`] supplies the small fragments the script
//! template needs (comments, echo, pre-flight checks, failure handling), so
//! the template in [`super::scripts`] is written once for all dialects.

use crate::settings::SshSettings;

/// Target command interpreter of a generated script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Posix,
    Batch,
    PowerShell,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Posix, Dialect::Batch, Dialect::PowerShell];

    pub fn syntax(self) -> &'static dyn ShellSyntax {
        match self {
            Dialect::Posix => &Posix,
            Dialect::Batch => &Batch,
            Dialect::PowerShell => &PowerShell,
        }
    }

    /// File extension of scripts in this dialect.
    pub fn extension(self) -> &'static str {
        match self {
            Dialect::Posix => "sh",
            Dialect::Batch => "bat",
            Dialect::PowerShell => "ps1",
        }
    }
}

/// Per-dialect quoting rule and script fragments.
pub trait ShellSyntax: Sync {
    fn dialect(&self) -> Dialect;

    /// Escape `value` for use between this dialect's quote characters.
    fn escape(&self, value: &str) -> String;

    /// Escape and wrap `value` as one quoted word.
    fn quote(&self, value: &str) -> String;

    fn comment_prefix(&self) -> &'static str;

    /// Joins two commands on one line. POSIX and cmd run the second only if
    /// the first succeeded.
    fn command_joiner(&self) -> &'static str;

    fn line_ending(&self) -> &'static str;

    /// Lines that must come before anything else (interpreter line).
    fn shebang(&self) -> Option<&'static str> {
        None
    }

    /// Interpreter setup after the header comment.
    fn preamble(&self) -> Vec<String>;

    fn echo(&self, message: &str) -> String;

    /// Abort with `message` unless `file` exists next to the script.
    fn require_file(&self, file: &str, message: &str) -> Vec<String>;

    /// Abort unless `program` is on the PATH.
    fn require_command(&self, program: &str) -> Vec<String>;

    /// Run `command` and abort the script if it fails.
    fn checked(&self, command: String) -> Vec<String>;

    /// How a `wp` invocation starts in this dialect.
    fn wp_program(&self) -> &'static str {
        "wp"
    }

    /// Quote an argument of a line started with [`ShellSyntax::wp_program`].
    fn quote_wp_arg(&self, value: &str) -> String {
        self.quote(value)
    }

    /// Lines that prepare password handling for ssh/scp.
    fn credentials(&self) -> Vec<String>;

    /// Prefix for ssh/scp invocations (e.g. a password helper).
    fn ssh_runner(&self) -> &'static str {
        ""
    }

    /// Upload every `*.<extension>` file next to the script to the remote path.
    fn upload(&self, ssh: &SshSettings, extension: &str) -> Vec<String>;

    fn epilogue(&self) -> Vec<String>;

    fn comment(&self, text: &str) -> String {
        if text.is_empty() {
            self.comment_prefix().to_string()
        } else {
            format!("{} {}", self.comment_prefix(), text)
        }
    }

    /// `ssh` invocation running `remote_command` on the configured host.
    fn ssh_command(&self, ssh: &SshSettings, remote_command: &str) -> String {
        format!(
            "{}ssh -p {} {} {}",
            self.ssh_runner(),
            ssh.effective_port(),
            self.quote(&ssh.target()),
            self.quote(remote_command)
        )
    }
}

// ============================================================================
// POSIX sh
// ============================================================================

pub struct Posix;

impl ShellSyntax for Posix {
    fn dialect(&self) -> Dialect {
        Dialect::Posix
    }

    fn escape(&self, value: &str) -> String {
        value.replace('\'', r"'\''")
    }

    fn quote(&self, value: &str) -> String {
        format!("'{}'", self.escape(value))
    }

    fn comment_prefix(&self) -> &'static str {
        "#"
    }

    fn command_joiner(&self) -> &'static str {
        " && "
    }

    fn line_ending(&self) -> &'static str {
        "\n"
    }

    fn shebang(&self) -> Option<&'static str> {
        Some("#!/bin/sh")
    }

    fn preamble(&self) -> Vec<String> {
        vec!["set -e".into(), r#"cd "$(dirname "$0")""#.into()]
    }

    fn echo(&self, message: &str) -> String {
        format!("echo {}", self.quote(message))
    }

    fn require_file(&self, file: &str, message: &str) -> Vec<String> {
        vec![
            format!("if [ ! -f {} ]; then", self.quote(file)),
            format!("  {} >&2", self.echo(message)),
            "  exit 1".into(),
            "fi".into(),
        ]
    }

    fn require_command(&self, program: &str) -> Vec<String> {
        vec![
            format!("if ! command -v {program} >/dev/null 2>&1; then"),
            format!(
                "  {} >&2",
                self.echo(&format!("{program} is required but was not found in PATH"))
            ),
            "  exit 1".into(),
            "fi".into(),
        ]
    }

    fn checked(&self, command: String) -> Vec<String> {
        // set -e
        vec![command]
    }

    fn credentials(&self) -> Vec<String> {
        vec![
            "SSH_RUN=''".into(),
            "if command -v sshpass >/dev/null 2>&1; then".into(),
            "  SSHPASS=$(sed -n 's/^password=//p' ssh-config.txt)".into(),
            "  export SSHPASS".into(),
            "  SSH_RUN='sshpass -e'".into(),
            "else".into(),
            format!(
                "  {} >&2",
                self.echo("sshpass not found; ssh will ask for the password from ssh-config.txt")
            ),
            "fi".into(),
        ]
    }

    fn ssh_runner(&self) -> &'static str {
        "$SSH_RUN "
    }

    fn upload(&self, ssh: &SshSettings, extension: &str) -> Vec<String> {
        vec![format!(
            "{}scp -P {} ./*.{} {}",
            self.ssh_runner(),
            ssh.effective_port(),
            extension,
            self.quote(&ssh.upload_target())
        )]
    }

    fn epilogue(&self) -> Vec<String> {
        vec![self.echo("Done.")]
    }
}

// ============================================================================
// Windows cmd
// ============================================================================

pub struct Batch;

impl Batch {
    /// Caret-escape text for a bare `echo`.
    fn echo_text(message: &str) -> String {
        let mut out = String::with_capacity(message.len());
        for c in message.chars() {
            match c {
                '^' | '&' | '|' | '<' | '>' | '(' | ')' => {
                    out.push('^');
                    out.push(c);
                }
                '%' => out.push_str("%%"),
                '\r' | '\n' => out.push(' '),
                _ => out.push(c),
            }
        }
        out
    }
}

impl ShellSyntax for Batch {
    fn dialect(&self) -> Dialect {
        Dialect::Batch
    }

    fn escape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '"' => out.push_str("\"\""),
                '%' => out.push_str("%%"),
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    out.push(' ');
                }
                '\n' => out.push(' '),
                _ => out.push(c),
            }
        }
        out
    }

    fn quote(&self, value: &str) -> String {
        format!("\"{}\"", self.escape(value))
    }

    fn comment_prefix(&self) -> &'static str {
        "REM"
    }

    fn command_joiner(&self) -> &'static str {
        " && "
    }

    fn line_ending(&self) -> &'static str {
        "\r\n"
    }

    fn shebang(&self) -> Option<&'static str> {
        Some("@echo off")
    }

    fn preamble(&self) -> Vec<String> {
        vec!["setlocal".into(), r#"cd /d "%~dp0""#.into()]
    }

    fn echo(&self, message: &str) -> String {
        if message.is_empty() {
            "echo.".into()
        } else {
            format!("echo {}", Self::echo_text(message))
        }
    }

    fn require_file(&self, file: &str, message: &str) -> Vec<String> {
        vec![
            format!("if not exist {} (", self.quote(file)),
            format!("  {}", self.echo(message)),
            "  exit /b 1".into(),
            ")".into(),
        ]
    }

    fn require_command(&self, program: &str) -> Vec<String> {
        vec![
            format!("where {program} >nul 2>nul"),
            "if errorlevel 1 (".into(),
            format!(
                "  {}",
                self.echo(&format!("{program} is required but was not found in PATH"))
            ),
            "  exit /b 1".into(),
            ")".into(),
        ]
    }

    fn checked(&self, command: String) -> Vec<String> {
        vec![format!("{command} || exit /b 1")]
    }

    fn wp_program(&self) -> &'static str {
        // wp is a .bat shim on Windows
        "call wp"
    }

    fn quote_wp_arg(&self, value: &str) -> String {
        // call expands percents once more
        format!("\"{}\"", self.escape(value).replace('%', "%%"))
    }

    fn credentials(&self) -> Vec<String> {
        vec![self.comment("ssh and scp prompt for the password stored in ssh-config.txt")]
    }

    fn upload(&self, ssh: &SshSettings, extension: &str) -> Vec<String> {
        vec![format!(
            "for %%F in (*.{}) do scp -P {} \"%%F\" {} || exit /b 1",
            extension,
            ssh.effective_port(),
            self.quote(&ssh.upload_target())
        )]
    }

    fn epilogue(&self) -> Vec<String> {
        vec![self.echo("Done."), "endlocal".into()]
    }
}

// ============================================================================
// PowerShell
// ============================================================================

pub struct PowerShell;

/// Characters PowerShell accepts as a single quote.
fn is_ps_single_quote(c: char) -> bool {
    matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}')
}

impl ShellSyntax for PowerShell {
    fn dialect(&self) -> Dialect {
        Dialect::PowerShell
    }

    fn escape(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for c in value.chars() {
            if is_ps_single_quote(c) {
                out.push(c);
            }
            out.push(c);
        }
        out
    }

    fn quote(&self, value: &str) -> String {
        format!("'{}'", self.escape(value))
    }

    fn comment_prefix(&self) -> &'static str {
        "#"
    }

    fn command_joiner(&self) -> &'static str {
        // Windows PowerShell 5 has no &&
        "; "
    }

    fn line_ending(&self) -> &'static str {
        "\r\n"
    }

    fn preamble(&self) -> Vec<String> {
        vec![
            "$ErrorActionPreference = 'Stop'".into(),
            "Set-Location -LiteralPath $PSScriptRoot".into(),
        ]
    }

    fn echo(&self, message: &str) -> String {
        format!("Write-Host {}", self.quote(message))
    }

    fn require_file(&self, file: &str, message: &str) -> Vec<String> {
        vec![
            format!("if (-not (Test-Path -LiteralPath {})) {{", self.quote(file)),
            format!("    {} -ForegroundColor Red", self.echo(message)),
            "    exit 1".into(),
            "}".into(),
        ]
    }

    fn require_command(&self, program: &str) -> Vec<String> {
        vec![
            format!(
                "if (-not (Get-Command {} -ErrorAction SilentlyContinue)) {{",
                self.quote(program)
            ),
            format!(
                "    {} -ForegroundColor Red",
                self.echo(&format!("{program} is required but was not found in PATH"))
            ),
            "    exit 1".into(),
            "}".into(),
        ]
    }

    fn checked(&self, command: String) -> Vec<String> {
        vec![command, "if ($LASTEXITCODE -ne 0) { exit 1 }".into()]
    }

    fn credentials(&self) -> Vec<String> {
        vec![self.comment("ssh and scp prompt for the password stored in ssh-config.txt")]
    }

    fn upload(&self, ssh: &SshSettings, extension: &str) -> Vec<String> {
        vec![
            format!(
                "Get-ChildItem -File -Filter {} | ForEach-Object {{",
                self.quote(&format!("*.{extension}"))
            ),
            format!(
                "    scp -P {} $_.Name {}",
                ssh.effective_port(),
                self.quote(&ssh.upload_target())
            ),
            "    if ($LASTEXITCODE -ne 0) { exit 1 }".into(),
            "}".into(),
        ]
    }

    fn epilogue(&self) -> Vec<String> {
        vec![self.echo("Done.")]
    }
}
