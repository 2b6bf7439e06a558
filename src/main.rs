use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::PathBuf;
use wp_image_optimiser::export::{DEFAULT_ARCHIVE_PREFIX, Exporter};
use wp_image_optimiser::imaging::RustCompressor;
use wp_image_optimiser::metadata::MetadataPatch;
use wp_image_optimiser::queue::ImageId;
use wp_image_optimiser::session::Session;
use wp_image_optimiser::settings::{OutputFormat, ProcessingSettings, SettingsService};
use wp_image_optimiser::storage::DirStore;
use wp_image_optimiser::{output, scan};

/// Processing overrides shared by `export` and `settings set`.
#[derive(Args, Clone)]
struct ProcessingArgs {
    /// Longest edge in pixels after resizing
    #[arg(long)]
    max_width: Option<u32>,
    /// Encoder quality, 0 < q <= 1
    #[arg(long)]
    quality: Option<f32>,
    /// Output format: webp, jpeg or png
    #[arg(long)]
    format: Option<OutputFormat>,
}

impl ProcessingArgs {
    fn is_empty(&self) -> bool {
        self.max_width.is_none() && self.quality.is_none() && self.format.is_none()
    }

    fn apply(&self, base: ProcessingSettings) -> ProcessingSettings {
        ProcessingSettings {
            max_width: self.max_width.unwrap_or(base.max_width),
            quality: self.quality.unwrap_or(base.quality),
            format: self.format.unwrap_or(base.format),
        }
    }
}

#[derive(Parser)]
#[command(name = "wp-image-optimiser")]
#[command(about = "Optimise images and bundle WordPress import scripts")]
#[command(long_about = "\
Optimise images and bundle WordPress import scripts

Images are resized to a maximum edge, re-encoded (webp, jpeg or png) and
written into one zip together with metadata.csv and WP-CLI import scripts
for sh, cmd and PowerShell.

Bundle layout:

  wordpress-images-YYYY-MM-DD.zip
  ├── <name>[ [tag tag]].<ext>   # optimised images
  ├── metadata.csv               # filename,title,alt,caption,description,tags
  ├── ssh-config.txt             # SSH only; contains the password in plain text
  ├── import.sh / import.bat     # wp media import, locally or over SSH
  ├── import.ps1                 # SSH only
  ├── wp-setup.sh / wp-setup.bat # SSH only; checks the connection and WP-CLI
  └── README.txt                 # SSH only

A sidecar <name>.txt next to an image becomes its description.
Settings persist in --state-dir.")]
#[command(version)]
struct Cli {
    /// Directory holding persisted settings
    #[arg(long, default_value = ".wp-image-optimiser", global = true)]
    state_dir: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process images and write the export bundle
    Export(ExportArgs),
    /// Show or change persisted settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Manage the tag vocabulary
    #[command(subcommand)]
    Tags(TagsCommand),
    /// Manage WordPress categories and tags
    #[command(subcommand)]
    Taxonomy(TaxonomyCommand),
}

#[derive(Args)]
struct ExportArgs {
    /// Image files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Tag added to every image
    #[arg(long = "tag")]
    tags: Vec<String>,
    /// Tag for a single image, as FILE=TAG
    #[arg(long = "image-tag", value_parser = parse_image_tag)]
    image_tags: Vec<(String, String)>,
    /// Directory the zip is written to
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Archive name prefix
    #[arg(long, default_value = DEFAULT_ARCHIVE_PREFIX)]
    prefix: String,
    #[command(flatten)]
    processing: ProcessingArgs,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print current settings
    Show,
    /// Change and persist settings
    Set(SettingsSetArgs),
}

#[derive(Args)]
struct SettingsSetArgs {
    #[command(flatten)]
    processing: ProcessingArgs,
    /// SSH host
    #[arg(long)]
    host: Option<String>,
    /// SSH port (0 = default 22)
    #[arg(long)]
    port: Option<u16>,
    /// SSH username
    #[arg(long)]
    username: Option<String>,
    /// SSH password (stored in plain text)
    #[arg(long)]
    password: Option<String>,
    /// WordPress root on the server
    #[arg(long)]
    remote_path: Option<String>,
}

#[derive(Subcommand)]
enum TagsCommand {
    /// List the vocabulary
    List,
    /// Add a tag
    Add { tag: String },
    /// Remove a tag
    Remove { tag: String },
}

#[derive(Subcommand)]
enum TaxonomyCommand {
    /// Print categories and WordPress tags
    Show,
    /// Add a category path such as "Products > Shoes"
    AddCategory { path: String },
    /// Remove a category and everything below it
    RemoveCategory { path: String },
    /// Add a WordPress tag
    AddTag { tag: String },
    /// Remove a WordPress tag
    RemoveTag { tag: String },
}

fn parse_image_tag(s: &str) -> Result<(String, String), String> {
    let (file, tag) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FILE=TAG, got {s:?}"))?;
    if file.trim().is_empty() || tag.trim().is_empty() {
        return Err(format!("expected FILE=TAG, got {s:?}"));
    }
    Ok((file.trim().to_string(), tag.trim().to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    let mut settings = SettingsService::load(DirStore::open(&cli.state_dir)?)?;

    match cli.command {
        Command::Export(args) => run_export(settings, args)?,
        Command::Settings(SettingsCommand::Show) => {
            output::print_settings(settings.processing(), settings.ssh());
        }
        Command::Settings(SettingsCommand::Set(args)) => {
            if !args.processing.is_empty() {
                let processing = args.processing.apply(*settings.processing());
                settings.update_processing(processing)?;
            }
            let mut ssh = settings.ssh().clone();
            let before = ssh.clone();
            if let Some(host) = args.host {
                ssh.host = host;
            }
            if let Some(port) = args.port {
                ssh.port = port;
            }
            if let Some(username) = args.username {
                ssh.username = username;
            }
            if let Some(password) = args.password {
                ssh.password = password;
            }
            if let Some(remote_path) = args.remote_path {
                ssh.remote_path = remote_path;
            }
            if ssh != before {
                settings.update_ssh(ssh)?;
            }
            output::print_settings(settings.processing(), settings.ssh());
        }
        Command::Tags(TagsCommand::List) => output::print_tags(settings.vocabulary()),
        Command::Tags(TagsCommand::Add { tag }) => {
            if !settings.add_vocabulary_tag(&tag)? {
                println!("Tag already present or blank: {tag:?}");
            }
            output::print_tags(settings.vocabulary());
        }
        Command::Tags(TagsCommand::Remove { tag }) => {
            if !settings.remove_vocabulary_tag(&tag)? {
                println!("No such tag: {tag:?}");
            }
            output::print_tags(settings.vocabulary());
        }
        Command::Taxonomy(command) => {
            let mut tag_settings = settings.tag_settings().clone();
            let changed = match command {
                TaxonomyCommand::Show => false,
                TaxonomyCommand::AddCategory { path } => {
                    tag_settings.categories.insert_path(&path).is_some()
                }
                TaxonomyCommand::RemoveCategory { path } => {
                    tag_settings.categories.remove_path(&path)
                }
                TaxonomyCommand::AddTag { tag } => tag_settings.tags.add(&tag),
                TaxonomyCommand::RemoveTag { tag } => tag_settings.tags.remove(&tag),
            };
            if changed {
                settings.update_tag_settings(tag_settings)?;
            }
            output::print_tag_settings(settings.tag_settings());
        }
    }

    Ok(())
}

/// Load, tag, process and bundle in one run.
fn run_export(
    settings: SettingsService<DirStore>,
    args: ExportArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let compressor = RustCompressor::new();
    let mut session =
        Session::new(settings, &compressor).with_exporter(Exporter::with_prefix(&args.prefix));
    if !args.processing.is_empty() {
        let processing = args.processing.apply(*session.settings().processing());
        session.override_processing(processing);
    }

    println!("==> Loading {} path(s)", args.paths.len());
    let scanned = scan::scan_inputs(&args.paths)?;
    let (sources, descriptions): (Vec<_>, Vec<_>) =
        scanned.into_iter().map(|s| (s.source, s.description)).unzip();
    let ids = session.load_files(sources)?;
    for (&id, description) in ids.iter().zip(descriptions) {
        if let Some(text) = description {
            session
                .queue_mut()
                .update_metadata(id, MetadataPatch::description(text));
        }
    }

    session.batch_add_tags(args.tags.as_slice())?;
    for (file, tag) in &args.image_tags {
        match find_by_name(&session, &ids, file) {
            Some(id) => {
                session.add_tag(id, tag)?;
            }
            None => log::warn!("--image-tag {}={}: no queued image named {}", file, tag, file),
        }
    }
    output::print_queue(session.queue());

    println!("==> Processing");
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = session.process_all(Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    result?;

    println!("==> Exporting");
    let bundle = session.export(chrono::Local::now().date_naive())?;
    std::fs::create_dir_all(&args.out)?;
    let path = args.out.join(&bundle.file_name);
    std::fs::write(&path, &bundle.bytes)?;
    output::print_export(&bundle);
    println!("==> Wrote {}", path.display());

    Ok(())
}

fn find_by_name(
    session: &Session<'_, DirStore>,
    ids: &[ImageId],
    file: &str,
) -> Option<ImageId> {
    ids.iter()
        .copied()
        .find(|&id| session.queue().get(id).is_some_and(|e| e.source_name() == file))
}
