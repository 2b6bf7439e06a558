//! End-to-end run through the public API: load, tag, process with the real
//! compressor, export, and read the zip back.

use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use wp_image_optimiser::export::ExportError;
use wp_image_optimiser::imaging::RustCompressor;
use wp_image_optimiser::queue::{ImageStatus, SourceFile};
use wp_image_optimiser::session::{Session, SessionError};
use wp_image_optimiser::settings::{OutputFormat, ProcessingSettings, SettingsService, SshSettings};
use wp_image_optimiser::storage::{DirStore, MemoryStore};

fn encoded(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, format)
        .unwrap();
    buffer.into_inner()
}

fn unzip(bytes: &[u8]) -> (Vec<String>, BTreeMap<String, Vec<u8>>) {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut names = Vec::new();
    let mut files = BTreeMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        names.push(file.name().to_string());
        files.insert(file.name().to_string(), content);
    }
    (names, files)
}

fn date() -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
}

fn settings() -> SettingsService<MemoryStore> {
    let mut settings = SettingsService::load(MemoryStore::new()).unwrap();
    settings
        .update_processing(ProcessingSettings {
            max_width: 800,
            quality: 0.8,
            format: OutputFormat::Webp,
        })
        .unwrap();
    settings
}

#[test]
fn hero_scenario_produces_named_outputs_and_bundle() {
    let compressor = RustCompressor::new();
    let mut session = Session::new(settings(), &compressor);
    let ids = session
        .load_files([
            SourceFile::new("a.png", encoded(1600, 900, ImageFormat::Png)),
            SourceFile::new("b.jpg", encoded(640, 480, ImageFormat::Jpeg)),
        ])
        .unwrap();
    session.add_tag(ids[0], "Hero").unwrap();

    let summary = session.process_all(None).unwrap();
    assert_eq!(summary.completed, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(session.queue().count_with_status(ImageStatus::Completed), 2);

    let a = session.queue().get(ids[0]).unwrap().result().unwrap();
    let b = session.queue().get(ids[1]).unwrap().result().unwrap();
    assert_eq!(a.file_name, "a [Hero].webp");
    assert_eq!(b.file_name, "b.webp");

    let bundle = session.export(date()).unwrap();
    assert_eq!(bundle.file_name, "wordpress-images-2025-06-01.zip");
    let (names, files) = unzip(&bundle.bytes);
    assert_eq!(
        names,
        vec!["a [Hero].webp", "b.webp", "metadata.csv", "import.sh", "import.bat"]
    );

    // Downscaled to the longer edge, aspect kept; smaller images untouched
    let hero = image::load_from_memory(&files["a [Hero].webp"]).unwrap();
    assert_eq!(hero.dimensions(), (800, 450));
    let plain = image::load_from_memory(&files["b.webp"]).unwrap();
    assert_eq!(plain.dimensions(), (640, 480));

    let csv = String::from_utf8(files["metadata.csv"].clone()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "filename,title,alt,caption,description,tags");
    assert_eq!(lines[1], "a [Hero].webp,a,a,,,Hero");
    assert_eq!(lines[2], "b.webp,b,b,,,");

    let sh = String::from_utf8(files["import.sh"].clone()).unwrap();
    assert!(sh.starts_with("#!/bin/sh"));
    assert!(sh.contains("wp media import"));
}

#[test]
fn corrupt_source_fails_alone() {
    let compressor = RustCompressor::new();
    let mut session = Session::new(settings(), &compressor);
    session
        .load_files([
            SourceFile::new("good.png", encoded(100, 100, ImageFormat::Png)),
            SourceFile::new("broken.jpg", b"not an image".to_vec()),
        ])
        .unwrap();

    let summary = session.process_all(None).unwrap();
    assert_eq!((summary.completed, summary.failed), (1, 1));
    assert_eq!(session.queue().count_with_status(ImageStatus::Processing), 0);

    let bundle = session.export(date()).unwrap();
    assert_eq!(bundle.image_count, 1);
}

#[test]
fn invalid_quality_is_reported_per_image() {
    let compressor = RustCompressor::new();
    let mut settings = settings();
    settings
        .update_processing(ProcessingSettings {
            quality: 1.5,
            ..*settings.processing()
        })
        .unwrap();
    let mut session = Session::new(settings, &compressor);
    session
        .load_files([SourceFile::new("a.png", encoded(10, 10, ImageFormat::Png))])
        .unwrap();

    let summary = session.process_all(None).unwrap();
    assert_eq!(summary.failed, 1);
    assert!(matches!(
        session.export(date()),
        Err(SessionError::Export(ExportError::NothingToExport))
    ));
}

#[test]
fn ssh_bundle_with_persisted_settings() {
    let state = tempfile::TempDir::new().unwrap();
    {
        let mut settings = SettingsService::load(DirStore::open(state.path()).unwrap()).unwrap();
        settings
            .update_ssh(SshSettings {
                host: "example.com".into(),
                port: 2222,
                username: "deploy".into(),
                password: "hunter2".into(),
                remote_path: "/var/www/html".into(),
            })
            .unwrap();
    }

    let settings = SettingsService::load(DirStore::open(state.path()).unwrap()).unwrap();
    assert!(settings.ssh().is_configured());
    let compressor = RustCompressor::new();
    let mut session = Session::new(settings, &compressor);
    session.override_processing(ProcessingSettings {
        format: OutputFormat::Jpeg,
        ..Default::default()
    });
    session
        .load_files([SourceFile::new("shoe.png", encoded(300, 200, ImageFormat::Png))])
        .unwrap();
    session.process_all(None).unwrap();

    let bundle = session.export(date()).unwrap();
    let (names, files) = unzip(&bundle.bytes);
    assert_eq!(
        names,
        vec![
            "shoe.jpg",
            "metadata.csv",
            "ssh-config.txt",
            "import.sh",
            "import.bat",
            "import.ps1",
            "wp-setup.sh",
            "wp-setup.bat",
            "README.txt",
        ]
    );
    let config = String::from_utf8(files["ssh-config.txt"].clone()).unwrap();
    assert!(config.contains("hunter2"));
    let ps1 = String::from_utf8(files["import.ps1"].clone()).unwrap();
    assert!(ps1.contains("Import-Csv"));
    assert_eq!(
        image::guess_format(&files["shoe.jpg"]).unwrap(),
        ImageFormat::Jpeg
    );
}
