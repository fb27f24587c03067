//! Integration tests for the archive container format
//!
//! These tests verify:
//! 1. MimeType compliance (first entry, uncompressed)
//! 2. Manifest structure and data entry layout
//! 3. Atomic replacement: failed renders never touch the target path

use obs2nc::container::{
    ArchiveReader, Manifest, CONTAINER_MIMETYPE, MANIFEST_ENTRY, MIMETYPE_ENTRY,
};
use obs2nc::generator::{ContainerGenerator, GeneratorConfig, RenderError, RenderOptions};
use obs2nc::records::{parse_records, Record};
use std::fs::File;
use std::io::Read;
use tempfile::tempdir;
use zip::ZipArchive;

const SCHEMA: &str = r#"{
    "head": {
        "site": [
            ["station", ["Station_Name", "string", [], "Station name", "-", ""]],
            ["-", ["Elevation", "float", [], "Elevation", "m", 1812.5]]
        ]
    },
    "observation": [
        ["Datetime", "string", [["Datetime", null]], "Datetime", "yyyy-mm-dd hh:mm:ss"],
        ["T", "float", [["Datetime", null]], "Air temperature", "K"],
        ["RH", "ubyte", [["Datetime", null]], "Relative humidity", "%"]
    ]
}"#;

fn batch() -> Vec<Record> {
    parse_records(
        r#"[
        {"Datetime": "2024-03-01 10:00:00", "station": "Xueshan", "T": 280.5, "RH": 80},
        {"Datetime": "2024-03-01 10:01:00", "T": 280.25, "RH": 81}
    ]"#,
    )
    .unwrap()
}

fn render(target: &std::path::Path) {
    let generator = ContainerGenerator::from_json_str(SCHEMA).unwrap();
    let batch = batch();
    let options = RenderOptions::from_batch(&batch, "Datetime").created_at("2024-03-02 00:00:00");
    generator.render_with(target, &batch, &options).unwrap();
}

#[test]
fn test_container_mimetype_compliance() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("mimetype_test.nc");
    render(&target);

    let file = File::open(&target).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();

    // Verify mimetype is first entry
    let mut first_entry = archive.by_index(0).unwrap();
    assert_eq!(first_entry.name(), MIMETYPE_ENTRY, "First entry must be mimetype");

    // Verify mimetype is uncompressed
    assert_eq!(
        first_entry.compression(),
        zip::CompressionMethod::Stored,
        "mimetype must be uncompressed (Stored)"
    );

    let mut content = String::new();
    first_entry.read_to_string(&mut content).unwrap();
    assert_eq!(content, CONTAINER_MIMETYPE);
}

#[test]
fn test_container_entry_layout() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("layout.nc");
    render(&target);

    let file = File::open(&target).unwrap();
    let mut archive = ZipArchive::new(file).unwrap();
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    for expected in [
        "data/head/site/Station_Name.bin",
        "data/head/site/Elevation.bin",
        "data/observation/Datetime.bin",
        "data/observation/T.bin",
        "data/observation/RH.bin",
        MANIFEST_ENTRY,
    ] {
        assert!(names.iter().any(|n| n == expected), "missing entry {expected}");
    }

    let manifest: Manifest = {
        let mut entry = archive.by_name(MANIFEST_ENTRY).unwrap();
        assert_eq!(entry.compression(), zip::CompressionMethod::Deflated);
        let mut json = String::new();
        entry.read_to_string(&mut json).unwrap();
        serde_json::from_str(&json).unwrap()
    };
    assert_eq!(manifest.root.groups.len(), 2);
    assert_eq!(manifest.root.groups[0].name, "head");
    assert_eq!(manifest.root.groups[1].name, "observation");

    let datetime = manifest.variable("observation/Datetime").unwrap();
    assert_eq!(datetime.tag, "str");
    assert_eq!(datetime.compression, None);
    let rh = manifest.variable("observation/RH").unwrap();
    assert_eq!(rh.tag, "u1");
    assert_eq!(rh.compression, Some(4));

    let strings = archive.by_name("data/observation/Datetime.bin").unwrap();
    assert_eq!(strings.compression(), zip::CompressionMethod::Stored);
}

#[test]
fn test_failed_render_keeps_previous_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("keep.nc");
    render(&target);
    let before = std::fs::read(&target).unwrap();

    let generator = ContainerGenerator::from_json_str(SCHEMA).unwrap();
    let mut batch = batch();
    batch[1].insert("RH".to_string(), serde_json::json!(512));
    let err = generator.render(&target, &batch).unwrap_err();
    assert!(matches!(err, RenderError::ValueConversion { .. }));

    assert_eq!(std::fs::read(&target).unwrap(), before);
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1, "no temporary files may remain");
}

#[test]
fn test_compression_level_is_recorded() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("max.nc");
    let generator = ContainerGenerator::with_config(
        &obs2nc::schema::SchemaDeclaration::from_json_str(SCHEMA).unwrap(),
        GeneratorConfig::max_compression(),
    )
    .unwrap();
    generator.render(&target, &batch()).unwrap();

    let reader = ArchiveReader::open(&target).unwrap();
    assert_eq!(
        reader.manifest().variable("observation/T").unwrap().compression,
        Some(9)
    );
    assert_eq!(
        reader.manifest().variable("head/site/Station_Name").unwrap().compression,
        None
    );
}

#[test]
fn test_reader_rejects_plain_file() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("plain.nc");
    std::fs::write(&target, b"CDF\x01 not an archive").unwrap();
    assert!(ArchiveReader::open(&target).is_err());
}
