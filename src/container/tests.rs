use super::*;
use std::fs::File;
use std::io::Read;

use tempfile::tempdir;
use zip::{CompressionMethod, ZipArchive};

use crate::dtype::NcType;

fn path(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn write_sample(target: &Path) -> u64 {
    let mut writer = ContainerWriter::create(target, ContainerFormat::Archive).unwrap();
    writer.add_dimension(&Dimension::new("Datetime", None)).unwrap();
    writer.add_dimension(&Dimension::new("level", Some(2))).unwrap();
    writer.add_group(&path(&["head"])).unwrap();
    writer.add_group(&path(&["observation"])).unwrap();

    writer
        .add_variable(
            &path(&["head"]),
            VariableSpec::new("Station_Name")
                .attribute(ATTR_LONG_NAME, "station name")
                .attribute(ATTR_UNITS, ""),
            &VariableData::String(vec!["Xueshan".into()]),
        )
        .unwrap();
    writer
        .add_variable(
            &path(&["observation"]),
            VariableSpec::new("T")
                .dim("Datetime", 3)
                .attribute(ATTR_UNITS, "K")
                .compression(Some(4)),
            &VariableData::Float(vec![280.5, 281.0, 279.75]),
        )
        .unwrap();
    writer
        .add_variable(
            &path(&["observation"]),
            VariableSpec::new("profile")
                .dim("Datetime", 3)
                .dim("level", 2)
                .compression(Some(4)),
            &VariableData::Short(vec![1, 2, 3, 4, 5, 6]),
        )
        .unwrap();
    writer.finish().unwrap()
}

#[test]
fn test_archive_write_and_read() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("out.nc");
    let size = write_sample(&target);
    assert_eq!(size, std::fs::metadata(&target).unwrap().len());

    let mut reader = ArchiveReader::open(&target).unwrap();
    let manifest = reader.manifest().clone();
    assert_eq!(manifest.format_version, MANIFEST_VERSION);

    let datetime = manifest.dimension("Datetime").unwrap();
    assert_eq!(datetime.size, None);
    assert_eq!(datetime.length, 3);
    assert_eq!(manifest.dimension("level").unwrap().length, 2);

    let station = manifest.variable("head/Station_Name").unwrap();
    assert_eq!(station.nc_type, NcType::String);
    assert_eq!(station.tag, "str");
    assert!(station.shape.is_empty());
    assert_eq!(station.compression, None);
    assert_eq!(station.attributes[ATTR_LONG_NAME], "station name");

    let profile = manifest.variable("observation/profile").unwrap();
    assert_eq!(profile.dims, vec!["Datetime", "level"]);
    assert_eq!(profile.shape, vec![3, 2]);
    assert_eq!(profile.compression, Some(4));

    assert_eq!(
        reader.read_variable("observation/T").unwrap(),
        VariableData::Float(vec![280.5, 281.0, 279.75])
    );
    assert_eq!(
        reader.read_variable("head/Station_Name").unwrap(),
        VariableData::String(vec!["Xueshan".into()])
    );
    assert!(matches!(
        reader.read_variable("observation/missing"),
        Err(ContainerError::VariableNotFound(_))
    ));
}

#[test]
fn test_mimetype_is_first_and_stored() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("out.nc");
    write_sample(&target);

    let mut archive = ZipArchive::new(File::open(&target).unwrap()).unwrap();
    let mut first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), MIMETYPE_ENTRY);
    assert_eq!(first.compression(), CompressionMethod::Stored);
    let mut content = String::new();
    first.read_to_string(&mut content).unwrap();
    assert_eq!(content, CONTAINER_MIMETYPE);
    drop(first);

    let strings = archive.by_name("data/head/Station_Name.bin").unwrap();
    assert_eq!(strings.compression(), CompressionMethod::Stored);
    drop(strings);
    let numbers = archive.by_name("data/observation/T.bin").unwrap();
    assert_eq!(numbers.compression(), CompressionMethod::Deflated);
}

#[test]
fn test_output_is_byte_identical() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.nc");
    let b = dir.path().join("b.nc");
    write_sample(&a);
    write_sample(&b);
    assert_eq!(std::fs::read(&a).unwrap(), std::fs::read(&b).unwrap());
}

#[test]
fn test_unfinished_writer_leaves_nothing() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("nested").join("out.nc");
    {
        let mut writer = ArchiveWriter::create(&target).unwrap();
        writer.add_dimension(&Dimension::new("x", Some(1))).unwrap();
    }
    assert!(!target.exists());
    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("nested"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_shape_errors() {
    let dir = tempdir().unwrap();
    let mut writer = ArchiveWriter::create(dir.path().join("out.nc")).unwrap();
    writer.add_dimension(&Dimension::new("level", Some(2))).unwrap();
    writer.add_group(&path(&["g"])).unwrap();

    let err = writer
        .add_variable(
            &path(&["g"]),
            VariableSpec::new("v").dim("level", 3),
            &VariableData::Int(vec![1, 2, 3]),
        )
        .unwrap_err();
    assert!(matches!(err, ContainerError::ShapeMismatch { .. }));

    let err = writer
        .add_variable(
            &path(&["g"]),
            VariableSpec::new("v").dim("level", 2),
            &VariableData::Int(vec![1]),
        )
        .unwrap_err();
    assert!(matches!(err, ContainerError::ShapeMismatch { .. }));

    let err = writer
        .add_variable(
            &path(&["g"]),
            VariableSpec::new("v").dim("depth", 1),
            &VariableData::Int(vec![1]),
        )
        .unwrap_err();
    assert!(matches!(err, ContainerError::UnknownDimension { .. }));
}

#[test]
fn test_shape_overflow_rejected() {
    let dir = tempdir().unwrap();
    let mut writer = ArchiveWriter::create(dir.path().join("out.nc")).unwrap();
    let huge = 1usize << (usize::BITS / 2);
    writer.add_dimension(&Dimension::new("a", Some(huge))).unwrap();
    writer.add_dimension(&Dimension::new("b", Some(huge))).unwrap();
    writer.add_group(&path(&["g"])).unwrap();

    let err = writer
        .add_variable(
            &path(&["g"]),
            VariableSpec::new("v").dim("a", huge).dim("b", huge),
            &VariableData::Int(vec![]),
        )
        .unwrap_err();
    assert!(matches!(err, ContainerError::ShapeMismatch { ref reason, .. } if reason.contains("overflow")));
}

#[test]
fn test_group_errors() {
    let dir = tempdir().unwrap();
    let mut writer = ArchiveWriter::create(dir.path().join("out.nc")).unwrap();
    writer.add_group(&path(&["head"])).unwrap();
    assert!(matches!(
        writer.add_group(&path(&["head"])),
        Err(ContainerError::DuplicateEntry(_))
    ));
    assert!(matches!(
        writer.add_group(&path(&["missing", "child"])),
        Err(ContainerError::UnknownGroup(_))
    ));
    writer.add_dimension(&Dimension::new("x", None)).unwrap();
    assert!(matches!(
        writer.add_dimension(&Dimension::new("x", Some(4))),
        Err(ContainerError::DuplicateDimension(_))
    ));
}

#[test]
fn test_reader_rejects_foreign_zip() {
    let dir = tempdir().unwrap();
    let target = dir.path().join("foreign.zip");
    {
        let mut zip = zip::ZipWriter::new(File::create(&target).unwrap());
        zip.start_file("readme.txt", zip::write::SimpleFileOptions::default())
            .unwrap();
        std::io::Write::write_all(&mut zip, b"hello").unwrap();
        zip.finish().unwrap();
    }
    assert!(matches!(
        ArchiveReader::open(&target),
        Err(ContainerError::InvalidFormat(_))
    ));
}

#[test]
fn test_format_parsing() {
    assert_eq!("archive".parse::<ContainerFormat>().unwrap(), ContainerFormat::Archive);
    assert_eq!("ZIP".parse::<ContainerFormat>().unwrap(), ContainerFormat::Archive);
    assert!("hdf5".parse::<ContainerFormat>().is_err());
    assert_eq!(ContainerFormat::default().to_string(), "archive");
}

#[cfg(feature = "netcdf")]
mod netcdf_backend {
    use super::*;
    use crate::generator::{ContainerGenerator, GeneratorConfig, RenderOptions};
    use crate::records::parse_records;

    fn text_attribute(var: &netcdf::Variable<'_>, name: &str) -> String {
        match var.attribute(name).unwrap().value().unwrap() {
            netcdf::AttributeValue::Str(s) => s,
            other => panic!("unexpected attribute value: {other:?}"),
        }
    }

    #[test]
    fn test_netcdf_writer_nested_groups() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested.nc");

        let mut writer = ContainerWriter::create(&target, ContainerFormat::NetCdf).unwrap();
        writer.add_dimension(&Dimension::new("time", None)).unwrap();
        writer.add_dimension(&Dimension::new("level", Some(2))).unwrap();
        writer.add_group(&path(&["observation"])).unwrap();
        writer.add_group(&path(&["observation", "radar"])).unwrap();
        writer
            .add_variable(
                &path(&["observation", "radar"]),
                VariableSpec::new("profile")
                    .dim("time", 3)
                    .dim("level", 2)
                    .attribute(ATTR_LONG_NAME, "Reflectivity profile")
                    .attribute(ATTR_UNITS, "dBZ")
                    .compression(Some(4)),
                &VariableData::Short(vec![1, 2, 3, 4, 5, 6]),
            )
            .unwrap();
        writer
            .add_variable(
                &path(&["observation", "radar"]),
                VariableSpec::new("flags").dim("time", 3),
                &VariableData::String(vec!["a".into(), "b".into(), "c".into()]),
            )
            .unwrap();
        let size = writer.finish().unwrap();
        assert_eq!(size, std::fs::metadata(&target).unwrap().len());

        let file = netcdf::open(&target).unwrap();
        assert!(file.dimension("time").unwrap().is_unlimited());
        assert_eq!(file.dimension("time").unwrap().len(), 3);

        let profile = file.variable("observation/radar/profile").unwrap();
        let dims: Vec<(String, usize)> = profile
            .dimensions()
            .iter()
            .map(|d| (d.name(), d.len()))
            .collect();
        assert_eq!(dims, vec![("time".to_string(), 3), ("level".to_string(), 2)]);
        assert_eq!(profile.get_values::<i16, _>(..).unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(text_attribute(&profile, ATTR_LONG_NAME), "Reflectivity profile");
        assert_eq!(text_attribute(&profile, ATTR_UNITS), "dBZ");

        let flags = file.variable("observation/radar/flags").unwrap();
        assert_eq!(flags.get_string([2usize]).unwrap(), "c");
    }

    #[test]
    fn test_netcdf_unfinished_writer_removes_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("partial.nc");
        {
            let mut writer = NetCdfWriter::create(&target).unwrap();
            writer.add_dimension(&Dimension::new("time", None)).unwrap();
            assert!(target.exists());
        }
        assert!(!target.exists());
    }

    #[test]
    fn test_netcdf_render_round_trip() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("station.nc");
        let generator = ContainerGenerator::with_config(
            &crate::schema::SchemaDeclaration::from_json_str(
                r#"{
                "head": { "station": [["-", ["Elevation", "float", [], "Elevation", "m", 2864.0]]] },
                "observation": [
                    ["Datetime", "string", [["T", null]], "Datetime", "-"],
                    ["+", ["Temperature", "double", [["T", null]], "Air temperature", "K"]]
                ]
            }"#,
            )
            .unwrap(),
            GeneratorConfig::default().with_format(ContainerFormat::NetCdf),
        )
        .unwrap();
        let batch = parse_records(
            r#"[
            {"Datetime": "2024-03-01 10:00:00", "Temperature": 280.5},
            {"Datetime": "2024-03-01 10:00:10", "Temperature": 281.0}
        ]"#,
        )
        .unwrap();
        let options =
            RenderOptions::from_batch(&batch, "Datetime").created_at("2024-03-02 00:00:00");
        let stats = generator.render_with(&target, &batch, &options).unwrap();
        assert_eq!(stats.records, 2);

        let file = netcdf::open(&target).unwrap();
        let elevation = file.variable("head/station/Elevation").unwrap();
        assert!(elevation.dimensions().is_empty());
        assert_eq!(elevation.get_values::<f32, _>(..).unwrap(), vec![2864.0]);
        assert_eq!(text_attribute(&elevation, ATTR_UNITS), "m");

        let temperature = file.variable("observation/Temperature").unwrap();
        assert_eq!(temperature.get_values::<f64, _>(..).unwrap(), vec![280.5, 281.0]);
        assert_eq!(text_attribute(&temperature, ATTR_LONG_NAME), "Air temperature");

        let times = file.variable("observation/Datetime").unwrap();
        assert_eq!(times.get_string([1usize]).unwrap(), "2024-03-01 10:00:10");
    }
}
