use anyhow::{Context, Result};
use log::{info, warn};
use std::path::{Path, PathBuf};

use obs2nc::container::ContainerFormat;
use obs2nc::generator::{ContainerGenerator, GeneratorConfig, RenderOptions};
use obs2nc::records::{load_records, Record};
use obs2nc::schema::naming::FILE_EXTENSION;

use super::config::Config;

/// Arguments of the render command
#[derive(Debug, Default)]
pub struct RenderArgs {
    pub schema: PathBuf,
    pub records: PathBuf,
    pub output: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub format: Option<String>,
    pub compression_level: Option<u32>,
    pub time_key: Option<String>,
    pub config: Option<PathBuf>,
}

/// Render records into one container per batch
pub fn run(args: RenderArgs) -> Result<()> {
    let settings = match &args.config {
        Some(path) => Config::from_file(path)?.render,
        None => Config::default().render,
    };

    let mut config = GeneratorConfig::default();
    if let Some(level) = args.compression_level.or(settings.compression_level) {
        config.compression_level = level;
    }
    if let Some(time_key) = args.time_key.or(settings.time_key) {
        config.time_key = time_key;
    }
    if let Some(format) = args.format.or(settings.format) {
        config.format = format
            .parse::<ContainerFormat>()
            .with_context(|| format!("Invalid format: {}", format))?;
    }

    let mut generator = ContainerGenerator::from_path(&args.schema)
        .with_context(|| format!("Failed to load schema: {}", args.schema.display()))?;
    generator.set_config(config);

    let records = load_records(&args.records)
        .with_context(|| format!("Failed to load records: {}", args.records.display()))?;
    if records.is_empty() {
        anyhow::bail!("No records in {}", args.records.display());
    }

    let batch_size = args
        .batch_size
        .or(settings.batch_size)
        .unwrap_or(records.len())
        .max(1);
    let output_dir = args.output_dir.or(settings.output_dir);
    let batch_count = records.len().div_ceil(batch_size);

    info!("obs2nc - records to containers");
    info!("Schema:  {}", args.schema.display());
    info!("Records: {} ({} batches)", records.len(), batch_count);
    info!("Format:  {}", generator.config().format);

    let mut total_bytes = 0;
    for (index, batch) in records.chunks(batch_size).enumerate() {
        let target = output_path(
            &generator,
            batch,
            args.output.as_deref(),
            output_dir.as_deref(),
            index,
            batch_count,
        )?;
        if index == 0 && is_archive_named_netcdf(generator.config().format, &target) {
            warn!(
                "{} is a ZIP archive despite its .nc name; netCDF tools cannot open it \
                 (use --format netcdf for NetCDF-4 output)",
                target.display()
            );
        }
        let stats = generator
            .render(&target, batch)
            .with_context(|| format!("Failed to render batch {} to {}", index, target.display()))?;
        info!("{}", stats);
        total_bytes += stats.bytes_written;
    }

    info!(
        "Rendered {} records into {} files ({} bytes)",
        records.len(),
        batch_count,
        total_bytes
    );
    Ok(())
}

/// Archive output carrying the NetCDF file extension
fn is_archive_named_netcdf(format: ContainerFormat, path: &Path) -> bool {
    format == ContainerFormat::Archive
        && path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(FILE_EXTENSION))
            .unwrap_or(false)
}

/// Pick the target path for one batch.
///
/// Named schemas put the synthesized name under `output_dir` (or the
/// directory of `output`). Otherwise `output` is used as given, with a batch
/// index inserted before the extension when there are several batches.
fn output_path(
    generator: &ContainerGenerator,
    batch: &[Record],
    output: Option<&Path>,
    output_dir: Option<&Path>,
    index: usize,
    batch_count: usize,
) -> Result<PathBuf> {
    let start = RenderOptions::from_batch(batch, &generator.config().time_key).start_time;

    if generator.schema().naming().is_some() {
        let start = start.with_context(|| {
            format!(
                "Batch {} has no '{}' value to name the file",
                index,
                generator.config().time_key
            )
        })?;
        let name = generator.file_name(&start)?;
        let dir = output_dir
            .or_else(|| output.and_then(Path::parent))
            .unwrap_or_else(|| Path::new("."));
        return Ok(dir.join(name));
    }

    let output = match (output, output_dir) {
        (Some(output), _) => output.to_path_buf(),
        (None, Some(dir)) => dir.join("output.nc"),
        (None, None) => {
            anyhow::bail!("Schema has no naming section; pass --output to name the file")
        }
    };
    if batch_count == 1 {
        return Ok(output);
    }

    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{}_{:04}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{:04}", stem, index),
    };
    Ok(output.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use obs2nc::records::parse_records;

    const NAMED: &str = r#"{
        "head": [["-", ["Country", "string", [], "Country", "-", "China"]]],
        "observation": [["Datetime", "string", [["Datetime", null]], "Datetime", "-"]],
        "name": ["RADA", "MODI", "MOBS", "SUOB", "WNFB", "", "RRD", "METE", "Lraw", "", "FMT", true]
    }"#;

    const UNNAMED: &str = r#"{
        "head": [["-", ["Country", "string", [], "Country", "-", "China"]]],
        "observation": [["Datetime", "string", [["Datetime", null]], "Datetime", "-"]]
    }"#;

    fn batch() -> Vec<Record> {
        parse_records(r#"[{"Datetime": "2024-03-01 10:00:00"}]"#).unwrap()
    }

    #[test]
    fn test_named_output_path() {
        let generator = ContainerGenerator::from_json_str(NAMED).unwrap();
        let path = output_path(&generator, &batch(), None, Some(Path::new("out")), 0, 1).unwrap();
        assert_eq!(
            path,
            Path::new("out").join("RADA_MODI_MOBS_SUOB_WNFB_RRD_METE_Lraw_20240301_100000_FMT_QC.nc")
        );
    }

    #[test]
    fn test_unnamed_output_path() {
        let generator = ContainerGenerator::from_json_str(UNNAMED).unwrap();
        let output = Path::new("out/station.nc");
        assert_eq!(
            output_path(&generator, &batch(), Some(output), None, 0, 1).unwrap(),
            PathBuf::from("out/station.nc")
        );
        assert_eq!(
            output_path(&generator, &batch(), Some(output), None, 2, 3).unwrap(),
            PathBuf::from("out/station_0002.nc")
        );
        assert!(output_path(&generator, &batch(), None, None, 0, 1).is_err());
    }

    #[test]
    fn test_archive_named_netcdf_detected() {
        assert!(is_archive_named_netcdf(
            ContainerFormat::Archive,
            Path::new("out/station.nc")
        ));
        assert!(is_archive_named_netcdf(
            ContainerFormat::Archive,
            Path::new("STATION.NC")
        ));
        assert!(!is_archive_named_netcdf(
            ContainerFormat::Archive,
            Path::new("out/station.zip")
        ));
        assert!(!is_archive_named_netcdf(ContainerFormat::Archive, Path::new("station")));
    }
}
