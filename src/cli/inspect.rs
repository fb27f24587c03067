use anyhow::{Context, Result};
use std::path::PathBuf;

use obs2nc::container::{ArchiveReader, ManifestGroup};

/// Display the structure of an archive container
pub fn run(file: PathBuf, values: usize) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let mut reader = ArchiveReader::open(&file)
        .with_context(|| format!("Failed to open container: {}", file.display()))?;
    let manifest = reader.manifest().clone();

    println!("Container Information");
    println!("=====================");
    println!("File: {}", file.display());
    println!("Format version: {}", manifest.format_version);
    println!();

    println!("Dimensions:");
    for dim in &manifest.dimensions {
        match dim.size {
            Some(size) => println!("  {} = {}", dim.name, size),
            None => println!("  {} = UNLIMITED ({} currently)", dim.name, dim.length),
        }
    }
    println!();

    println!("Groups:");
    print_group(&manifest.root, 0);

    if values > 0 {
        println!();
        println!("Values:");
        for (path, var) in manifest.variables() {
            let data = reader
                .read_variable(&path)
                .with_context(|| format!("Failed to read variable: {}", path))?;
            let shown: Vec<String> = (0..data.len().min(values))
                .filter_map(|i| data.value(i))
                .map(|v| v.to_string())
                .collect();
            let more = if data.len() > values { ", ..." } else { "" };
            println!("  {} ({}): [{}{}]", path, var.tag, shown.join(", "), more);
        }
    }

    Ok(())
}

fn print_group(group: &ManifestGroup, depth: usize) {
    let indent = "  ".repeat(depth + 1);
    if !group.name.is_empty() {
        println!("{}{}/", indent, group.name);
    }
    for var in &group.variables {
        let dims = if var.dims.is_empty() {
            String::new()
        } else {
            format!("({})", var.dims.join(", "))
        };
        println!("{}  {} {}{}", indent, var.tag, var.name, dims);
        for (key, value) in &var.attributes {
            println!("{}    :{} = \"{}\"", indent, key, value);
        }
    }
    for child in &group.groups {
        print_group(child, if group.name.is_empty() { depth } else { depth + 1 });
    }
}
