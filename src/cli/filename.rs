use anyhow::{Context, Result};
use std::path::PathBuf;

use obs2nc::generator::ContainerGenerator;

/// Print the file name synthesized for a start time
pub fn run(schema: PathBuf, time: String) -> Result<()> {
    let generator = ContainerGenerator::from_path(&schema)
        .with_context(|| format!("Failed to load schema: {}", schema.display()))?;

    if generator.schema().naming().is_none() {
        anyhow::bail!("Schema has no naming section: {}", schema.display());
    }

    let name = generator.file_name(&time)?;
    println!("{}", name);
    Ok(())
}
