//! # obs2nc
//!
//! Command-line driver for rendering observation records into container files.
//!
//! ## Usage
//!
//! ```bash
//! # Render records, one file per 360 records, named from the schema
//! obs2nc render --schema radar.json --records radar.jsonl --output-dir out --batch-size 360
//!
//! # Show the file name for a start time
//! obs2nc filename --schema radar.json --time "2024-03-01 10:00:00"
//!
//! # Inspect an archive container
//! obs2nc inspect out/RADA_MODI_MOBS_SUOB_WNFB_RRD_METE_Lraw_20240301_100000_FMT_QC.nc
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
