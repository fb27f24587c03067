use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod filename;
mod inspect;
mod render;

use render::RenderArgs;

/// obs2nc - Schema-driven observation container generator
#[derive(Parser)]
#[command(name = "obs2nc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render observation records into container files
    Render {
        /// Declarative schema (JSON)
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Records as a JSON array or JSON Lines
        #[arg(short, long, value_name = "RECORDS")]
        records: PathBuf,

        /// Output file, used when the schema has no naming section
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,

        /// Directory for synthesized file names
        #[arg(short = 'd', long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Records per output file (default: all records in one file)
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Container format (archive, netcdf)
        #[arg(short, long)]
        format: Option<String>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        // === Advanced tuning flags (hidden from --help) ===
        /// Deflate level for numeric variables (0-9, default: 4)
        #[arg(short = 'c', long, hide = true)]
        compression_level: Option<u32>,

        /// Record key holding the timestamp (default: Datetime)
        #[arg(long, hide = true)]
        time_key: Option<String>,
    },

    /// Print the file name synthesized for a start time
    Filename {
        /// Declarative schema (JSON) with a naming section
        #[arg(short, long, value_name = "SCHEMA")]
        schema: PathBuf,

        /// Start time, YYYY-MM-DD HH:MM:SS[.fraction]
        #[arg(short, long)]
        time: String,
    },

    /// Display the structure of an archive container
    Inspect {
        /// Container file path
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print up to N values of each variable
        #[arg(long, value_name = "N", default_value_t = 0)]
        values: usize,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Render {
            schema,
            records,
            output,
            output_dir,
            batch_size,
            format,
            config,
            compression_level,
            time_key,
        } => render::run(RenderArgs {
            schema,
            records,
            output,
            output_dir,
            batch_size,
            format,
            compression_level,
            time_key,
            config,
        }),
        Commands::Filename { schema, time } => filename::run(schema, time),
        Commands::Inspect { file, values } => inspect::run(file, values),
    }
}
