//! lineidx CLI
//!
//! Command-line tools for line-indexed row tables.
//!
//! # Commands
//!
//! - `convert` - Convert a COCO dataset into payload, label and size tables
//! - `linelist` - Build a selection list from a label table
//! - `inspect` - Show table statistics or a single row
//! - `verify` - Check index offsets against the data file
//! - `recover` - Cut an interrupted append back to its last indexed row

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// lineidx row table tools.
#[derive(Parser)]
#[command(name = "lineidx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a COCO dataset into row tables
    Convert {
        /// COCO instances JSON file
        #[arg(short, long)]
        annotations: PathBuf,

        /// Directory holding the images
        #[arg(short, long)]
        images: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Split name used as the file stem of every table
        #[arg(short, long, default_value = lineidx_coco::DEFAULT_SPLIT)]
        split: String,

        /// Source images between flushes
        #[arg(short, long, default_value_t = lineidx_coco::DEFAULT_BATCH_SIZE)]
        batch_size: usize,

        /// Label attribute that marks a label as ignorable (repeatable)
        #[arg(long = "ignore-attr")]
        ignore_attrs: Vec<String>,

        /// Selection list path (default: <output>/<split>.linelist.tsv)
        #[arg(long)]
        linelist: Option<PathBuf>,

        /// Append to existing tables instead of recreating them
        #[arg(long)]
        append: bool,
    },

    /// Build a selection list from a label table
    Linelist {
        /// Label table data file
        labels: PathBuf,

        /// Output path (default: <stem>.linelist.tsv next to the labels)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Label attribute that marks a label as ignorable (repeatable)
        #[arg(long = "ignore-attr")]
        ignore_attrs: Vec<String>,

        /// Zero-based field holding the JSON labels
        #[arg(long, default_value_t = 1)]
        label_field: usize,
    },

    /// Show table statistics or a single row
    Inspect {
        /// Table data file
        table: PathBuf,

        /// Print this row instead of statistics
        #[arg(short, long)]
        row: Option<usize>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Verify index offsets against the data file
    Verify {
        /// Table data file
        table: PathBuf,
    },

    /// Truncate an interrupted append back to its last indexed row
    Recover {
        /// Table data file
        table: PathBuf,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            annotations,
            images,
            output,
            split,
            batch_size,
            ignore_attrs,
            linelist,
            append,
        } => {
            let mut config = lineidx_coco::ConvertConfig::new(output, images)
                .split(split)
                .batch_size(batch_size)
                .ignore_attrs(ignore_attrs)
                .append(append);
            config.linelist_path = linelist;
            commands::convert::run(&annotations, config)?;
        }
        Commands::Linelist {
            labels,
            output,
            ignore_attrs,
            label_field,
        } => {
            commands::linelist::run(&labels, output.as_deref(), ignore_attrs, label_field)?;
        }
        Commands::Inspect { table, row, format } => {
            commands::inspect::run(&table, row, &format)?;
        }
        Commands::Verify { table } => {
            commands::verify::run(&table)?;
        }
        Commands::Recover { table } => {
            commands::recover::run(&table)?;
        }
        Commands::Version => {
            println!("lineidx CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("lineidx Core v{}", lineidx_core::VERSION);
        }
    }

    Ok(())
}
