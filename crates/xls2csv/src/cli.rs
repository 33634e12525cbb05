//! Command-line surface for the `xls2csv` binary.
//!
//! This lives in the library crate so the binary stays a thin wrapper.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::{convert_dir, ConvertOptions};

#[derive(Parser)]
#[command(about = "Convert a directory of legacy .xls workbooks into schema-typed CSV files.")]
pub struct Args {
    /// Directory containing `.xls` workbooks (scanned non-recursively).
    dir: PathBuf,

    /// Write each converted sheet as `<file>_<sheet>.csv` into this
    /// directory (created if missing).
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Input file paths to skip entirely (repeatable, exact match).
    #[arg(long = "ignore-file")]
    ignore_files: Vec<String>,

    /// Artifact keys to skip, e.g. `season_data.csv` (repeatable, exact
    /// match).
    #[arg(long = "ignore-sheet")]
    ignore_sheets: Vec<String>,

    /// Worker threads: 1 = sequential, 0 = all cores.
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Print every produced artifact key.
    #[arg(long)]
    list: bool,
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let options = ConvertOptions {
        out_dir: args.out_dir.clone(),
        ignore_files: args.ignore_files.iter().cloned().collect(),
        ignore_sheets: args.ignore_sheets.iter().cloned().collect(),
        workers: args.workers,
    };

    let artifacts = convert_dir(&args.dir, &options)?;

    if args.list {
        for key in artifacts.keys() {
            println!("{key}");
        }
    }
    println!(
        "converted {} sheets from `{}`",
        artifacts.len(),
        args.dir.display()
    );

    Ok(())
}
