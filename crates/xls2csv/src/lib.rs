//! Convert a directory of legacy Excel 97-2003 `.xls` workbooks into
//! schema-typed CSV text.
//!
//! The first row of every sheet declares the output schema through
//! column-name prefixes (`int_`, `float_`, `str_`, `table_`); columns with
//! no recognized prefix are comments and are dropped. Data rows are
//! converted until the first fully blank row. Each converted sheet becomes
//! one CSV blob keyed by `<file stem>_<sheet name>.csv`, and the whole batch
//! is returned as a single map.
//!
//! Decoding the BIFF container is delegated to [`calamine`]; this crate owns
//! header inference, cell formatting, and the batch fan-out. Conversion is
//! best-effort throughout: unreadable files and broken sheets are logged and
//! skipped, and the caller always receives whatever subset converted
//! cleanly.

mod cell;
mod header;
mod sheet;

pub mod cli;

pub use cell::{format_field, try_normalize_numeric_string};
pub use header::{parse_header, ColumnDescriptor, ColumnType, Header};
pub use sheet::{artifact_key, convert_sheet};

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Instant;

use calamine::{open_workbook, Reader, Xls};
use rayon::prelude::*;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to list input directory `{path}`: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to create output directory `{path}`: {source}")]
    CreateOutDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to open workbook `{path}`: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::XlsError,
    },
    #[error("failed to decode sheet `{sheet}` in `{path}`: {source}")]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::XlsError,
    },
    #[error("invalid header in sheet `{sheet}`: numeric cell at column {col}")]
    InvalidHeader { sheet: String, col: usize },
}

/// Batch conversion options.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Persist each artifact into this directory as a best-effort side
    /// effect. Created if missing; individual write failures are ignored.
    pub out_dir: Option<PathBuf>,
    /// Input file paths to skip entirely. Exact string match against the
    /// enumerated path, case-sensitive.
    pub ignore_files: BTreeSet<String>,
    /// Output artifact keys (including the `.csv` suffix) to skip, e.g.
    /// `season_data.csv`. Exact match, case-sensitive.
    pub ignore_sheets: BTreeSet<String>,
    /// Worker threads for the per-file fan-out. `1` forces sequential
    /// processing in directory order (deterministic); `0` uses all available
    /// cores.
    pub workers: usize,
}

/// Convert every eligible `.xls` file in `dir` (non-recursive).
///
/// Returns the merged map of artifact key to CSV text covering every
/// successfully converted sheet. Per-file and per-sheet failures are logged
/// and skipped; only a failure to list the directory or to create the
/// output directory is an error.
pub fn convert_dir(
    dir: impl AsRef<Path>,
    options: &ConvertOptions,
) -> Result<BTreeMap<String, String>, Error> {
    let dir = dir.as_ref();
    let started = Instant::now();

    let entries = std::fs::read_dir(dir).map_err(|source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::ReadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if !is_legacy_xls(&path) {
            continue;
        }
        if options.ignore_files.contains(path.to_string_lossy().as_ref()) {
            continue;
        }
        files.push(path);
    }
    // Directory order is platform-dependent; fix it so sequential runs are
    // deterministic.
    files.sort();

    if let Some(out_dir) = &options.out_dir {
        if !out_dir.is_dir() {
            std::fs::create_dir_all(out_dir).map_err(|source| Error::CreateOutDir {
                path: out_dir.clone(),
                source,
            })?;
        }
    }

    let per_file: Vec<Vec<(String, String)>> = if options.workers == 1 {
        files
            .iter()
            .map(|path| convert_xls_path(path, options))
            .collect()
    } else {
        run_parallel(&files, options)
    };

    // Tasks return owned results; merging after the join keeps the cache
    // free of shared mutable state. Key collisions (file stems that agree
    // after lowercasing) resolve to the task merged last.
    let mut cache = BTreeMap::new();
    for artifacts in per_file {
        for (key, csv) in artifacts {
            cache.insert(key, csv);
        }
    }

    log::info!(
        "converted {} sheets from {} files in {:.2}s",
        cache.len(),
        files.len(),
        started.elapsed().as_secs_f64()
    );

    Ok(cache)
}

/// Convert every sheet of one workbook, returning `(artifact key, CSV)`
/// pairs.
///
/// All failures are file- or sheet-scoped: they are logged and shrink the
/// result, never surfacing as an error. An unreadable workbook yields no
/// artifacts; a sheet whose extent fails to decode ends processing of this
/// file (sheets already converted are kept); a sheet with an invalid header
/// is skipped while the file's remaining sheets still convert.
pub fn convert_xls_path(path: &Path, options: &ConvertOptions) -> Vec<(String, String)> {
    let mut workbook: Xls<_> = match open_workbook(path) {
        Ok(workbook) => workbook,
        Err(source) => {
            log::warn!(
                "{}",
                Error::Open {
                    path: path.to_path_buf(),
                    source,
                }
            );
            return Vec::new();
        }
    };

    let sheet_names = workbook.sheet_names().to_owned();
    let mut artifacts = Vec::new();

    for sheet_name in sheet_names {
        let key = sheet::artifact_key(path, &sheet_name);
        if options.ignore_sheets.contains(&key) {
            continue;
        }

        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => range,
            Err(source) => {
                // A sheet whose extent fails to decode usually means a
                // broken file; skip the rest of it.
                log::warn!(
                    "{}",
                    Error::Sheet {
                        path: path.to_path_buf(),
                        sheet: sheet_name,
                        source,
                    }
                );
                break;
            }
        };

        let csv = match sheet::convert_sheet(&sheet_name, &range) {
            Ok(csv) => csv,
            Err(err) => {
                log::warn!("skipping sheet in `{}`: {err}", path.display());
                continue;
            }
        };

        if let Some(out_dir) = &options.out_dir {
            // Best-effort persistence; the in-memory result is authoritative.
            let _ = std::fs::write(out_dir.join(&key), &csv);
        }

        artifacts.push((key, csv));
    }

    artifacts
}

/// Only legacy single-file `.xls` workbooks are eligible; `.xlsx`/`.xlsm`/
/// `.xlsb` containers and unrelated files are skipped.
fn is_legacy_xls(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xls"))
}

fn run_parallel(files: &[PathBuf], options: &ConvertOptions) -> Vec<Vec<(String, String)>> {
    match build_pool(options.workers) {
        Some(pool) => pool.install(|| {
            files
                .par_iter()
                .map(|path| convert_xls_path(path, options))
                .collect()
        }),
        // Pool construction can fail under tight resource limits; fall back
        // to sequential execution rather than aborting the batch.
        None => files
            .iter()
            .map(|path| convert_xls_path(path, options))
            .collect(),
    }
}

fn build_pool(workers: usize) -> Option<rayon::ThreadPool> {
    let threads = if workers == 0 {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    } else {
        workers
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .ok()
}
