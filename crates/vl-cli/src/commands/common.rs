//! Shared utilities for CLI commands

use anyhow::{bail, Context, Result};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Path argument meaning standard input
pub(crate) const STDIN_PATH: &str = "-";

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; main prints nothing for it
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// One DDL text to analyze
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DdlInput {
    /// Name reported when the analysis carries no object name (file stem or `stdin`)
    pub name: String,
    pub sql: String,
}

/// Expand path arguments into DDL inputs, in argument order
///
/// Directories contribute their files with a matching extension, sorted by
/// name and not recursing. `-` reads standard input once.
pub(crate) fn collect_inputs(paths: &[String], extensions: &[String]) -> Result<Vec<DdlInput>> {
    let mut inputs = Vec::new();
    let mut stdin_read = false;

    for arg in paths {
        if arg == STDIN_PATH {
            if stdin_read {
                bail!("standard input can only be given once");
            }
            stdin_read = true;
            inputs.push(read_stdin()?);
            continue;
        }

        let path = Path::new(arg);
        if path.is_dir() {
            let files = discover_files(path, extensions)?;
            if files.is_empty() {
                log::warn!("No DDL files found in {}", path.display());
            }
            for file in files {
                inputs.push(read_file(&file)?);
            }
        } else {
            inputs.push(read_file(path)?);
        }
    }

    Ok(inputs)
}

/// Files directly inside `dir` whose extension is in `extensions`, sorted
pub(crate) fn discover_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("*");
    let pattern = pattern.to_string_lossy();
    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .with_context(|| format!("Invalid directory path: {}", dir.display()))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|path| path.is_file() && has_extension(path, extensions))
        .collect();
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Read a single DDL file
pub(crate) fn read_file(path: &Path) -> Result<DdlInput> {
    let sql = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(DdlInput { name, sql })
}

fn read_stdin() -> Result<DdlInput> {
    let mut sql = String::new();
    std::io::stdin()
        .read_to_string(&mut sql)
        .context("Failed to read standard input")?;
    Ok(DdlInput {
        name: "stdin".to_string(),
        sql,
    })
}

/// Read the DDL named by a single path argument (file or `-`)
pub(crate) fn read_single(arg: &str) -> Result<DdlInput> {
    if arg == STDIN_PATH {
        read_stdin()
    } else {
        read_file(Path::new(arg))
    }
}

/// Calculate column widths for a table given headers and row data.
///
/// For each column, returns the maximum width across the header and all
/// row values so that data aligns when printed with left-padding.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }
    widths
}

/// Render an aligned table: header, dashed separator, then rows.
///
/// Columns are separated by two spaces and trailing padding is trimmed.
pub(crate) fn format_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths = calculate_column_widths(headers, rows);
    let render = |cells: Vec<String>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &w)| format!("{:<width$}", cell, width = w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(render(headers.iter().map(|h| h.to_string()).collect()));
    lines.push(render(widths.iter().map(|&w| "-".repeat(w)).collect()));
    for row in rows {
        lines.push(render(row.clone()));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
