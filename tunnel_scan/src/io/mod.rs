//! File input and output helpers for scan data.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{Result, ScanError};

pub mod csv;
pub mod las;

/// Smallest size of a LAS public header block (LAS 1.0).
pub const MIN_LAS_FILE_SIZE: u64 = 100;

/// Reads a file to string.
pub fn read_to_string(path: &str) -> io::Result<String> {
    let mut buffer = String::new();
    File::open(path)?.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Reads all lines of a text file.
pub fn read_lines(path: &str) -> io::Result<Vec<String>> {
    let file = File::open(path)?;
    BufReader::new(file).lines().collect()
}

/// Writes a string to a file, replacing any existing content.
pub fn write_string(path: &str, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())
}

/// Checks that `path` names an existing, non-trivial file with a `.las` or
/// `.laz` extension.
pub fn validate_scan_file(path: &str) -> Result<()> {
    let p = Path::new(path);
    if path.is_empty() || !p.exists() {
        return Err(ScanError::FileNotFound { path: p.to_path_buf() });
    }
    if !p.is_file() {
        return Err(ScanError::format(p, "path is not a file"));
    }
    let ext = p
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if ext != "las" && ext != "laz" {
        return Err(ScanError::format(
            p,
            format!("invalid file extension '.{ext}', expected .las or .laz"),
        ));
    }
    let size = fs::metadata(p)?.len();
    if size == 0 {
        return Err(ScanError::format(p, "file is empty"));
    }
    if size < MIN_LAS_FILE_SIZE {
        return Err(ScanError::format(p, "file is too small to be a valid LAS file"));
    }
    Ok(())
}

/// Basic information about a file on disk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    /// Size in MiB rounded to two decimals.
    pub size_mb: f64,
}

/// Returns name and size information for `path`.
pub fn file_info(path: &str) -> Result<FileInfo> {
    let p = Path::new(path);
    let meta = fs::metadata(p).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ScanError::FileNotFound { path: p.to_path_buf() },
        _ => ScanError::Io(e),
    })?;
    let size = meta.len();
    Ok(FileInfo {
        path: p.to_path_buf(),
        name: p
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        size,
        size_mb: (size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0,
    })
}

/// Suggests an output path next to `input`: `<dir>/<stem>_<output_name>`.
pub fn suggest_output_path(input: &str, output_name: &str) -> PathBuf {
    let p = Path::new(input);
    let stem = p
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = p.parent().unwrap_or_else(|| Path::new(""));
    dir.join(format!("{stem}_{output_name}"))
}
