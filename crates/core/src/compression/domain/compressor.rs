use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("no compressor available for format '{0}'")]
    UnsupportedFormat(String),
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {}: {stderr}", exit_code_label(*.code))]
    Failed {
        program: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("failed to read compressed file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_code_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// Raster formats the compression pass knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompressionFormat {
    Png,
    Jpeg,
}

impl CompressionFormat {
    /// Detects the format from the path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, CompressError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(CompressionFormat::Png),
            "jpg" | "jpeg" => Ok(CompressionFormat::Jpeg),
            _ => Err(CompressError::UnsupportedFormat(ext)),
        }
    }
}

impl std::fmt::Display for CompressionFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompressionFormat::Png => write!(f, "png"),
            CompressionFormat::Jpeg => write!(f, "jpeg"),
        }
    }
}

/// Losslessly re-optimizes an image file in place.
pub trait Compressor: Send + Sync {
    /// Returns the file size in bytes after compression. Formats the
    /// implementation cannot handle yield `UnsupportedFormat` and leave the
    /// file untouched.
    fn compress(&self, path: &Path, format: CompressionFormat) -> Result<u64, CompressError>;
}
