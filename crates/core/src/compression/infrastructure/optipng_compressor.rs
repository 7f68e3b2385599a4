use std::path::{Path, PathBuf};
use std::process::Command;

use crate::compression::domain::compressor::{CompressError, CompressionFormat, Compressor};
use crate::shared::constants::OPTIPNG_ARGS;

/// Lossless PNG re-optimization through the external `optipng` tool.
///
/// The file is rewritten in place. JPEG is reported as unsupported rather
/// than silently skipped.
pub struct OptipngCompressor {
    program: PathBuf,
    args: Vec<String>,
}

impl OptipngCompressor {
    pub fn new() -> Self {
        Self::with_program("optipng")
    }

    /// Runs `program` with the default optipng arguments. Mostly useful for
    /// pointing at a non-PATH install.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: OPTIPNG_ARGS.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for OptipngCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for OptipngCompressor {
    fn compress(&self, path: &Path, format: CompressionFormat) -> Result<u64, CompressError> {
        if format != CompressionFormat::Png {
            return Err(CompressError::UnsupportedFormat(format.to_string()));
        }

        log::debug!("Running {} on {}", self.program.display(), path.display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|source| CompressError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CompressError::Failed {
                program: self.program.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        std::fs::metadata(path)
            .map(|m| m.len())
            .map_err(|source| CompressError::Io {
                path: path.to_path_buf(),
                source,
            })
    }
}
