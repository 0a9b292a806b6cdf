use crate::error::{ConvertError, Result};
use std::path::{Path, PathBuf};

/// Effective parameters of one run, resolved once from the CLI and configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
    pub output_format: String,
    pub verbose: bool,
}

impl ConversionRequest {
    /// Fills in defaults: the current directory for the source, and the
    /// source's folder (or the source directory itself) for the destination.
    ///
    /// Fails with `InvalidSource` when the source is neither a file nor a
    /// directory.
    pub fn resolve(
        source: Option<&Path>,
        destination: Option<&Path>,
        output_format: &str,
        verbose: bool,
    ) -> Result<Self> {
        let source_path = match source {
            Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
            _ => std::env::current_dir()?,
        };

        if !source_path.is_file() && !source_path.is_dir() {
            return Err(ConvertError::InvalidSource {
                path: source_path.display().to_string(),
            });
        }

        let destination_path = match destination {
            Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
            _ => default_destination(&source_path),
        };

        Ok(Self {
            source_path,
            destination_path,
            output_format: output_format.trim().to_string(),
            verbose,
        })
    }

    pub fn task_for(&self, source_file: &Path) -> FileTask {
        FileTask::new(source_file, &self.destination_path, &self.output_format)
    }
}

fn default_destination(source: &Path) -> PathBuf {
    if source.is_file() {
        match source.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    } else {
        source.to_path_buf()
    }
}

/// One eligible input file and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    pub source_file: PathBuf,
    pub dest_file: PathBuf,
}

impl FileTask {
    pub fn new(source_file: &Path, destination_dir: &Path, format: &str) -> Self {
        let stem = source_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            source_file: source_file.to_path_buf(),
            dest_file: destination_dir.join(format!("{}.{}", stem, format)),
        }
    }

    pub fn display_source(&self) -> String {
        self.source_file.display().to_string()
    }
}
