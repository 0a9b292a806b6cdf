use crate::error::{ConvertError, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Lists the candidate files of a source path.
///
/// A file source yields itself; a directory yields its direct children that
/// are regular files, sorted by file name. Eligibility is left to
/// [`FileFilter`](crate::scanner::FileFilter).
pub struct DocumentScanner {
    scan_errors: Vec<String>,
}

impl DocumentScanner {
    pub fn new() -> Self {
        Self {
            scan_errors: Vec::new(),
        }
    }

    pub fn scan<P: AsRef<Path>>(&mut self, source: P) -> Result<Vec<PathBuf>> {
        let source = source.as_ref();

        if source.is_file() {
            return Ok(vec![source.to_path_buf()]);
        }

        if !source.is_dir() {
            return Err(ConvertError::InvalidSource {
                path: source.display().to_string(),
            });
        }

        let mut files = Vec::new();

        let walker = WalkDir::new(source)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.scan_errors.push(format!("Scan error: {}", err));
                    continue;
                }
            };

            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Entries that could not be read during the last scans.
    pub fn scan_errors(&self) -> &[String] {
        &self.scan_errors
    }
}

impl Default for DocumentScanner {
    fn default() -> Self {
        Self::new()
    }
}
