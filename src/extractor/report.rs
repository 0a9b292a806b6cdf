use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Running tally of one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionProgress {
    pub files_found: usize,
    /// Eligible files whose conversion was started, successful or not.
    pub attempted: usize,
    pub converted: usize,
    pub skipped: usize,
    pub lines_written: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub failures: Vec<FileFailure>,
    pub release_errors: Vec<String>,
}

impl ConversionProgress {
    pub fn new(files_found: usize) -> Self {
        Self {
            files_found,
            attempted: 0,
            converted: 0,
            skipped: 0,
            lines_written: 0,
            current_file: None,
            start_time: Instant::now(),
            failures: Vec::new(),
            release_errors: Vec::new(),
        }
    }

    pub fn begin_file(&mut self, filename: String) {
        self.attempted += 1;
        self.current_file = Some(filename);
    }

    pub fn record_success(&mut self, lines: usize) {
        self.converted += 1;
        self.lines_written += lines;
    }

    pub fn record_failure<S: Into<String>>(&mut self, file: S, error: S) {
        self.failures.push(FileFailure {
            file: file.into(),
            error: error.into(),
        });
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Summary of a finished (or cancelled) run, serializable for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub format: String,
    pub engine: String,
    pub files_found: usize,
    pub attempted: usize,
    pub converted: usize,
    pub skipped: usize,
    pub lines_written: usize,
    pub failures: Vec<FileFailure>,
    pub release_errors: Vec<String>,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

impl ConversionReport {
    pub fn new(
        source: PathBuf,
        destination: PathBuf,
        format: String,
        engine: String,
        started_at: DateTime<Utc>,
        progress: &ConversionProgress,
        cancelled: bool,
    ) -> Self {
        Self {
            source,
            destination,
            format,
            engine,
            files_found: progress.files_found,
            attempted: progress.attempted,
            converted: progress.converted,
            skipped: progress.skipped,
            lines_written: progress.lines_written,
            failures: progress.failures.clone(),
            release_errors: progress.release_errors.clone(),
            cancelled,
            started_at,
            duration: progress.elapsed(),
        }
    }

    /// The count shown on the terminal line.
    pub fn count(&self) -> usize {
        self.attempted
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || !self.release_errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failures_do_not_decrement_attempted() {
        let mut progress = ConversionProgress::new(3);

        progress.begin_file("a.docx".to_string());
        progress.record_success(2);
        progress.begin_file("broken.docx".to_string());
        progress.record_failure("broken.docx", "cannot open");
        progress.record_skip();

        assert_eq!(progress.attempted, 2);
        assert_eq!(progress.converted, 1);
        assert_eq!(progress.failed(), 1);
        assert_eq!(progress.skipped, 1);
        assert_eq!(progress.lines_written, 2);
        assert_eq!(progress.current_file.as_deref(), Some("broken.docx"));
    }

    #[test]
    fn test_report_serialization() {
        let mut progress = ConversionProgress::new(1);
        progress.begin_file("a.docx".to_string());
        progress.record_success(2);
        progress.release_errors.push("Release document error. Error: x".to_string());

        let report = ConversionReport::new(
            PathBuf::from("in"),
            PathBuf::from("out"),
            "json".to_string(),
            "ooxml".to_string(),
            Utc::now(),
            &progress,
            false,
        );

        assert_eq!(report.count(), 1);
        assert!(report.has_errors());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["converted"], 1);
        assert_eq!(value["engine"], "ooxml");
        assert_eq!(value["cancelled"], false);
        assert_eq!(value["release_errors"].as_array().unwrap().len(), 1);
    }
}
