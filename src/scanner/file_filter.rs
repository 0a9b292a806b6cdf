use crate::config::InputConfig;
use regex::Regex;
use std::path::Path;

/// Decides which enumerated files are eligible for conversion.
pub struct FileFilter {
    extensions: Vec<String>,
    exclude_patterns: Vec<Regex>,
}

impl FileFilter {
    pub fn new(config: &InputConfig) -> Self {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|pattern| Regex::new(pattern).ok())
            .collect();

        Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
        }
    }

    pub fn is_eligible(&self, path: &Path) -> bool {
        self.has_supported_extension(path) && !self.is_excluded(path)
    }

    pub fn has_supported_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|s| s.to_str())
            .is_some_and(|name| self.matches_any_pattern(name))
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns
            .iter()
            .any(|pattern| pattern.is_match(text))
    }
}

impl Default for FileFilter {
    fn default() -> Self {
        Self::new(&InputConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OWNER_FILE_PATTERN;

    #[test]
    fn test_word_extensions() {
        let filter = FileFilter::default();

        assert!(filter.is_eligible(Path::new("a.docx")));
        assert!(filter.is_eligible(Path::new("c.doc")));
        assert!(filter.is_eligible(Path::new("/some/dir/Report.DOCX")));
        assert!(filter.is_eligible(Path::new("legacy.Doc")));

        assert!(!filter.is_eligible(Path::new("b.txt")));
        assert!(!filter.is_eligible(Path::new("docx")));
        assert!(!filter.is_eligible(Path::new("a.docm")));
        assert!(!filter.is_eligible(Path::new("a.docx.bak")));
    }

    #[test]
    fn test_owner_files_are_excluded_when_configured() {
        assert!(FileFilter::default().is_eligible(Path::new("~$report.docx")));

        let config = InputConfig {
            exclude_patterns: vec![OWNER_FILE_PATTERN.to_string()],
            ..InputConfig::default()
        };
        let filter = FileFilter::new(&config);

        assert!(filter.has_supported_extension(Path::new("~$report.docx")));
        assert!(filter.is_excluded(Path::new("~$report.docx")));
        assert!(!filter.is_eligible(Path::new("/tmp/~$report.docx")));
        assert!(filter.is_eligible(Path::new("report~$.docx")));
    }

    #[test]
    fn test_configured_extensions() {
        let config = InputConfig {
            extensions: vec![".RTF".to_string()],
            exclude_patterns: vec![],
        };
        let filter = FileFilter::new(&config);

        assert!(filter.is_eligible(Path::new("notes.rtf")));
        assert!(!filter.is_eligible(Path::new("notes.docx")));
    }
}
