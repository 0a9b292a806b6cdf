use crate::automation::{Document, ReleaseReporter, Scoped};
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Paragraph mark of the document model.
pub const PARAGRAPH_MARK: char = '\r';

/// Ordered non-empty lines read from one open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDocument {
    pub source: PathBuf,
    pub lines: Vec<String>,
}

pub struct TextExtractor;

impl TextExtractor {
    /// Reads the whole story of `document`. The content range is released
    /// whether or not reading succeeds.
    pub fn extract(
        document: &mut dyn Document,
        source: &Path,
        reporter: ReleaseReporter<'_>,
    ) -> Result<ExtractedDocument> {
        let range = Scoped::new(document.content()?, reporter);
        let text = range.text()?;

        Ok(ExtractedDocument {
            source: source.to_path_buf(),
            lines: split_paragraphs(&text),
        })
    }
}

/// Splits story text on paragraph marks, dropping segments that are empty
/// or whitespace only. Kept segments are returned untouched.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.split(PARAGRAPH_MARK)
        .filter(|segment| !segment.trim().is_empty())
        .map(str::to_string)
        .collect()
}
