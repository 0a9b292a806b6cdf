pub mod report;
pub mod structured_writer;
pub mod text_extractor;

pub use report::{ConversionProgress, ConversionReport, FileFailure};
pub use structured_writer::{StructuredFormat, StructuredWriter};
pub use text_extractor::{split_paragraphs, ExtractedDocument, TextExtractor};
