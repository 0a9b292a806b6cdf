use crate::error::{ConvertError, Result};
use serde::Serialize;
use serde_json::ser::Formatter;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredFormat {
    Json,
}

impl StructuredFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            StructuredFormat::Json => "json",
        }
    }
}

impl FromStr for StructuredFormat {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(StructuredFormat::Json),
            _ => Err(ConvertError::InvalidFormat {
                format: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StructuredFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Streams extracted lines into an output document.
#[derive(Debug, Clone, Copy)]
pub struct StructuredWriter {
    format: StructuredFormat,
}

impl StructuredWriter {
    /// Fails with `InvalidFormat` for anything but a supported format.
    pub fn for_format(name: &str) -> Result<Self> {
        Ok(Self {
            format: name.parse()?,
        })
    }

    /// Replaces `dest` with the serialized lines and returns how many items
    /// were written.
    pub fn write(&self, dest: &Path, lines: &[String]) -> Result<usize> {
        if dest.exists() {
            fs::remove_file(dest)?;
        }

        let mut writer = BufWriter::new(File::create(dest)?);
        match self.format {
            StructuredFormat::Json => write_json_items(&mut writer, lines)?,
        }
        writer.flush()?;

        Ok(lines.len())
    }
}

/// Writes `{"items":[...]}`, one write call per token.
pub fn write_json_items<W: Write>(writer: &mut W, lines: &[String]) -> io::Result<()> {
    writer.write_all(b"{")?;
    writer.write_all(b"\"items\":[")?;

    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            writer.write_all(b",")?;
        }
        let mut serializer = serde_json::Serializer::with_formatter(&mut *writer, JsStringFormatter);
        line.as_str().serialize(&mut serializer)?;
    }

    writer.write_all(b"]")?;
    writer.write_all(b"}")?;
    Ok(())
}

fn needs_js_escape(ch: char) -> bool {
    matches!(
        ch,
        '<' | '>' | '&' | '\'' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// JSON formatter that also hex-escapes characters unsafe inside HTML or
/// JavaScript source. Quotes, backslashes and control characters are
/// already escaped by serde_json.
#[derive(Debug, Default, Clone, Copy)]
struct JsStringFormatter;

impl Formatter for JsStringFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;

        for (index, ch) in fragment.char_indices() {
            if needs_js_escape(ch) {
                if start < index {
                    writer.write_all(fragment[start..index].as_bytes())?;
                }
                write!(writer, "\\u{:04x}", ch as u32)?;
                start = index + ch.len_utf8();
            }
        }

        if start < fragment.len() {
            writer.write_all(fragment[start..].as_bytes())?;
        }
        Ok(())
    }
}
