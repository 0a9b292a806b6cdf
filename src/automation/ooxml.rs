//! In-process engine that reads the main story of Office Open XML packages.

use crate::automation::{Application, AutomationHost, ContentRange, Document, Documents, Release};
use crate::error::{ConvertError, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::cell::RefCell;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::rc::Rc;
use zip::ZipArchive;

/// Compound File Binary signature used by legacy `.doc` files.
const CFB_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

#[derive(Debug, Default, Clone, Copy)]
pub struct OoxmlHost;

impl OoxmlHost {
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug)]
struct InstanceState {
    running: bool,
    open_documents: usize,
}

type SharedState = Rc<RefCell<InstanceState>>;

fn ensure_running(state: &SharedState) -> Result<()> {
    if state.borrow().running {
        Ok(())
    } else {
        Err(ConvertError::Io(std::io::Error::other(
            "the application instance has already quit",
        )))
    }
}

fn already_released(label: &str) -> ConvertError {
    ConvertError::ResourceRelease {
        handle: label.to_string(),
        message: "handle was already released".to_string(),
    }
}

impl AutomationHost for OoxmlHost {
    fn name(&self) -> &'static str {
        "ooxml"
    }

    fn start(&self) -> Result<Box<dyn Application>> {
        Ok(Box::new(OoxmlApplication {
            state: Rc::new(RefCell::new(InstanceState {
                running: true,
                open_documents: 0,
            })),
            released: false,
        }))
    }
}

struct OoxmlApplication {
    state: SharedState,
    released: bool,
}

impl Release for OoxmlApplication {
    fn label(&self) -> &'static str {
        "application"
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(already_released(self.label()));
        }
        self.released = true;

        let state = self.state.borrow();
        if state.open_documents > 0 {
            return Err(ConvertError::ResourceRelease {
                handle: self.label().to_string(),
                message: format!("{} document(s) still open", state.open_documents),
            });
        }
        Ok(())
    }
}

impl Application for OoxmlApplication {
    fn documents(&mut self) -> Result<Box<dyn Documents>> {
        ensure_running(&self.state)?;
        Ok(Box::new(OoxmlDocuments {
            state: Rc::clone(&self.state),
            released: false,
        }))
    }

    fn quit(&mut self) -> Result<()> {
        ensure_running(&self.state)?;
        self.state.borrow_mut().running = false;
        Ok(())
    }
}

struct OoxmlDocuments {
    state: SharedState,
    released: bool,
}

impl Release for OoxmlDocuments {
    fn label(&self) -> &'static str {
        "documents"
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(already_released(self.label()));
        }
        self.released = true;
        Ok(())
    }
}

impl Documents for OoxmlDocuments {
    fn open(&mut self, path: &Path) -> Result<Box<dyn Document>> {
        ensure_running(&self.state)?;
        let text = read_story(path)?;
        self.state.borrow_mut().open_documents += 1;

        Ok(Box::new(OoxmlDocument {
            state: Rc::clone(&self.state),
            text,
            released: false,
        }))
    }
}

struct OoxmlDocument {
    state: SharedState,
    text: String,
    released: bool,
}

impl Release for OoxmlDocument {
    fn label(&self) -> &'static str {
        "document"
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(already_released(self.label()));
        }
        self.released = true;

        let mut state = self.state.borrow_mut();
        state.open_documents = state.open_documents.saturating_sub(1);
        Ok(())
    }
}

impl Document for OoxmlDocument {
    fn activate(&mut self) -> Result<()> {
        ensure_running(&self.state)
    }

    fn content(&mut self) -> Result<Box<dyn ContentRange>> {
        ensure_running(&self.state)?;
        Ok(Box::new(OoxmlRange {
            text: self.text.clone(),
            released: false,
        }))
    }
}

struct OoxmlRange {
    text: String,
    released: bool,
}

impl Release for OoxmlRange {
    fn label(&self) -> &'static str {
        "content range"
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(already_released(self.label()));
        }
        self.released = true;
        Ok(())
    }
}

impl ContentRange for OoxmlRange {
    fn text(&self) -> Result<String> {
        if self.released {
            return Err(ConvertError::ContentRead {
                message: "content range was already released".to_string(),
            });
        }
        Ok(self.text.clone())
    }
}

fn open_error(path: &Path, message: impl ToString) -> ConvertError {
    ConvertError::DocumentOpen {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

/// Reads the main document story of the package at `path`.
fn read_story(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| open_error(path, e))?;

    if bytes.starts_with(&CFB_SIGNATURE) {
        return Err(open_error(
            path,
            "legacy binary Word document, use the office engine",
        ));
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| open_error(path, format!("not an Office Open XML package: {}", e)))?;

    let part = main_part_name(&mut archive).unwrap_or_else(|| DEFAULT_MAIN_PART.to_string());
    let xml = read_part(&mut archive, &part)
        .map_err(|e| open_error(path, format!("cannot read {}: {}", part, e)))?;

    story_text(&xml).map_err(|e| open_error(path, format!("malformed {}: {}", part, e)))
}

fn read_part(archive: &mut ZipArchive<Cursor<Vec<u8>>>, name: &str) -> std::io::Result<String> {
    let mut file = archive.by_name(name)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    Ok(content)
}

fn get_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .find(|a| a.as_ref().ok().map(|x| x.key.as_ref()) == Some(key))
        .and_then(|a| a.ok())
        .map(|attr| String::from_utf8_lossy(&attr.value).into_owned())
}

/// Target of the package-level `officeDocument` relationship.
fn main_part_name(archive: &mut ZipArchive<Cursor<Vec<u8>>>) -> Option<String> {
    let rels = read_part(archive, "_rels/.rels").ok()?;
    let mut reader = Reader::from_str(&rels);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.local_name().as_ref() == b"Relationship" => {
                if get_attr(&e, b"Type").as_deref() == Some(OFFICE_DOCUMENT_REL) {
                    return get_attr(&e, b"Target")
                        .map(|target| target.trim_start_matches('/').to_string());
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
        buf.clear();
    }
}

/// Flattens the main story of WordprocessingML into text: every paragraph
/// ends with `'\r'`, tabs become `'\t'`, line breaks `'\u{b}'` and page
/// breaks `'\u{c}'`.
///
/// Text boxes live in their own stories and are left out, as is the
/// `mc:Fallback` copy of any alternate content.
fn story_text(xml: &str) -> quick_xml::Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut text = String::new();
    let mut in_text = false;
    let mut paragraph_props_depth = 0usize;
    let mut textbox_depth = 0usize;
    let mut fallback_depth = 0usize;

    loop {
        let outside_story = textbox_depth > 0 || fallback_depth > 0;
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:txbxContent" => textbox_depth += 1,
                b"mc:Fallback" => fallback_depth += 1,
                b"w:t" if !outside_story => in_text = true,
                b"w:pPr" => paragraph_props_depth += 1,
                _ => {}
            },
            Event::Empty(_) if outside_story => {}
            Event::Empty(e) => match e.name().as_ref() {
                // tab stops inside w:pPr are layout, not content
                b"w:tab" if paragraph_props_depth == 0 => text.push('\t'),
                b"w:br" => {
                    if get_attr(&e, b"w:type").as_deref() == Some("page") {
                        text.push('\u{c}');
                    } else {
                        text.push('\u{b}');
                    }
                }
                b"w:cr" => text.push('\u{b}'),
                b"w:p" => text.push('\r'),
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:txbxContent" => textbox_depth = textbox_depth.saturating_sub(1),
                b"mc:Fallback" => fallback_depth = fallback_depth.saturating_sub(1),
                b"w:t" => in_text = false,
                b"w:pPr" => paragraph_props_depth = paragraph_props_depth.saturating_sub(1),
                b"w:p" if !outside_story => text.push('\r'),
                _ => {}
            },
            Event::Text(e) if in_text => text.push_str(&e.unescape()?),
            Event::CData(e) if in_text => text.push_str(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}
