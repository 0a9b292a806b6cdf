//! Engine backed by a headless LibreOffice process.
//!
//! Each application instance gets a private user profile so that concurrent
//! or crashed instances never share state. Opening a document converts it to
//! UTF-8 text inside the profile; the text file lives until the document
//! handle is released.

use crate::automation::{Application, AutomationHost, ContentRange, Document, Documents, Release};
use crate::error::{ConvertError, Result};
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;
use tempfile::TempDir;

const TEXT_FILTER: &str = "txt:Text (encoded):UTF8";

#[derive(Debug, Clone)]
pub struct OfficeHost {
    binary: String,
}

impl OfficeHost {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl AutomationHost for OfficeHost {
    fn name(&self) -> &'static str {
        "office"
    }

    fn start(&self) -> Result<Box<dyn Application>> {
        let start_error = |message: String| ConvertError::ApplicationStart { message };

        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| start_error(format!("cannot run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            return Err(start_error(format!(
                "{} --version exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let profile = tempfile::Builder::new()
            .prefix("word2json-profile-")
            .tempdir()
            .map_err(|e| start_error(format!("cannot create instance profile: {}", e)))?;

        Ok(Box::new(OfficeApplication {
            instance: Rc::new(RefCell::new(Instance {
                binary: self.binary.clone(),
                profile: Some(profile),
                running: true,
            })),
            released: false,
        }))
    }
}

struct Instance {
    binary: String,
    profile: Option<TempDir>,
    running: bool,
}

impl Instance {
    fn profile_dir(&self) -> Result<&Path> {
        match &self.profile {
            Some(profile) if self.running => Ok(profile.path()),
            _ => Err(ConvertError::Io(io::Error::other(
                "the office instance is no longer running",
            ))),
        }
    }
}

type SharedInstance = Rc<RefCell<Instance>>;

fn already_released(label: &str) -> ConvertError {
    ConvertError::ResourceRelease {
        handle: label.to_string(),
        message: "handle was already released".to_string(),
    }
}

struct OfficeApplication {
    instance: SharedInstance,
    released: bool,
}

impl Release for OfficeApplication {
    fn label(&self) -> &'static str {
        "application"
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(already_released(self.label()));
        }
        self.released = true;

        let profile = self.instance.borrow_mut().profile.take();
        if let Some(profile) = profile {
            profile.close()?;
        }
        Ok(())
    }
}

impl Application for OfficeApplication {
    fn documents(&mut self) -> Result<Box<dyn Documents>> {
        self.instance.borrow().profile_dir()?;
        Ok(Box::new(OfficeDocuments {
            instance: Rc::clone(&self.instance),
            released: false,
        }))
    }

    fn quit(&mut self) -> Result<()> {
        let mut instance = self.instance.borrow_mut();
        if !instance.running {
            return Err(ConvertError::Io(io::Error::other(
                "the office instance has already quit",
            )));
        }
        instance.running = false;
        Ok(())
    }
}

struct OfficeDocuments {
    instance: SharedInstance,
    released: bool,
}

impl Release for OfficeDocuments {
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

impl Documents for OfficeDocuments {
    fn open(&mut self, path: &Path) -> Result<Box<dyn Document>> {
        let open_error = |message: String| ConvertError::DocumentOpen {
            path: path.display().to_string(),
            message,
        };

        let instance = self.instance.borrow();
        let profile = instance.profile_dir()?;
        let outdir = profile.join("out");

        let output = Command::new(&instance.binary)
            .arg(format!("-env:UserInstallation={}", to_file_url(profile)))
            .args(["--headless", "--norestore", "--convert-to", TEXT_FILTER, "--outdir"])
            .arg(&outdir)
            .arg(path)
            .output()
            .map_err(|e| open_error(format!("cannot run {}: {}", instance.binary, e)))?;

        if !output.status.success() {
            return Err(open_error(format!(
                "conversion exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stem = path
            .file_stem()
            .ok_or_else(|| open_error("path has no file name".to_string()))?;
        let converted = outdir.join(format!("{}.txt", stem.to_string_lossy()));

        // soffice exits successfully even when it cannot load the input
        if !converted.is_file() {
            return Err(open_error(format!(
                "the document could not be loaded: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(Box::new(OfficeDocument {
            instance: Rc::clone(&self.instance),
            converted,
            released: false,
        }))
    }
}

struct OfficeDocument {
    instance: SharedInstance,
    converted: PathBuf,
    released: bool,
}

impl Release for OfficeDocument {
    fn label(&self) -> &'static str {
        "document"
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Err(already_released(self.label()));
        }
        self.released = true;

        match fs::remove_file(&self.converted) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Document for OfficeDocument {
    fn activate(&mut self) -> Result<()> {
        self.instance.borrow().profile_dir().map(|_| ())
    }

    fn content(&mut self) -> Result<Box<dyn ContentRange>> {
        self.instance.borrow().profile_dir()?;

        let raw = fs::read_to_string(&self.converted).map_err(|e| ConvertError::ContentRead {
            message: format!("{}: {}", self.converted.display(), e),
        })?;

        Ok(Box::new(OfficeRange {
            text: story_from_lines(&raw),
            released: false,
        }))
    }
}

struct OfficeRange {
    text: String,
    released: bool,
}

impl Release for OfficeRange {
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

impl ContentRange for OfficeRange {
    fn text(&self) -> Result<String> {
        if self.released {
            return Err(ConvertError::ContentRead {
                message: "content range was already released".to_string(),
            });
        }
        Ok(self.text.clone())
    }
}

/// Text export uses one line per paragraph; the story uses `'\r'`.
fn story_from_lines(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .replace("\r\n", "\r")
        .replace('\n', "\r")
}

/// `file://` URL of an absolute path, as expected by `-env:UserInstallation`.
pub fn to_file_url(path: &Path) -> String {
    let path = path.to_string_lossy().replace('\\', "/").replace(' ', "%20");
    if path.starts_with('/') {
        format!("file://{}", path)
    } else {
        format!("file:///{}", path)
    }
}
