use crate::automation::{Application, AutomationHost, Document, Documents, Release};
use crate::error::{ConvertError, Result};
use std::ops::{Deref, DerefMut};
use std::path::Path;

/// Receives release failures. Releases never propagate errors.
pub type ReleaseReporter<'r> = &'r dyn Fn(ConvertError);

fn release_error(label: &str, error: ConvertError) -> ConvertError {
    match error {
        ConvertError::ResourceRelease { .. } => error,
        other => ConvertError::ResourceRelease {
            handle: label.to_string(),
            message: other.to_string(),
        },
    }
}

/// Owns one handle and releases it when dropped.
pub struct Scoped<'r, T: ?Sized + Release> {
    handle: Box<T>,
    reporter: ReleaseReporter<'r>,
}

impl<'r, T: ?Sized + Release> Scoped<'r, T> {
    pub fn new(handle: Box<T>, reporter: ReleaseReporter<'r>) -> Self {
        Self { handle, reporter }
    }
}

impl<T: ?Sized + Release> Deref for Scoped<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.handle
    }
}

impl<T: ?Sized + Release> DerefMut for Scoped<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.handle
    }
}

impl<T: ?Sized + Release> Drop for Scoped<'_, T> {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release() {
            (self.reporter)(release_error(self.handle.label(), e));
        }
    }
}

/// Owns the application handle: on drop the instance is told to quit, then
/// the handle is released, each step independently.
pub struct ApplicationScope<'r> {
    application: Box<dyn Application>,
    reporter: ReleaseReporter<'r>,
}

impl<'r> ApplicationScope<'r> {
    pub fn start(host: &dyn AutomationHost, reporter: ReleaseReporter<'r>) -> Result<Self> {
        let application = host.start()?;
        Ok(Self {
            application,
            reporter,
        })
    }
}

impl Deref for ApplicationScope<'_> {
    type Target = dyn Application;

    fn deref(&self) -> &Self::Target {
        &*self.application
    }
}

impl DerefMut for ApplicationScope<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.application
    }
}

impl Drop for ApplicationScope<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.application.quit() {
            (self.reporter)(release_error("application (quit)", e));
        }

        if let Err(e) = self.application.release() {
            (self.reporter)(release_error(self.application.label(), e));
        }
    }
}

/// One application instance with one open document.
///
/// Fields drop in declaration order, which is the release order: document,
/// documents collection, then the application.
pub struct Session<'r> {
    document: Scoped<'r, dyn Document>,
    #[allow(dead_code)]
    documents: Scoped<'r, dyn Documents>,
    #[allow(dead_code)]
    application: ApplicationScope<'r>,
}

impl<'r> Session<'r> {
    /// Starts the application and opens `path`. Whatever was acquired before
    /// a failure is released before the error is returned.
    pub fn open(
        host: &dyn AutomationHost,
        path: &Path,
        reporter: ReleaseReporter<'r>,
    ) -> Result<Self> {
        let mut application = ApplicationScope::start(host, reporter)?;
        let mut documents = Scoped::new(application.documents()?, reporter);
        let mut document = Scoped::new(documents.open(path)?, reporter);
        document.activate()?;

        Ok(Self {
            document,
            documents,
            application,
        })
    }

    pub fn document(&mut self) -> &mut dyn Document {
        &mut *self.document
    }
}

/// Runs `f` against the document at `path` inside a fresh session.
pub fn with_session<R, F>(
    host: &dyn AutomationHost,
    path: &Path,
    reporter: ReleaseReporter<'_>,
    f: F,
) -> Result<R>
where
    F: FnOnce(&mut dyn Document) -> Result<R>,
{
    let mut session = Session::open(host, path, reporter)?;
    f(session.document())
}
