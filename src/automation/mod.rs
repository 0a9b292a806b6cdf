//! Automation interface of the external document application.
//!
//! Every object handed out by an engine is a separate handle that the caller
//! must release explicitly; nothing is reclaimed implicitly. The
//! [`session`] module wraps the handles in drop guards so that release is
//! unconditional.

pub mod office;
pub mod ooxml;
pub mod session;

#[cfg(test)]
pub(crate) mod mock;

pub use office::OfficeHost;
pub use ooxml::OoxmlHost;
pub use session::{with_session, ApplicationScope, ReleaseReporter, Scoped, Session};

use crate::config::{EngineConfig, EngineKind};
use crate::error::Result;
use std::path::Path;

/// A handle owned by the external application.
pub trait Release {
    /// Short name used in release error messages.
    fn label(&self) -> &'static str;

    fn release(&mut self) -> Result<()>;
}

/// Entry point of an engine: starts one application instance per call.
pub trait AutomationHost {
    fn name(&self) -> &'static str;

    fn start(&self) -> Result<Box<dyn Application>>;
}

pub trait Application: Release {
    fn documents(&mut self) -> Result<Box<dyn Documents>>;

    /// Asks the instance to terminate. Must be called before [`Release::release`].
    fn quit(&mut self) -> Result<()>;
}

pub trait Documents: Release {
    fn open(&mut self, path: &Path) -> Result<Box<dyn Document>>;
}

pub trait Document: Release {
    fn activate(&mut self) -> Result<()>;

    fn content(&mut self) -> Result<Box<dyn ContentRange>>;
}

/// The whole story of a document; paragraphs end with `'\r'`.
pub trait ContentRange: Release {
    fn text(&self) -> Result<String>;
}

pub fn host_for(config: &EngineConfig) -> Box<dyn AutomationHost> {
    match config.kind {
        EngineKind::Ooxml => Box::new(OoxmlHost::new()),
        EngineKind::Office => Box::new(OfficeHost::new(config.office_binary.clone())),
    }
}
