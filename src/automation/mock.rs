use crate::automation::{Application, AutomationHost, ContentRange, Document, Documents, Release};
use crate::error::{ConvertError, Result};
use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::rc::Rc;

pub const DEFAULT_TEXT: &str = "Hello\r\rWorld\r";

#[derive(Debug, Default, Clone)]
pub struct MockPlan {
    pub fail_start: bool,
    pub fail_open: bool,
    pub fail_text: bool,
    pub fail_quit: bool,
    /// Labels whose release fails.
    pub fail_release: Vec<&'static str>,
    /// File names that cannot be opened.
    pub broken: Vec<&'static str>,
    /// Story text per file name; anything else reads [`DEFAULT_TEXT`].
    pub texts: Vec<(&'static str, &'static str)>,
}

#[derive(Default)]
struct MockState {
    events: Vec<String>,
    acquired: usize,
    released: usize,
    starts: usize,
}

/// Records every call made through the automation interface.
pub struct MockHost {
    plan: MockPlan,
    state: Rc<RefCell<MockState>>,
}

impl MockHost {
    pub fn new(plan: MockPlan) -> Self {
        Self {
            plan,
            state: Rc::new(RefCell::new(MockState::default())),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.state.borrow().events.clone()
    }

    pub fn starts(&self) -> usize {
        self.state.borrow().starts
    }

    /// Every acquired handle had its release attempted exactly once.
    pub fn assert_balanced(&self) {
        let state = self.state.borrow();
        assert_eq!(
            state.acquired, state.released,
            "unbalanced handles: {:?}",
            state.events
        );
    }
}

struct Handle {
    label: &'static str,
    plan: MockPlan,
    state: Rc<RefCell<MockState>>,
    released: bool,
}

impl Handle {
    fn acquire(label: &'static str, plan: &MockPlan, state: &Rc<RefCell<MockState>>) -> Self {
        state.borrow_mut().acquired += 1;
        Self {
            label,
            plan: plan.clone(),
            state: Rc::clone(state),
            released: false,
        }
    }

    fn record(&self, event: impl Into<String>) {
        self.state.borrow_mut().events.push(event.into());
    }

    fn child(&self, label: &'static str) -> Self {
        Self::acquire(label, &self.plan, &self.state)
    }
}

fn failure(what: &str) -> ConvertError {
    ConvertError::Io(io::Error::other(format!("{} failed", what)))
}

impl Release for Handle {
    fn label(&self) -> &'static str {
        self.label
    }

    fn release(&mut self) -> Result<()> {
        assert!(!self.released, "{} released twice", self.label);
        self.released = true;
        self.record(format!("release {}", self.label));
        self.state.borrow_mut().released += 1;

        if self.plan.fail_release.contains(&self.label) {
            return Err(failure("release"));
        }
        Ok(())
    }
}

impl AutomationHost for MockHost {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn start(&self) -> Result<Box<dyn Application>> {
        {
            let mut state = self.state.borrow_mut();
            state.events.push("start".to_string());
            state.starts += 1;
        }

        if self.plan.fail_start {
            return Err(ConvertError::ApplicationStart {
                message: "mock refused to start".to_string(),
            });
        }

        Ok(Box::new(Handle::acquire("application", &self.plan, &self.state)))
    }
}

impl Application for Handle {
    fn documents(&mut self) -> Result<Box<dyn Documents>> {
        self.record("documents");
        Ok(Box::new(self.child("documents")))
    }

    fn quit(&mut self) -> Result<()> {
        self.record("quit");
        if self.plan.fail_quit {
            return Err(failure("quit"));
        }
        Ok(())
    }
}

impl Documents for Handle {
    fn open(&mut self, path: &Path) -> Result<Box<dyn Document>> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.record(format!("open {}", name));

        if self.plan.fail_open || self.plan.broken.iter().any(|b| *b == name) {
            return Err(ConvertError::DocumentOpen {
                path: path.display().to_string(),
                message: "mock cannot open".to_string(),
            });
        }

        let text = self
            .plan
            .texts
            .iter()
            .find(|(file, _)| *file == name)
            .map(|(_, text)| *text)
            .unwrap_or(DEFAULT_TEXT);

        Ok(Box::new(MockDocument {
            handle: self.child("document"),
            text,
        }))
    }
}

struct MockDocument {
    handle: Handle,
    text: &'static str,
}

impl Release for MockDocument {
    fn label(&self) -> &'static str {
        self.handle.label()
    }

    fn release(&mut self) -> Result<()> {
        self.handle.release()
    }
}

impl Document for MockDocument {
    fn activate(&mut self) -> Result<()> {
        self.handle.record("activate");
        Ok(())
    }

    fn content(&mut self) -> Result<Box<dyn ContentRange>> {
        self.handle.record("content");
        Ok(Box::new(MockRange {
            handle: self.handle.child("content range"),
            text: self.text,
        }))
    }
}

struct MockRange {
    handle: Handle,
    text: &'static str,
}

impl Release for MockRange {
    fn label(&self) -> &'static str {
        self.handle.label()
    }

    fn release(&mut self) -> Result<()> {
        self.handle.release()
    }
}

impl ContentRange for MockRange {
    fn text(&self) -> Result<String> {
        self.handle.record("text");
        if self.handle.plan.fail_text {
            return Err(ConvertError::ContentRead {
                message: "mock range is unreadable".to_string(),
            });
        }
        Ok(self.text.to_string())
    }
}
