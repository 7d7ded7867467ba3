//! Console collaborator: the user-visible message log and alerts.

use std::cell::RefCell;
use std::rc::Rc;

/// Sink for user-facing messages.
pub trait Console {
    /// Append a line to the console log.
    fn append_text(&mut self, text: &str);

    /// Raise a user-facing alert (a modal dialog in a GUI shell).
    fn alert(&mut self, title: &str, message: &str) {
        log::warn!("{}: {}", title, message);
    }
}

/// Console that forwards everything to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConsole;

impl Console for LogConsole {
    fn append_text(&mut self, text: &str) {
        log::info!("[console] {}", text);
    }
}

/// In-memory console for tests and headless use.
///
/// Clones share the same buffers, so a handle can be kept after the console
/// has been handed to the runtime.
#[derive(Debug, Clone, Default)]
pub struct MemoryConsole {
    lines: Rc<RefCell<Vec<String>>>,
    alerts: Rc<RefCell<Vec<(String, String)>>>,
}

impl MemoryConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn alerts(&self) -> Vec<(String, String)> {
        self.alerts.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
        self.alerts.borrow_mut().clear();
    }
}

impl Console for MemoryConsole {
    fn append_text(&mut self, text: &str) {
        self.lines.borrow_mut().push(text.to_string());
    }

    fn alert(&mut self, title: &str, message: &str) {
        self.alerts.borrow_mut().push((title.to_string(), message.to_string()));
    }
}
