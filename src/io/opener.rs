//! Opening deep links in the visitor's messaging app

use parking_lot::Mutex;
use tracing::info;

/// Hands a link to whatever opens it (browser tab, OS handler, log)
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str);
}

/// Logs the link and prints it to stdout. Used by the headless driver.
#[derive(Debug, Default)]
pub struct LogOpener;

impl LinkOpener for LogOpener {
    fn open(&self, url: &str) {
        info!(url = %url, "link_opened");
        println!("open: {}", url);
    }
}

/// Keeps every opened link in order
#[derive(Debug, Default)]
pub struct RecordingOpener {
    opened: Mutex<Vec<String>>,
}

impl RecordingOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.opened.lock().len()
    }
}

impl LinkOpener for RecordingOpener {
    fn open(&self, url: &str) {
        self.opened.lock().push(url.to_string());
    }
}
