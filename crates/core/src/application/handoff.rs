// Hand-off file - passes the calendar sub-invocation's result back to the agent

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::EventHandoff;
use crate::error::Result;

/// JSON file holding one `{"summary": .., "delta": ..}` document
#[derive(Debug, Clone)]
pub struct HandoffFile {
    path: PathBuf,
}

impl HandoffFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the document; readers never observe a half-written file
    pub fn write(&self, doc: &EventHandoff) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), summary = %doc.summary, "Hand-off written");
        Ok(())
    }

    /// `Ok(None)` when the file does not exist
    pub fn try_read(&self) -> Result<Option<EventHandoff>> {
        match fs::read_to_string(&self.path) {
            Ok(body) => Ok(Some(serde_json::from_str(&body)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Missing or unreadable files yield the empty placeholder
    pub fn read(&self) -> EventHandoff {
        match self.try_read() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                debug!(path = %self.path.display(), "No hand-off file yet");
                EventHandoff::placeholder()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unreadable hand-off file");
                EventHandoff::placeholder()
            }
        }
    }
}
