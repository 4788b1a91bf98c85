//! Offline client serving service responses captured to disk.
//!
//! A file answers every model. A directory is searched per model for
//! `<kind>/<model>.txt`, then `<kind>.txt`, where `<kind>` is
//! [`SuggestionRequest::kind`]. Models with no capture fail like an
//! unreachable model, so the advisor moves on to the next one.

use crate::{AdvisorError, SuggestionClient, SuggestionRequest};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayClient {
    root: PathBuf,
}

impl ReplayClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn capture_for(&self, model: &str, kind: &str) -> Option<PathBuf> {
        if self.root.is_file() {
            return Some(self.root.clone());
        }
        [
            self.root.join(kind).join(format!("{model}.txt")),
            self.root.join(format!("{kind}.txt")),
        ]
        .into_iter()
        .find(|p| p.is_file())
    }
}

impl SuggestionClient for ReplayClient {
    fn generate(&self, model: &str, request: &SuggestionRequest) -> Result<String, AdvisorError> {
        let kind = request.kind();
        let Some(path) = self.capture_for(model, kind) else {
            return Err(AdvisorError::Request(format!(
                "no captured {kind} response for {model} under {}",
                self.root.display()
            )));
        };
        debug!(
            model,
            kind,
            path = %path.display(),
            prompt_len = request.prompt().len(),
            "replaying captured response"
        );
        std::fs::read_to_string(&path)
            .map_err(|e| AdvisorError::Request(format!("{}: {e}", path.display())))
    }

    fn requires_api_key(&self) -> bool {
        false
    }
}
