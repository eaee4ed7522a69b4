//! Preview state for the selected entry.
//!
//! Loads run on their own request stream, independent of directory loads. A response is
//! applied only while it answers the newest request and its path is still the selected one.

use crate::core::fm::Entry;
use crate::core::formatter::PreviewContent;
use crate::core::worker::WorkerTask;

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct PreviewState {
    /// Path the shown content belongs to.
    path: Option<PathBuf>,
    content: PreviewContent,
    scroll: usize,
    pending: Option<(PathBuf, u64)>,
    request_id: u64,
}

impl PreviewState {
    #[inline]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[inline]
    pub fn content(&self) -> &PreviewContent {
        &self.content
    }

    #[inline]
    pub fn scroll(&self) -> usize {
        self.scroll
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    fn prepare_new_request(&mut self) -> u64 {
        self.request_id = self.request_id.wrapping_add(1);
        self.request_id
    }

    /// Brings the preview in line with `selected`.
    ///
    /// Returns a task when a load is needed. Nothing selected clears the preview and a
    /// directory resolves immediately to an empty one; both also retire any pending load.
    pub fn request(&mut self, selected: Option<&Entry>, max_bytes: usize) -> Option<WorkerTask> {
        let Some(entry) = selected else {
            if self.path.is_some() || self.pending.is_some() {
                self.prepare_new_request();
                *self = PreviewState {
                    request_id: self.request_id,
                    ..PreviewState::default()
                };
            }
            return None;
        };

        let path = entry.path();
        if self.pending.as_ref().is_some_and(|(p, _)| p == path) {
            return None;
        }
        if self.pending.is_none() && self.path.as_deref() == Some(path) {
            return None;
        }

        let request_id = self.prepare_new_request();
        if entry.is_dir() {
            self.pending = None;
            self.show(path.to_path_buf(), PreviewContent::default());
            return None;
        }

        self.pending = Some((path.to_path_buf(), request_id));
        Some(WorkerTask::LoadPreview {
            path: path.to_path_buf(),
            max_bytes,
            request_id,
        })
    }

    /// Applies a preview response. Returns false when it was discarded.
    ///
    /// A read error becomes the preview text.
    pub fn apply(
        &mut self,
        path: &Path,
        request_id: u64,
        result: io::Result<PreviewContent>,
        selected: Option<&Path>,
    ) -> bool {
        let current = self
            .pending
            .as_ref()
            .is_some_and(|(p, id)| p == path && *id == request_id);
        if !current || selected != Some(path) {
            tracing::debug!(path = %path.display(), request_id, "stale preview response");
            return false;
        }
        self.pending = None;
        let content = result.unwrap_or_else(|e| PreviewContent {
            content: format!("Preview unavailable: {e}"),
            ..PreviewContent::default()
        });
        self.show(path.to_path_buf(), content);
        true
    }

    fn show(&mut self, path: PathBuf, content: PreviewContent) {
        self.path = Some(path);
        self.content = content;
        self.scroll = 0;
    }

    /// Forgets the shown content so the next [PreviewState::request] reloads it.
    pub fn invalidate(&mut self) {
        self.path = None;
        self.pending = None;
        self.prepare_new_request();
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let max = self.content.content.lines().count().saturating_sub(1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
    }
}
