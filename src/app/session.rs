//! Directory session state for rove.
//!
//! Holds the current directory, its entries, the filtered view, the cursor, scroll offset
//! and the multi-selection. Directory and git loads are issued as tagged [WorkerTask]s and
//! their responses are only committed while they still match the latest request.

use crate::core::fm::Entry;
use crate::core::git::GitInfo;
use crate::core::worker::WorkerTask;

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

/// The outstanding directory request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    pub path: PathBuf,
    pub request_id: u64,
    pub refresh: bool,
}

/// What happened to a directory response.
#[derive(Debug)]
pub enum LoadOutcome {
    Committed,
    /// Superseded by a newer request.
    Stale,
    /// The read failed; nothing was committed.
    Failed(io::Error),
}

#[derive(Debug, Default)]
pub struct Session {
    current_path: PathBuf,
    entries: Vec<Entry>,
    filtered: Vec<usize>,
    query: String,
    selected: usize,
    scroll: usize,
    viewport: usize,
    /// Marked entries keyed by path. Survives navigation.
    marked: BTreeMap<PathBuf, Entry>,
    pending: Option<PendingLoad>,
    nav_request_id: u64,
    git_request_id: u64,
    git_pending: bool,
    git: GitInfo,
    git_path: Option<PathBuf>,
}

impl Session {
    pub fn new(path: PathBuf) -> Self {
        Self {
            current_path: path,
            ..Self::default()
        }
    }

    // Getters / Accessors

    #[inline]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[inline]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Entries passing the search filter, in listing order.
    pub fn filtered_entries(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.filtered.iter().filter_map(|&i| self.entries.get(i))
    }

    #[inline]
    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    pub fn filtered_entry(&self, index: usize) -> Option<&Entry> {
        self.filtered.get(index).and_then(|&i| self.entries.get(i))
    }

    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[inline]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    #[inline]
    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    #[inline]
    pub fn viewport(&self) -> usize {
        self.viewport.max(1)
    }

    pub fn selected_entry(&self) -> Option<&Entry> {
        self.filtered_entry(self.selected)
    }

    pub fn selected_path(&self) -> Option<&Path> {
        self.selected_entry().map(Entry::path)
    }

    pub fn selected_files(&self) -> impl Iterator<Item = &Path> + '_ {
        self.marked.keys().map(PathBuf::as_path)
    }

    #[inline]
    pub fn selection_len(&self) -> usize {
        self.marked.len()
    }

    pub fn is_marked(&self, path: &Path) -> bool {
        self.marked.contains_key(path)
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn pending(&self) -> Option<&PendingLoad> {
        self.pending.as_ref()
    }

    #[inline]
    pub fn is_git_loading(&self) -> bool {
        self.git_pending
    }

    #[inline]
    pub fn git(&self) -> &GitInfo {
        &self.git
    }

    /// Rows currently on screen, with their index in the filtered view.
    pub fn visible_entries(&self) -> impl Iterator<Item = (usize, &Entry)> + '_ {
        self.filtered_entries()
            .enumerate()
            .skip(self.scroll)
            .take(self.viewport())
    }

    // Loading

    fn prepare_new_request(&mut self) -> u64 {
        self.nav_request_id = self.nav_request_id.wrapping_add(1);
        self.nav_request_id
    }

    /// Starts loading `path`. The returned task must be submitted to the workers.
    ///
    /// `focus` names the entry the cursor should land on once the listing commits.
    pub fn navigate(
        &mut self,
        path: PathBuf,
        show_hidden: bool,
        focus: Option<String>,
    ) -> WorkerTask {
        self.request_load(path, show_hidden, focus, false)
    }

    /// The target of an in-flight navigation, if any. Refreshes do not count.
    pub fn pending_navigation(&self) -> Option<&Path> {
        self.pending
            .as_ref()
            .filter(|p| !p.refresh)
            .map(|p| p.path.as_path())
    }

    /// Reloads the current directory, keeping the multi-selection for entries still present.
    ///
    /// Without a `focus` the cursor returns to the entry it was on. Returns `None` while a
    /// navigation is in flight: that listing is fresh anyway and must not be superseded.
    pub fn refresh(&mut self, show_hidden: bool, focus: Option<String>) -> Option<WorkerTask> {
        if self.pending.as_ref().is_some_and(|p| !p.refresh) {
            tracing::debug!("refresh skipped, navigation pending");
            return None;
        }
        let focus = focus.or_else(|| self.selected_entry().map(|e| e.name().to_string()));
        Some(self.request_load(self.current_path.clone(), show_hidden, focus, true))
    }

    fn request_load(
        &mut self,
        path: PathBuf,
        show_hidden: bool,
        focus: Option<String>,
        refresh: bool,
    ) -> WorkerTask {
        let request_id = self.prepare_new_request();
        tracing::debug!(path = %path.display(), request_id, refresh, "directory load issued");
        self.pending = Some(PendingLoad {
            path: path.clone(),
            request_id,
            refresh,
        });
        WorkerTask::LoadDirectory {
            path,
            show_hidden,
            focus,
            request_id,
        }
    }

    /// Applies a directory response if it answers the outstanding request.
    ///
    /// On commit the path, entries, cursor, scroll and search are replaced; a refresh also
    /// drops marked entries of this directory that disappeared.
    pub fn apply_listing(
        &mut self,
        path: &Path,
        request_id: u64,
        result: io::Result<Vec<Entry>>,
        focus: Option<&str>,
    ) -> LoadOutcome {
        let Some(pending) = self.pending.as_ref() else {
            tracing::debug!(path = %path.display(), request_id, "stale directory response");
            return LoadOutcome::Stale;
        };
        if pending.path != path || pending.request_id != request_id {
            tracing::debug!(path = %path.display(), request_id, "stale directory response");
            return LoadOutcome::Stale;
        }
        let refresh = pending.refresh;
        self.pending = None;

        let entries = match result {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "directory load failed");
                return LoadOutcome::Failed(e);
            }
        };

        if refresh {
            let dir = path.to_path_buf();
            self.marked.retain(|marked, _| {
                marked.parent() != Some(dir.as_path())
                    || entries.iter().any(|e| e.path() == marked)
            });
        }

        if self.git_path.as_deref() != Some(path) {
            self.git = GitInfo::default();
            self.git_path = None;
        }
        self.entries = self.tag_with_git(entries);
        self.current_path = path.to_path_buf();
        self.query.clear();
        self.filtered = (0..self.entries.len()).collect();
        self.selected = 0;
        self.scroll = 0;

        if let Some(name) = focus {
            self.focus_name(name);
        }
        LoadOutcome::Committed
    }

    /// Issues a git query for the current directory.
    pub fn request_git(&mut self) -> WorkerTask {
        self.git_request_id = self.git_request_id.wrapping_add(1);
        self.git_pending = true;
        WorkerTask::LoadGit {
            path: self.current_path.clone(),
            request_id: self.git_request_id,
        }
    }

    /// Applies a git response for the current directory. Returns false if it was stale.
    pub fn apply_git(&mut self, path: &Path, request_id: u64, info: GitInfo) -> bool {
        if path != self.current_path || request_id != self.git_request_id {
            tracing::debug!(path = %path.display(), request_id, "stale git response");
            return false;
        }
        self.git_pending = false;
        self.git = info;
        self.git_path = Some(path.to_path_buf());
        let entries = std::mem::take(&mut self.entries);
        self.entries = self.tag_with_git(entries);
        true
    }

    fn tag_with_git(&self, entries: Vec<Entry>) -> Vec<Entry> {
        entries
            .iter()
            .map(|e| e.with_git_status(self.git.status_of(e.name())))
            .collect()
    }

    // Filtering

    /// Filters to names containing `query` case-insensitively and resets the cursor.
    pub fn set_search_query(&mut self, query: &str) {
        self.query = query.to_string();
        let needle = query.to_lowercase();
        self.filtered = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| needle.is_empty() || e.lowercase_name().contains(&needle))
            .map(|(i, _)| i)
            .collect();
        self.selected = 0;
        self.scroll = 0;
    }

    // Cursor

    pub fn set_viewport(&mut self, rows: usize) {
        self.viewport = rows.max(1);
        self.ensure_visible();
    }

    /// Moves the cursor by `delta`, clamped to the filtered view.
    pub fn move_selection(&mut self, delta: isize) {
        let len = self.filtered.len();
        if len == 0 {
            self.selected = 0;
            self.scroll = 0;
            return;
        }
        let target = self.selected.saturating_add_signed(delta);
        self.selected = target.min(len - 1);
        self.ensure_visible();
    }

    /// Moves by whole pages. A `page_size` of 0 uses the viewport height.
    pub fn page_move(&mut self, pages: isize, page_size: usize) {
        let page = if page_size == 0 {
            self.viewport()
        } else {
            page_size
        };
        let page = isize::try_from(page).unwrap_or(isize::MAX);
        self.move_selection(pages.saturating_mul(page));
    }

    pub fn move_to_top(&mut self) {
        self.selected = 0;
        self.ensure_visible();
    }

    pub fn move_to_bottom(&mut self) {
        self.selected = self.filtered.len().saturating_sub(1);
        self.ensure_visible();
    }

    /// Puts the cursor on the entry called `name` if it is in the filtered view.
    pub fn focus_name(&mut self, name: &str) -> bool {
        let found = self.filtered_entries().position(|e| e.name() == name);
        if let Some(idx) = found {
            self.selected = idx;
            self.ensure_visible();
        }
        found.is_some()
    }

    fn ensure_visible(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            self.selected = 0;
            self.scroll = 0;
            return;
        }
        let rows = self.viewport();
        self.selected = self.selected.min(len - 1);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + rows {
            self.scroll = self.selected + 1 - rows;
        }
        self.scroll = self.scroll.min(len.saturating_sub(1));
    }

    // Multi-selection

    /// Toggles the mark on `path`. Only entries of the current listing can be marked;
    /// any marked path can be unmarked. Returns whether the path is now marked.
    pub fn toggle_selection(&mut self, path: &Path) -> bool {
        if self.marked.remove(path).is_some() {
            return false;
        }
        match self.entries.iter().find(|e| e.path() == path) {
            Some(entry) => {
                self.marked.insert(path.to_path_buf(), entry.clone());
                true
            }
            None => false,
        }
    }

    /// Marks every entry in the filtered view.
    pub fn select_all(&mut self) {
        let entries: Vec<Entry> = self.filtered_entries().cloned().collect();
        for entry in entries {
            self.marked.insert(entry.path().to_path_buf(), entry);
        }
    }

    pub fn clear_selection(&mut self) {
        self.marked.clear();
    }

    pub fn unmark<'a>(&mut self, paths: impl IntoIterator<Item = &'a PathBuf>) {
        for path in paths {
            self.marked.remove(path);
        }
    }

    /// Entries an action applies to: the marked set, else the entry under the cursor.
    pub fn action_targets(&self) -> Vec<Entry> {
        if !self.marked.is_empty() {
            return self.marked.values().cloned().collect();
        }
        self.selected_entry().cloned().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fm::EntryKind;
    use crate::core::git::GitStatus;

    use rand::Rng;
    use std::collections::HashMap;
    use std::error;

    fn listing(dir: &str, names: &[&str]) -> Vec<Entry> {
        names
            .iter()
            .map(|n| Entry::new(Path::new(dir).join(n), EntryKind::File))
            .collect()
    }

    fn load(session: &mut Session, dir: &str, names: &[&str]) -> LoadOutcome {
        let WorkerTask::LoadDirectory {
            path, request_id, ..
        } = session.navigate(PathBuf::from(dir), false, None)
        else {
            panic!("expected a directory load");
        };
        session.apply_listing(&path, request_id, Ok(listing(dir, names)), None)
    }

    fn ids(task: WorkerTask) -> (PathBuf, u64) {
        match task {
            WorkerTask::LoadDirectory {
                path, request_id, ..
            } => (path, request_id),
            other => panic!("unexpected task {other:?}"),
        }
    }

    #[test]
    fn late_response_for_abandoned_path_is_discarded() {
        let mut session = Session::new(PathBuf::from("/"));
        let (a_path, a_id) = ids(session.navigate(PathBuf::from("/a"), false, None));
        let (b_path, b_id) = ids(session.navigate(PathBuf::from("/b"), false, None));

        let b = session.apply_listing(&b_path, b_id, Ok(listing("/b", &["two"])), None);
        assert!(matches!(b, LoadOutcome::Committed));
        let a = session.apply_listing(&a_path, a_id, Ok(listing("/a", &["one"])), None);
        assert!(matches!(a, LoadOutcome::Stale));

        assert_eq!(session.current_path(), Path::new("/b"));
        assert_eq!(session.entries()[0].name(), "two");
    }

    #[test]
    fn same_path_older_request_is_stale() {
        let mut session = Session::new(PathBuf::from("/"));
        let (path, old) = ids(session.navigate(PathBuf::from("/a"), false, None));
        let (_, new) = ids(session.navigate(PathBuf::from("/a"), false, None));
        let outcome = session.apply_listing(&path, old, Ok(listing("/a", &["x"])), None);
        assert!(matches!(outcome, LoadOutcome::Stale));
        assert!(session.is_loading());
        let outcome = session.apply_listing(&path, new, Ok(listing("/a", &["x"])), None);
        assert!(matches!(outcome, LoadOutcome::Committed));
        assert!(!session.is_loading());
    }

    #[test]
    fn failed_load_keeps_current_path() {
        let mut session = Session::new(PathBuf::from("/"));
        load(&mut session, "/ok", &["a"]);
        let (path, id) = ids(session.navigate(PathBuf::from("/denied"), false, None));
        let outcome = session.apply_listing(
            &path,
            id,
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied")),
            None,
        );
        assert!(matches!(outcome, LoadOutcome::Failed(_)));
        assert_eq!(session.current_path(), Path::new("/ok"));
        assert_eq!(session.entries().len(), 1);
    }

    #[test]
    fn search_filters_and_clearing_restores() {
        let mut session = Session::new(PathBuf::from("/"));
        load(&mut session, "/d", &["Alpha", "beta", "GAMMA", "alphabet"]);
        session.move_selection(2);

        session.set_search_query("ALP");
        let names: Vec<_> = session.filtered_entries().map(Entry::name).collect();
        assert_eq!(names, ["Alpha", "alphabet"]);
        assert_eq!(session.selected_index(), 0);

        session.move_selection(1);
        session.set_search_query("");
        assert_eq!(session.filtered_len(), session.entries().len());
        assert_eq!(session.selected_index(), 0);
        assert_eq!(session.scroll_offset(), 0);
    }

    #[test]
    fn selection_stays_in_bounds_under_random_moves() {
        let mut rng = rand::rng();
        let mut session = Session::new(PathBuf::from("/"));
        let names: Vec<String> = (0..37).map(|i| format!("f{i:02}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        load(&mut session, "/d", &refs);
        session.set_viewport(7);

        for _ in 0..2000 {
            match rng.random_range(0..4) {
                0 => session.move_selection(rng.random_range(-50i32..50) as isize),
                1 => session.page_move(rng.random_range(-3i32..3) as isize, 0),
                2 => session.set_viewport(rng.random_range(0..20)),
                _ => {
                    let q = if rng.random_bool(0.5) { "1" } else { "" };
                    session.set_search_query(q);
                }
            }
            let len = session.filtered_len();
            if len == 0 {
                assert_eq!(session.selected_index(), 0);
            } else {
                assert!(session.selected_index() < len);
                assert!(session.selected_index() >= session.scroll_offset());
                assert!(session.selected_index() < session.scroll_offset() + session.viewport());
            }
        }
    }

    #[test]
    fn toggling_twice_restores_selection() {
        let mut session = Session::new(PathBuf::from("/"));
        load(&mut session, "/d", &["a", "b", "c"]);
        let b = PathBuf::from("/d/b");
        session.toggle_selection(Path::new("/d/a"));
        let before: Vec<PathBuf> = session.selected_files().map(Path::to_path_buf).collect();

        assert!(session.toggle_selection(&b));
        assert!(!session.toggle_selection(&b));
        let after: Vec<PathBuf> = session.selected_files().map(Path::to_path_buf).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn selection_survives_navigation() {
        let mut session = Session::new(PathBuf::from("/"));
        load(&mut session, "/d", &["a", "b"]);
        session.select_all();
        load(&mut session, "/e", &["z"]);
        assert_eq!(session.selection_len(), 2);
        let targets: Vec<_> = session.action_targets();
        assert_eq!(targets.len(), 2);
        session.clear_selection();
        assert_eq!(session.action_targets()[0].name(), "z");
    }

    #[test]
    fn refresh_prunes_missing_and_keeps_focus() -> Result<(), Box<dyn error::Error>> {
        let mut session = Session::new(PathBuf::from("/"));
        load(&mut session, "/other", &["keep"]);
        session.toggle_selection(Path::new("/other/keep"));
        load(&mut session, "/d", &["a", "b", "c"]);
        session.toggle_selection(Path::new("/d/a"));
        session.toggle_selection(Path::new("/d/b"));
        session.move_selection(2);

        let (path, id) = ids(session.refresh(false, None).ok_or("refresh not issued")?);
        let listed = Ok(listing("/d", &["b", "c"]));
        let committed = session.apply_listing(&path, id, listed, Some("c"));
        assert!(matches!(committed, LoadOutcome::Committed));

        let marked: Vec<&Path> = session.selected_files().collect();
        assert_eq!(marked, [Path::new("/d/b"), Path::new("/other/keep")]);
        assert_eq!(session.selected_entry().map(Entry::name), Some("c"));
        Ok(())
    }

    #[test]
    fn refresh_never_supersedes_pending_navigation() -> Result<(), Box<dyn error::Error>> {
        let mut session = Session::new(PathBuf::from("/"));
        load(&mut session, "/a", &["x"]);
        let (path, id) = ids(session.navigate(PathBuf::from("/b"), false, None));
        assert!(session.refresh(false, Some("x".into())).is_none());

        let committed = session.apply_listing(&path, id, Ok(listing("/b", &["y"])), None);
        assert!(matches!(committed, LoadOutcome::Committed));
        assert_eq!(session.current_path(), Path::new("/b"));

        // A pending refresh may still be replaced by a newer one.
        let first = ids(session.refresh(false, None).ok_or("refresh not issued")?);
        let second = ids(session.refresh(false, None).ok_or("refresh not issued")?);
        let stale = session.apply_listing(&first.0, first.1, Ok(listing("/b", &["y"])), None);
        assert!(matches!(stale, LoadOutcome::Stale));
        let fresh = session.apply_listing(&second.0, second.1, Ok(listing("/b", &["y"])), None);
        assert!(matches!(fresh, LoadOutcome::Committed));
        Ok(())
    }

    #[test]
    fn git_tags_attach_only_for_current_dir() {
        let mut session = Session::new(PathBuf::from("/"));
        load(&mut session, "/repo", &["a.rs", "b.rs"]);
        let WorkerTask::LoadGit { path, request_id } = session.request_git() else {
            panic!("expected git task");
        };
        let info = GitInfo::Repository {
            branch: "main".into(),
            status_by_filename: HashMap::from([("a.rs".to_string(), GitStatus::Modified)]),
            is_clean: false,
        };

        assert!(!session.apply_git(Path::new("/elsewhere"), request_id, info.clone()));
        assert!(session.apply_git(&path, request_id, info));
        assert_eq!(session.entries()[0].git_status(), Some(GitStatus::Modified));
        assert_eq!(session.entries()[1].git_status(), None);
        assert_eq!(session.git().branch(), Some("main"));
    }
}
