//! End-to-end tests for the rove session.
//!
//! Every test drives a real [Controller] over a temporary directory: worker threads do the
//! listing and file operations, and `pump_until_idle` waits for their responses.

use rove_tui::app::state::Severity;
use rove_tui::app::{Action, Controller, Event};
use rove_tui::config::Config;
use rove_tui::core::{GitInfo, GitProvider, LocalFs};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use std::{error, fs};
use tempfile::{TempDir, tempdir};

const SETTLE: Duration = Duration::from_secs(5);

struct NoGit;

impl GitProvider for NoGit {
    fn git_info(&self, _dir: &Path) -> GitInfo {
        GitInfo::NotRepository
    }
}

fn sandbox() -> Result<(TempDir, PathBuf), Box<dyn error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().canonicalize()?;
    Ok((dir, root))
}

fn open(path: &Path) -> Result<Controller, Box<dyn error::Error>> {
    let mut c = Controller::new(
        &Config::default(),
        path.to_path_buf(),
        Arc::new(LocalFs),
        Arc::new(NoGit),
    );
    if !c.pump_until_idle(SETTLE) {
        return Err("session did not settle".into());
    }
    Ok(c)
}

fn act(c: &mut Controller, action: Action) {
    c.dispatch(Event::Action(action));
}

fn settle(c: &mut Controller) -> Result<(), Box<dyn error::Error>> {
    if c.pump_until_idle(SETTLE) {
        Ok(())
    } else {
        Err("session did not settle".into())
    }
}

fn type_text(c: &mut Controller, text: &str) {
    for ch in text.chars() {
        c.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
    }
}

fn press(c: &mut Controller, code: KeyCode) {
    c.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
}

fn listed_names(c: &Controller) -> Vec<String> {
    c.state()
        .session()
        .filtered_entries()
        .map(|e| e.name().to_string())
        .collect()
}

#[test]
fn listing_puts_dirs_first_then_names_case_insensitive() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    fs::write(root.join("b.txt"), "b")?;
    fs::create_dir(root.join("A"))?;
    fs::write(root.join("a.txt"), "a")?;

    let c = open(&root)?;
    assert_eq!(listed_names(&c), ["A", "a.txt", "b.txt"]);
    assert_eq!(c.state().session().selected_index(), 0);
    Ok(())
}

#[test]
fn last_navigation_wins() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    let first = root.join("first");
    let second = root.join("second");
    fs::create_dir(&first)?;
    fs::create_dir(&second)?;
    fs::write(first.join("one.txt"), "1")?;
    fs::write(second.join("two.txt"), "2")?;

    let mut c = open(&root)?;
    c.dispatch(Event::Navigate(first));
    c.dispatch(Event::Navigate(second.clone()));
    settle(&mut c)?;

    assert_eq!(c.current_path(), second);
    assert_eq!(listed_names(&c), ["two.txt"]);
    Ok(())
}

#[test]
fn op_finishing_during_navigation_lands_in_target() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    let target = root.join("target");
    fs::create_dir(&target)?;
    fs::write(target.join("inside.txt"), "")?;

    let mut c = open(&root)?;
    c.dispatch(Event::Create {
        path: root.join("made"),
        is_dir: true,
    });
    c.dispatch(Event::Navigate(target.clone()));
    settle(&mut c)?;

    assert!(root.join("made").is_dir());
    assert_eq!(c.current_path(), target);
    assert_eq!(listed_names(&c), ["inside.txt"]);
    Ok(())
}

#[test]
fn paste_with_one_collision_keeps_going() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    let src = root.join("src");
    let dst = root.join("dst");
    fs::create_dir(&src)?;
    fs::create_dir(&dst)?;
    for name in ["a", "b", "c"] {
        fs::write(src.join(name), format!("new {name}"))?;
    }
    fs::write(dst.join("b"), "old b")?;

    let mut c = open(&src)?;
    act(&mut c, Action::SelectAll);
    act(&mut c, Action::Copy);
    assert_eq!(c.state().clipboard().map(|clip| clip.len()), Some(3));

    c.dispatch(Event::Navigate(dst.clone()));
    settle(&mut c)?;
    act(&mut c, Action::Paste);
    settle(&mut c)?;

    assert!(c.state().clipboard().is_none());
    assert_eq!(fs::read_to_string(dst.join("a"))?, "new a");
    assert_eq!(fs::read_to_string(dst.join("b"))?, "old b");
    assert_eq!(fs::read_to_string(dst.join("c"))?, "new c");
    assert_eq!(listed_names(&c), ["a", "b", "c"]);

    let msg = c.state().message().ok_or("no message after paste")?;
    assert_eq!(msg.severity, Severity::Error);
    assert!(msg.text.contains("2 of 3"), "unexpected summary: {}", msg.text);
    Ok(())
}

#[test]
fn cut_then_external_delete_fails_only_that_item() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    let src = root.join("src");
    let dst = root.join("dst");
    fs::create_dir(&src)?;
    fs::create_dir(&dst)?;
    fs::write(src.join("gone.txt"), "x")?;
    fs::write(src.join("kept.txt"), "y")?;

    let mut c = open(&src)?;
    act(&mut c, Action::SelectAll);
    act(&mut c, Action::Cut);
    fs::remove_file(src.join("gone.txt"))?;

    c.dispatch(Event::Navigate(dst.clone()));
    settle(&mut c)?;
    act(&mut c, Action::Paste);
    settle(&mut c)?;

    assert!(c.state().clipboard().is_none());
    assert!(dst.join("kept.txt").exists());
    assert!(!src.join("kept.txt").exists());
    assert!(!dst.join("gone.txt").exists());
    assert_eq!(listed_names(&c), ["kept.txt"]);

    let msg = c.state().message().ok_or("no message after paste")?;
    assert_eq!(msg.severity, Severity::Error);
    assert!(msg.text.contains("gone.txt"), "unexpected summary: {}", msg.text);
    assert!(!msg.text.contains("kept.txt"));
    Ok(())
}

#[test]
fn rename_without_name_reports_usage() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    fs::write(root.join("notes.txt"), "n")?;

    let mut c = open(&root)?;
    act(&mut c, Action::Command);
    type_text(&mut c, "rename \"\"");
    press(&mut c, KeyCode::Enter);
    settle(&mut c)?;

    let msg = c.state().message().ok_or("no message after command")?;
    assert_eq!(msg.text, "Usage: rename <new_name>");
    assert_eq!(msg.severity, Severity::Error);
    assert!(root.join("notes.txt").exists());
    assert!(c.state().mode().is_normal());
    Ok(())
}

#[test]
fn refresh_drops_marks_for_vanished_entries() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    fs::write(root.join("a.txt"), "a")?;
    fs::write(root.join("b.txt"), "b")?;

    let mut c = open(&root)?;
    act(&mut c, Action::SelectAll);
    assert_eq!(c.state().session().selection_len(), 2);

    fs::remove_file(root.join("b.txt"))?;
    act(&mut c, Action::Refresh);
    settle(&mut c)?;

    let session = c.state().session();
    assert_eq!(session.selection_len(), 1);
    assert!(session.is_marked(&root.join("a.txt")));
    assert!(!session.is_marked(&root.join("b.txt")));
    Ok(())
}

#[test]
fn cursor_stays_in_bounds_under_random_moves() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    for i in 0..37 {
        fs::write(root.join(format!("file_{i:02}")), "")?;
    }

    let mut c = open(&root)?;
    c.dispatch(Event::Resize { rows: 7 });

    let moves = [
        Action::MoveUp,
        Action::MoveDown,
        Action::PageUp,
        Action::PageDown,
        Action::MoveToTop,
        Action::MoveToBottom,
    ];
    let mut rng = rand::rng();
    for _ in 0..500 {
        let action = moves[rng.random_range(0..moves.len())];
        act(&mut c, action);

        let session = c.state().session();
        let selected = session.selected_index();
        let scroll = session.scroll_offset();
        assert!(selected < session.filtered_len());
        assert!(scroll <= selected && selected < scroll + session.viewport());
    }
    Ok(())
}

#[test]
fn cancelled_search_restores_full_listing() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    for name in ["alpha.rs", "beta.rs", "gamma.md"] {
        fs::write(root.join(name), "")?;
    }

    let mut c = open(&root)?;
    act(&mut c, Action::Search);
    type_text(&mut c, "BET");
    assert_eq!(listed_names(&c), ["beta.rs"]);

    press(&mut c, KeyCode::Esc);
    assert!(c.state().mode().is_normal());
    assert_eq!(c.state().session().query(), "");
    assert_eq!(listed_names(&c), ["alpha.rs", "beta.rs", "gamma.md"]);
    Ok(())
}

#[test]
fn toggling_twice_leaves_selection_unchanged() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    fs::write(root.join("one"), "")?;
    fs::write(root.join("two"), "")?;

    let mut c = open(&root)?;
    act(&mut c, Action::ToggleSelection);
    assert_eq!(c.state().session().selection_len(), 1);
    act(&mut c, Action::MoveUp);
    act(&mut c, Action::ToggleSelection);
    assert_eq!(c.state().session().selection_len(), 0);
    Ok(())
}

#[test]
fn new_directory_prompt_creates_and_focuses() -> Result<(), Box<dyn error::Error>> {
    let (_guard, root) = sandbox()?;
    fs::write(root.join("zzz.txt"), "")?;

    let mut c = open(&root)?;
    act(&mut c, Action::NewDirectory);
    type_text(&mut c, "build");
    press(&mut c, KeyCode::Enter);
    settle(&mut c)?;

    assert!(root.join("build").is_dir());
    assert_eq!(
        c.state().session().selected_entry().map(|e| e.name()),
        Some("build")
    );
    Ok(())
}
