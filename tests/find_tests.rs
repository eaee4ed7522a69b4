use rove_tui::core::find::find;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use tempfile::tempdir;

fn names(results: &[rove_tui::core::find::FindResult]) -> Vec<String> {
    results
        .iter()
        .map(|r| r.path().display().to_string())
        .collect()
}

#[test]
fn test_find_unit() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::File::create(dir.path().join("crab.txt"))?;
    fs::File::create(dir.path().join("other.txt"))?;
    let cancel = Arc::new(AtomicBool::new(false));
    let out = find(dir.path(), "crab", &cancel, 10, false)?;
    assert_eq!(
        out.len(),
        1,
        "Expected 1 result for 'crab', got {}: {:?}",
        out.len(),
        names(&out)
    );

    let filename = out[0]
        .path()
        .file_name()
        .and_then(|s| s.to_str())
        .ok_or("Could not extract valid UTF-8 file name")?;
    assert!(
        filename.contains("crab"),
        "Filename does not contain 'crab': got '{}'",
        filename
    );
    Ok(())
}

#[test]
fn test_find_empty_query() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::File::create(dir.path().join("something.txt"))?;
    let cancel = Arc::new(AtomicBool::new(false));
    let out = find(dir.path(), "", &cancel, 10, false)?;
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn test_find_subdirectory() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let subdir = dir.path().join("nested");
    fs::create_dir(&subdir)?;
    fs::File::create(subdir.join("crabby.rs"))?;
    let cancel = Arc::new(AtomicBool::new(false));
    let out = find(dir.path(), "crabby", &cancel, 10, false)?;
    assert_eq!(
        out.len(),
        1,
        "Expected 1 result for 'crabby', got {}: {:?}",
        out.len(),
        names(&out)
    );
    assert_eq!(out[0].relative(dir.path()), "nested/crabby.rs");
    Ok(())
}

#[test]
fn test_find_reports_dir() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::create_dir(dir.path().join("crabdir"))?;
    let cancel = Arc::new(AtomicBool::new(false));
    let out = find(dir.path(), "crab", &cancel, 10, false)?;
    assert!(out.iter().any(|r| r.is_dir()));
    Ok(())
}
