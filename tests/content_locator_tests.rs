use std::fs;
use std::path::{Path, PathBuf};

use filetime::{set_file_mtime, FileTime};
use restlaunch::content::{
    find_first_matching_file, find_matching_file, ContentLocator, ContentRoot, ResolvedContent,
    GUI_NOT_AVAILABLE_MESSAGE,
};
use restlaunch::resources::ClasspathResources;
use tempfile::tempdir;

fn touch(path: &PathBuf, secs: i64) {
    fs::write(path, b"x").unwrap();
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[test]
fn test_existing_path_returned_as_given() {
    let dir = tempdir().unwrap();
    let file = dir.path().join("app.tar");
    fs::write(&file, b"x").unwrap();
    assert_eq!(find_matching_file(&file), Some(file));
}

#[test]
fn test_newest_glob_match_wins() {
    let dir = tempdir().unwrap();
    let old = dir.path().join("gui-1.0.tar");
    let new = dir.path().join("gui-2.0.tar");
    let other = dir.path().join("gui-3.0.zip");
    touch(&old, 1_000_000);
    touch(&new, 2_000_000);
    touch(&other, 3_000_000);

    let found = find_matching_file(dir.path().join("gui-*.tar")).unwrap();
    assert_eq!(found.file_name(), new.file_name());
    assert!(found.is_absolute());
}

#[test]
fn test_equal_mtimes_resolve_deterministically() {
    let dir = tempdir().unwrap();
    let a = dir.path().join("a.tar");
    let b = dir.path().join("b.tar");
    touch(&b, 1_500_000);
    touch(&a, 1_500_000);

    let pattern = dir.path().join("*.tar");
    let first = find_matching_file(&pattern).unwrap();
    assert_eq!(first.file_name(), a.file_name());
    for _ in 0..5 {
        assert_eq!(find_matching_file(&pattern), Some(first.clone()));
    }
}

#[test]
fn test_absent_when_nothing_matches() {
    let dir = tempdir().unwrap();
    assert_eq!(find_matching_file(dir.path().join("*.tar")), None);
    assert_eq!(find_matching_file(dir.path().join("missing/*.tar")), None);
}

#[test]
fn test_first_pattern_with_match_wins() {
    let dir = tempdir().unwrap();
    let later = dir.path().join("later");
    fs::create_dir(&later).unwrap();
    let patterns = vec![
        dir.path().join("nothing-here").display().to_string(),
        later.display().to_string(),
    ];
    assert_eq!(find_first_matching_file(&patterns), Some(later));
}

#[test]
fn test_directory_candidate_preferred_over_bundle() {
    let dir = tempdir().unwrap();
    let gui = dir.path().join("gui");
    fs::create_dir(&gui).unwrap();
    fs::write(gui.join("index.html"), "<h1>gui</h1>").unwrap();

    let locator = ContentLocator::new(
        vec![gui.display().to_string()],
        "classpath://gui.tar",
        ClasspathResources::empty(),
    );
    let root = locator.resolve_gui(true).unwrap();
    assert_eq!(root.resolved(), &ResolvedContent::Directory { path: gui.clone() });
    assert_eq!(root.serve_dir(), gui.as_path());
}

#[test]
fn test_bundled_archive_used_without_gui_candidates() {
    let res = tempdir().unwrap();
    let mut builder = tar::Builder::new(Vec::new());
    let body = b"<h1>bundled</h1>";
    let mut header = tar::Header::new_gnu();
    header.set_size(body.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, "index.html", &body[..])
        .unwrap();
    fs::write(res.path().join("gui.tar"), builder.into_inner().unwrap()).unwrap();

    let locator = ContentLocator::new(
        vec!["/nonexistent/gui".to_string()],
        "classpath://gui.tar",
        ClasspathResources::new([res.path()]),
    );
    let root = locator.resolve_gui(false).unwrap();
    assert_eq!(
        root.resolved(),
        &ResolvedContent::Bundled {
            url: "classpath://gui.tar".to_string()
        }
    );
    let served = fs::read_to_string(root.serve_dir().join("index.html")).unwrap();
    assert_eq!(served, "<h1>bundled</h1>");
}

#[test]
fn test_fallback_page_when_nothing_found() {
    let locator = ContentLocator::new(
        vec!["/nonexistent/gui".to_string()],
        "classpath://gui.tar",
        ClasspathResources::empty(),
    );
    let root = locator.resolve_gui(true).unwrap();
    assert!(root.resolved().is_fallback());
    let index = fs::read_to_string(root.serve_dir().join("index.html")).unwrap();
    assert!(index.contains(GUI_NOT_AVAILABLE_MESSAGE));

    let dir = root.serve_dir().to_path_buf();
    drop(root);
    assert!(!dir.exists());
}

#[test]
fn test_relative_directory_resolves_absolute() {
    let root = ContentRoot::from_path(Path::new("src")).unwrap();
    match root.resolved() {
        ResolvedContent::Directory { path } => {
            assert!(path.is_absolute());
            assert!(path.ends_with("src"));
        }
        other => panic!("unexpected content: {other:?}"),
    }
    assert!(root.serve_dir().is_absolute());
}
