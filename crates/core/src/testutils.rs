use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Create a source tree with a mix of media, code, hidden entries and
/// macOS metadata files.
pub fn create_test_tree() -> TempDir {
    let dir = TempDir::new().unwrap();

    fs::create_dir(dir.path().join("holiday")).unwrap();
    write_file(dir.path().join("holiday"), "beach.jpg", b"jpeg bytes");
    write_file(dir.path().join("holiday"), "._beach.jpg", b"apple double");
    write_file(dir.path().join("holiday"), ".DS_Store", b"finder");

    fs::create_dir(dir.path().join("scripts")).unwrap();
    write_file(dir.path().join("scripts"), "build.py", b"print('hi')");

    fs::create_dir(dir.path().join(".git")).unwrap();
    write_file(dir.path().join(".git"), "config", b"[core]");

    dir
}

fn write_file(dir: impl AsRef<Path>, name: &str, content: &[u8]) {
    fs::write(dir.as_ref().join(name), content).unwrap();
}
