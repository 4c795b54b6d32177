use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Returns true for dot entries, which also covers AppleDouble `._` files.
/// Checked on raw bytes so names that are not valid UTF-8 are caught too.
pub fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().as_encoded_bytes().starts_with(b".")
}

/// Regular files, plus symlinks that do not point at a directory. Links are
/// not followed during the walk; readers follow them, so a dangling link
/// surfaces as a read error instead of vanishing.
fn is_walkable_file(entry: &DirEntry) -> bool {
    let kind = entry.file_type();
    kind.is_file() || (kind.is_symlink() && !entry.path().is_dir())
}

/// Files under `root` in deterministic order (names sorted per
/// directory). Hidden entries are skipped and hidden directories are not
/// descended. When `exclude` is set, that subtree is never entered.
///
/// Walk errors (unreadable directories, vanished entries) are yielded so the
/// caller can record them instead of losing them.
pub fn walk_files<'a>(
    root: &Path,
    exclude: Option<&'a Path>,
) -> impl Iterator<Item = Result<PathBuf, walkdir::Error>> + 'a {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            e.depth() == 0 || !(is_hidden(e) || exclude.is_some_and(|ex| e.path() == ex))
        })
        .filter_map(|entry| match entry {
            Ok(e) if is_walkable_file(&e) => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(err) => Some(Err(err)),
        })
}
