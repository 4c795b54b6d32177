use chrono::{DateTime, Local};
use sort_tree_core::{hash_file, sanitize, sanitize_or, Fingerprint};
use std::io;
use std::path::{Path, PathBuf};

use crate::types::{Classification, UNCATEGORIZED, UNKNOWN_YEAR};

/// Stem used when an original filename has no usable characters left.
const FALLBACK_STEM: &str = "file";

/// What currently occupies a candidate target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Vacant,
    Holds(Fingerprint),
    /// Something that is not a regular file (a directory, a socket).
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Nothing there yet; safe to write.
    Free(PathBuf),
    /// The same content already sits at this path.
    Existing(PathBuf),
}

/// `dest_root/<year>/<category>/<label>`, every segment sanitized.
pub fn target_dir(dest_root: &Path, classification: &Classification) -> PathBuf {
    dest_root
        .join(sanitize_or(&classification.year, UNKNOWN_YEAR))
        .join(classification.category.as_str())
        .join(sanitize_or(&classification.label, UNCATEGORIZED))
}

/// Filename before collision handling.
///
/// Photos and videos become `<label>_<YYYYMMDD_HHMMSS>.<ext>`; everything
/// else keeps its sanitized original name.
pub fn base_filename(
    classification: &Classification,
    source_filename: &str,
    modified: Option<DateTime<Local>>,
) -> String {
    let (stem, ext) = split_name(source_filename);

    let stem = match modified {
        Some(at) if classification.category.is_media() => format!(
            "{}_{}",
            sanitize_or(&classification.label, UNCATEGORIZED),
            at.format("%Y%m%d_%H%M%S")
        ),
        _ => sanitize_or(stem, FALLBACK_STEM),
    };

    join_name(&stem, ext.map(sanitize).as_deref())
}

pub fn build_path(
    dest_root: &Path,
    classification: &Classification,
    source_filename: &str,
    modified: Option<DateTime<Local>>,
) -> (PathBuf, String) {
    (
        target_dir(dest_root, classification),
        base_filename(classification, source_filename, modified),
    )
}

/// `name.ext` -> `name_v{n}.ext`
pub fn versioned_name(base: &str, version: u32) -> String {
    let (stem, ext) = split_name(base);
    join_name(&format!("{}_v{}", stem, version), ext)
}

/// Probe `base`, then `base_v1`, `base_v2`, ... until a vacant slot or a slot
/// holding identical content turns up.
pub fn resolve_collision<P>(
    target_dir: &Path,
    base: &str,
    fingerprint: &Fingerprint,
    mut probe: P,
) -> io::Result<Resolution>
where
    P: FnMut(&Path) -> io::Result<Slot>,
{
    let mut version = 0u32;

    loop {
        let name = match version {
            0 => base.to_string(),
            n => versioned_name(base, n),
        };
        let path = target_dir.join(name);

        match probe(&path)? {
            Slot::Vacant => return Ok(Resolution::Free(path)),
            Slot::Holds(existing) if existing == *fingerprint => {
                return Ok(Resolution::Existing(path))
            }
            Slot::Holds(_) | Slot::Blocked => version += 1,
        }
    }
}

/// Looks at the destination filesystem.
pub fn probe_disk(path: &Path) -> io::Result<Slot> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_file() => hash_file(path).map(Slot::Holds),
        Ok(_) => Ok(Slot::Blocked),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Slot::Vacant),
        Err(e) => Err(e),
    }
}

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

fn join_name(stem: &str, ext: Option<&str>) -> String {
    match ext.filter(|e| !e.is_empty()) {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}
