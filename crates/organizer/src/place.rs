use sort_tree_core::{hash_file, Fingerprint};
use std::fs::{self, File, FileTimes};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{Error, IoContext, Result};

/// Copy `source` to `target` without ever exposing a half-written file.
///
/// Bytes go to a temp file next to `target`, permissions and timestamps are
/// carried over, and the temp file is renamed into place only if `target`
/// still does not exist. Returns the number of bytes copied.
pub fn copy_file(source: &Path, target: &Path) -> Result<u64> {
    let dir = target.parent().ok_or_else(|| Error::Io {
        path: target.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidInput, "target has no parent"),
    })?;

    let meta = fs::metadata(source).at(source)?;
    let mut input = File::open(source).at(source)?;
    let mut tmp = NamedTempFile::new_in(dir).at(dir)?;

    let size = io::copy(&mut input, tmp.as_file_mut()).at(target)?;
    tmp.as_file().sync_all().at(target)?;
    fs::set_permissions(tmp.path(), meta.permissions()).at(target)?;

    let times = FileTimes::new();
    let times = match meta.accessed() {
        Ok(at) => times.set_accessed(at),
        Err(_) => times,
    };
    let times = match meta.modified() {
        Ok(at) => times.set_modified(at),
        Err(_) => times,
    };
    tmp.as_file().set_times(times).at(target)?;

    tmp.persist_noclobber(target).map_err(|e| Error::Io {
        path: target.to_path_buf(),
        source: e.error,
    })?;

    Ok(size)
}

/// Move `source` to `target` without replacing anything already at `target`.
///
/// Tries a hard link followed by unlinking the source, which never clobbers.
/// When linking is not possible (different filesystems, a symlinked source,
/// no hard link support) it falls back to `copy_verify_remove`.
pub fn move_file(source: &Path, target: &Path, fingerprint: &Fingerprint) -> Result<u64> {
    let meta = fs::symlink_metadata(source).at(source)?;

    if !meta.file_type().is_symlink() {
        match fs::hard_link(source, target) {
            Ok(()) => {
                fs::remove_file(source).at(source)?;
                return Ok(meta.len());
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(Error::Io {
                    path: target.to_path_buf(),
                    source: e,
                })
            }
            Err(e) => {
                tracing::debug!(
                    source = %source.display(),
                    target = %target.display(),
                    error = %e,
                    "hard link failed, copying instead"
                );
            }
        }
    }

    copy_verify_remove(source, target, fingerprint)
}

/// Copy, check the copy hashes to `fingerprint`, then delete the source.
///
/// On a mismatch the copy is removed and the source kept. If the source
/// cannot be deleted after a good copy, both remain and the error is returned.
pub fn copy_verify_remove(source: &Path, target: &Path, fingerprint: &Fingerprint) -> Result<u64> {
    let copied = copy_file(source, target)?;

    if hash_file(target).at(target)? != *fingerprint {
        let _ = fs::remove_file(target);
        return Err(Error::Verify {
            path: target.to_path_buf(),
        });
    }

    fs::remove_file(source).at(source)?;
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sort_tree_core::hash_content;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    #[test]
    fn copy_preserves_content_and_mtime() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&source, b"hello").unwrap();

        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&source)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        let size = copy_file(&source, &target).unwrap();

        assert_eq!(size, 5);
        assert_eq!(fs::read(&target).unwrap(), b"hello");
        assert_eq!(fs::metadata(&target).unwrap().modified().unwrap(), mtime);
        assert!(source.exists());
    }

    #[test]
    fn copy_never_clobbers() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&target, b"old").unwrap();

        assert!(copy_file(&source, &target).is_err());
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn copy_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let out = dir.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(&source, b"data").unwrap();

        copy_file(&source, &out.join("a.txt")).unwrap();

        let names: Vec<_> = fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("a.txt")]);
    }

    #[test]
    fn move_relocates_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&source, b"move me").unwrap();

        let size = move_file(&source, &target, &hash_content(b"move me")).unwrap();

        assert_eq!(size, 7);
        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"move me");
    }

    #[test]
    fn move_never_clobbers() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&source, b"new").unwrap();
        fs::write(&target, b"someone else's").unwrap();

        assert!(move_file(&source, &target, &hash_content(b"new")).is_err());
        assert_eq!(fs::read(&target).unwrap(), b"someone else's");
        assert_eq!(fs::read(&source).unwrap(), b"new");
    }

    #[test]
    fn verified_copy_removes_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&source, b"carry me").unwrap();

        let size = copy_verify_remove(&source, &target, &hash_content(b"carry me")).unwrap();

        assert_eq!(size, 8);
        assert!(!source.exists());
        assert_eq!(fs::read(&target).unwrap(), b"carry me");
    }

    #[test]
    fn fingerprint_mismatch_keeps_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&source, b"changed since hashing").unwrap();

        let result = copy_verify_remove(&source, &target, &hash_content(b"as hashed"));

        assert!(matches!(result, Err(Error::Verify { .. })));
        assert_eq!(fs::read(&source).unwrap(), b"changed since hashing");
        assert!(!target.exists());
    }

    #[cfg(unix)]
    #[test]
    fn moving_a_symlink_places_its_content() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real.txt");
        let link = dir.path().join("link.txt");
        let target = dir.path().join("placed.txt");
        fs::write(&real, b"linked bytes").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        move_file(&link, &target, &hash_content(b"linked bytes")).unwrap();

        assert!(!fs::symlink_metadata(&target).unwrap().file_type().is_symlink());
        assert_eq!(fs::read(&target).unwrap(), b"linked bytes");
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(real.exists());
    }

    #[test]
    fn move_of_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let result = move_file(
            &dir.path().join("gone"),
            &dir.path().join("b"),
            &hash_content(b""),
        );
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
