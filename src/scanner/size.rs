use std::path::Path;
use walkdir::WalkDir;

/// Sums the length of every regular file under `path`.
///
/// Symlinks are never followed and special files count for nothing. Entries
/// that cannot be read are logged and skipped, so the result is a partial
/// sum rather than an error.
pub fn dir_size(path: &Path) -> u64 {
    if path.symlink_metadata().is_err() {
        return 0;
    }

    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| match entry.metadata() {
            Ok(metadata) => Some(metadata.len()),
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "cannot stat file");
                None
            }
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_missing_path_is_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(dir_size(&dir.path().join("nope")), 0);
    }

    #[test]
    fn test_nested_files_are_summed() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("top.txt"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("a/one.txt"), vec![0u8; 20]).unwrap();
        fs::write(dir.path().join("a/b/c/deep.txt"), vec![0u8; 30]).unwrap();

        assert_eq!(dir_size(dir.path()), 60);
    }

    #[test]
    fn test_single_file_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.bin");
        fs::write(&file, vec![1u8; 7]).unwrap();
        assert_eq!(dir_size(&file), 7);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_followed() {
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("big.bin"), vec![0u8; 1000]).unwrap();

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("small.bin"), vec![0u8; 5]).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        std::os::unix::fs::symlink(
            outside.path().join("big.bin"),
            dir.path().join("file-link"),
        )
        .unwrap();

        assert_eq!(dir_size(dir.path()), 5);
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_gives_partial_sum() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(dir.path().join("open.bin"), vec![0u8; 10]).unwrap();
        fs::write(locked.join("hidden.bin"), vec![0u8; 20]).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let size = dir_size(dir.path());
        // Privileged users can still list the directory.
        let expected = if fs::read_dir(&locked).is_err() { 10 } else { 30 };
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(size, expected);
    }
}
