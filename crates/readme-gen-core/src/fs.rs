use std::ffi::OsString;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

/// Replaces the file at `path` with `content` through a temp file and a rename,
/// so readers never observe a half-written document. With `backup`, an
/// existing file is first copied to `<path>.bak`.
///
/// A symlinked `path` is written through: the link stays and its target
/// receives the new content. Permissions of an existing target are kept.
pub fn write_atomic(path: &Path, content: &str, backup: bool) -> io::Result<()> {
    let target = resolve_target(path)?;
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let existing_permissions = match fs::metadata(&target) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(err) => return Err(err),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    if let Some(permissions) = existing_permissions {
        tmp.as_file().set_permissions(permissions)?;
    }
    tmp.as_file().sync_all()?;

    if backup && target.exists() {
        fs::copy(&target, backup_path(path))?;
    }

    tmp.persist(&target).map_err(|err| err.error)?;
    Ok(())
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

/// Follows `path` to the regular file it names. Dangling links resolve to
/// where the link points so the write creates the target.
fn resolve_target(path: &Path) -> io::Result<PathBuf> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => match fs::canonicalize(path) {
            Ok(resolved) => Ok(resolved),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                let link = fs::read_link(path)?;
                let base = path.parent().unwrap_or_else(|| Path::new(""));
                Ok(base.join(link))
            }
            Err(err) => Err(err),
        },
        _ => Ok(path.to_path_buf()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn replaces_content_and_keeps_backup() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("README.md");
        fs::write(&file_path, "old").unwrap();

        write_atomic(&file_path, "new", true).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "new");
        assert_eq!(
            fs::read_to_string(dir.path().join("README.md.bak")).unwrap(),
            "old"
        );
        assert_eq!(entries(dir.path()), vec!["README.md", "README.md.bak"]);
    }

    #[test]
    fn backup_is_skipped_for_new_files() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("README.md");

        write_atomic(&file_path, "fresh", true).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "fresh");
        assert_eq!(entries(dir.path()), vec!["README.md"]);
    }

    #[test]
    fn fails_when_parent_is_missing() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("missing").join("README.md");

        assert!(write_atomic(&file_path, "content", false).is_err());
        assert!(!file_path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn keeps_existing_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let file_path = dir.path().join("README.md");
        fs::write(&file_path, "old").unwrap();
        fs::set_permissions(&file_path, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&file_path, "new", false).unwrap();

        let mode = fs::metadata(&file_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o640);
    }

    #[cfg(unix)]
    #[test]
    fn writes_through_dangling_symlink() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        let link = dir.path().join("README.md");
        std::os::unix::fs::symlink("docs/README.md", &link).unwrap();

        write_atomic(&link, "created", false).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(
            fs::read_to_string(dir.path().join("docs").join("README.md")).unwrap(),
            "created"
        );
    }
}
