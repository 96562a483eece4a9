use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// Returns the sibling path used while a file is being written
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");

    path.with_file_name(name)
}

/// Write bytes to the temporary sibling of `path` and flush them to disk.
///
/// Nothing is visible at `path` until [`commit`] is called.
pub fn write_temp(path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = temp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;

    Ok(tmp)
}

/// Move a file previously staged with [`write_temp`] into place
pub fn commit(tmp: &Path, path: &Path) -> io::Result<()> {
    fs::rename(tmp, path)
}

/// Remove a staged file, ignoring files that are already gone
pub fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("Unable to remove {}: {}", tmp.display(), e);
        }
    }
}

/// Return the first path in the list that does not exist
pub fn first_missing<'a>(paths: &[&'a Path]) -> Option<&'a Path> {
    paths.iter().copied().find(|p| !p.is_file())
}
