use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::ApiResult;

/// Reduce a server supplied filename to a single safe path component
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("").trim();
    if name.is_empty() || name == "." || name == ".." {
        "download".to_string()
    } else {
        name.to_string()
    }
}

/// First path in `dir` for `filename` that does not exist yet: `name.ext`, `name (1).ext`, ...
pub fn unique_destination(dir: &Path, filename: &str) -> PathBuf {
    let candidate = dir.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(filename);
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or(filename);
    let extension = path.extension().and_then(|s| s.to_str());

    let mut n = 1;
    loop {
        let name = match extension {
            Some(ext) => format!("{} ({}).{}", stem, n, ext),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(name);
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Save downloaded bytes under `filename` in `dir`.
///
/// The content is staged in a temporary file in the same directory and only
/// renamed into place once fully written; the staging file is removed on failure.
pub fn save_bytes(dir: &Path, filename: &str, content: &[u8]) -> ApiResult<PathBuf> {
    std::fs::create_dir_all(dir)?;

    let mut staged = tempfile::Builder::new().prefix(".filevault-").suffix(".part").tempfile_in(dir)?;
    staged.write_all(content)?;
    staged.flush()?;

    let destination = unique_destination(dir, &sanitize_filename(filename));
    staged.persist_noclobber(&destination).map_err(|e| e.error)?;

    debug!("Saved {} bytes to {}", content.len(), destination.display());
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_lose_their_directories() {
        assert_eq!(sanitize_filename("report.pdf"), "report.pdf");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\temp\\a.txt"), "a.txt");
        assert_eq!(sanitize_filename(""), "download");
        assert_eq!(sanitize_filename("dir/"), "download");
    }

    #[test]
    fn existing_files_are_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let first = save_bytes(dir.path(), "notes.txt", b"one").unwrap();
        let second = save_bytes(dir.path(), "notes.txt", b"two").unwrap();
        let third = save_bytes(dir.path(), "notes.txt", b"three").unwrap();

        assert_eq!(first, dir.path().join("notes.txt"));
        assert_eq!(second, dir.path().join("notes (1).txt"));
        assert_eq!(third, dir.path().join("notes (2).txt"));
        assert_eq!(std::fs::read(&first).unwrap(), b"one");
        assert_eq!(std::fs::read(&third).unwrap(), b"three");
    }

    #[test]
    fn no_staging_files_are_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        save_bytes(dir.path(), "archive", b"data").unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["archive".to_string()]);
    }
}
