//! Flat-directory photo storage.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Directory mode: owner may write, everyone else may only read.
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;
#[cfg(unix)]
const FILE_MODE: u32 = 0o644;

/// Stores uploaded photos under a single directory with generated names.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    dir: PathBuf,
}

impl PhotoStore {
    /// Creates a store rooted at `dir`. Nothing is created until the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The upload directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the upload directory and its parents if missing.
    ///
    /// Succeeds when the directory already exists, including when a
    /// concurrent request created it first.
    pub fn ensure_dir(&self) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(DIR_MODE);
        }
        builder.create(&self.dir)
    }

    /// Writes `bytes` under a fresh unique name and returns the final path.
    ///
    /// The data is staged in a temporary file in the same directory and
    /// only moved into place once fully written and synced; the final
    /// path never holds a partial file and an existing file is never
    /// replaced.
    pub fn persist(&self, bytes: &[u8], extension: &str) -> io::Result<PathBuf> {
        let target = self.dir.join(generate_name(extension));

        let mut staged = tempfile::Builder::new()
            .prefix(".upload-")
            .suffix(".part")
            .tempfile_in(&self.dir)?;
        staged.write_all(bytes)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            staged
                .as_file()
                .set_permissions(fs::Permissions::from_mode(FILE_MODE))?;
        }
        staged.as_file().sync_all()?;
        staged.persist_noclobber(&target).map_err(|e| e.error)?;

        tracing::debug!(path = %target.display(), bytes = bytes.len(), "Photo persisted");
        Ok(target)
    }
}

/// `img_<uuid>.<ext>`; the uuid makes collisions practically impossible.
fn generate_name(extension: &str) -> String {
    let id = Uuid::new_v4().simple();
    if extension.is_empty() {
        format!("img_{id}")
    } else {
        format!("img_{id}.{extension}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ensure_dir_creates_parents_and_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path().join("a/b/uploads"));

        store.ensure_dir().unwrap();
        store.ensure_dir().unwrap();
        assert!(store.dir().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_dir_is_not_world_writable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path().join("uploads"));
        store.ensure_dir().unwrap();

        let mode = fs::metadata(store.dir()).unwrap().permissions().mode();
        assert_eq!(mode & 0o022, 0);
    }

    #[test]
    fn test_persist_writes_exact_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path());

        let path = store.persist(b"payload", "png").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"payload");
        assert_eq!(path.extension().unwrap(), "png");
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("img_"));
    }

    #[test]
    fn test_persist_leaves_no_staging_files() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path());
        store.persist(b"one", "jpg").unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 1);
        assert!(!names[0].ends_with(".part"));
    }

    #[test]
    fn test_persist_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let store = PhotoStore::new(tmp.path().join("missing"));
        assert!(store.persist(b"x", "jpg").is_err());
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_generated_names_are_unique() {
        let names: HashSet<String> = (0..1000).map(|_| generate_name("jpg")).collect();
        assert_eq!(names.len(), 1000);
        assert_eq!(generate_name("").matches('.').count(), 0);
    }
}
