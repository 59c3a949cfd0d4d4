use std::path::{Path, PathBuf};

/// Directory, relative to the working directory, that course images are served from.
pub const UPLOADS_DIR: &str = "uploads";

/// Creates `root/uploads` when missing and returns it.
pub fn ensure_uploads_dir(root: &Path) -> std::io::Result<PathBuf> {
    let dir = root.join(UPLOADS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn creates_missing_dir_once() {
        let root = tempfile::tempdir().unwrap();
        let dir = ensure_uploads_dir(root.path()).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, root.path().join("uploads"));
        // second call is a no-op
        ensure_uploads_dir(root.path()).unwrap();
    }
}
