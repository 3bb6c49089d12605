use std::path::{Path, PathBuf};

use uuid::Uuid;

const ALLOWED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "pdf", "txt", "md", "zip", "mp4",
];

pub fn get_uploads_dir(configured: &Path) -> std::io::Result<PathBuf> {
    if configured.is_absolute() {
        return Ok(configured.to_path_buf());
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(configured))
}

/// Lowercased extension of `filename` if it is on the allow list.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Stores `bytes` under `<root>/<category>/` with a generated name and returns
/// the path relative to `root`, using `/` separators.
pub async fn store_upload(
    root: &Path,
    category: &str,
    filename: &str,
    bytes: &[u8],
) -> std::io::Result<String> {
    let ext = allowed_extension(filename).ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "file type is not allowed")
    })?;

    let dir = get_uploads_dir(root)?.join(category);
    tokio::fs::create_dir_all(&dir).await?;

    let name = format!("{}.{ext}", Uuid::new_v4());
    tokio::fs::write(dir.join(&name), bytes).await?;
    tracing::debug!("stored upload {category}/{name} ({} bytes)", bytes.len());

    Ok(format!("{category}/{name}"))
}

/// Removes a file written by [`store_upload`] whose owner could not be updated.
pub async fn discard_upload(root: &Path, relative: &str) {
    let removed = match get_uploads_dir(root) {
        Ok(dir) => tokio::fs::remove_file(dir.join(relative)).await,
        Err(e) => Err(e),
    };
    if let Err(e) = removed {
        tracing::warn!("could not discard upload {relative}: {e}");
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_known_extensions_pass() {
        assert_eq!(allowed_extension("cover.PNG").as_deref(), Some("png"));
        assert_eq!(allowed_extension("notes.pdf").as_deref(), Some("pdf"));
        assert_eq!(allowed_extension("script.sh"), None);
        assert_eq!(allowed_extension("no_extension"), None);
    }

    #[tokio::test]
    async fn upload_lands_under_category() {
        let dir = tempfile::tempdir().unwrap();
        let rel = store_upload(dir.path(), "course", "cover.jpg", b"jpeg")
            .await
            .unwrap();

        assert!(rel.starts_with("course/"));
        assert!(rel.ends_with(".jpg"));
        let stored = std::fs::read(dir.path().join(&rel)).unwrap();
        assert_eq!(stored, b"jpeg");
    }

    #[tokio::test]
    async fn discarded_upload_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let rel = store_upload(dir.path(), "content", "slides.pdf", b"%PDF")
            .await
            .unwrap();

        discard_upload(dir.path(), &rel).await;
        assert!(!dir.path().join(&rel).exists());

        // a second discard only logs
        discard_upload(dir.path(), &rel).await;
    }

    #[tokio::test]
    async fn disallowed_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = store_upload(dir.path(), "course", "evil.exe", b"MZ")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidInput);
    }
}
