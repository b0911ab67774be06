//! ZIP extraction, generalized from `vx-installer::formats::zip::ZipHandler`.

use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use std::path::Path;

/// Extracts `archive_path` (a `.zip`) into `target_dir`, creating it if needed. Entries with
/// no enclosed (non-traversal) name are skipped rather than failing the whole extraction.
/// Reports per-entry progress through `progress` when given.
pub async fn extract_zip(archive_path: &Path, target_dir: &Path, progress: Option<&dyn ProgressReporter>) -> Result<()> {
    std::fs::create_dir_all(target_dir)?;
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::extraction_failed(archive_path, format!("failed to open archive: {e}")))?;
    let total = archive.len() as u64;
    if let Some(progress) = progress {
        progress.start(&format!("Extracting {total} files"), Some(total)).await;
    }

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::extraction_failed(archive_path, format!("failed to access entry {i}: {e}")))?;

        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                if let Some(progress) = progress {
                    progress.update(i as u64 + 1).await;
                }
                continue;
            }
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&entry_path)?;
        } else {
            if let Some(parent) = entry_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut out = std::fs::File::create(&entry_path)?;
            std::io::copy(&mut entry, &mut out)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if entry.unix_mode().unwrap_or(0) & 0o111 != 0 {
                    let mut perms = std::fs::metadata(&entry_path)?.permissions();
                    perms.set_mode(perms.mode() | 0o111);
                    std::fs::set_permissions(&entry_path, perms)?;
                }
            }
        }
        if let Some(progress) = progress {
            progress.update(i as u64 + 1).await;
        }
    }

    if let Some(progress) = progress {
        progress.finish("Extraction completed").await;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn make_test_zip(path: &Path) {
        let file = std::fs::File::create(path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options: zip::write::FileOptions<()> = zip::write::FileOptions::default();
        writer.start_file("hello.txt", options).unwrap();
        writer.write_all(b"hello world").unwrap();
        writer.start_file("nested/inner.txt", options).unwrap();
        writer.write_all(b"nested contents").unwrap();
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn extracts_files_and_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("test.zip");
        make_test_zip(&archive_path);

        let target = dir.path().join("out");
        extract_zip(&archive_path, &target, None).await.unwrap();

        assert_eq!(std::fs::read_to_string(target.join("hello.txt")).unwrap(), "hello world");
        assert_eq!(
            std::fs::read_to_string(target.join("nested/inner.txt")).unwrap(),
            "nested contents"
        );
    }

    #[tokio::test]
    async fn rejects_missing_archive_as_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = extract_zip(&dir.path().join("missing.zip"), &dir.path().join("out"), None).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
