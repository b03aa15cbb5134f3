//! Filesystem operations on already resolved paths.

use super::{OsError, OsResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub is_directory: bool,
    pub is_file: bool,
    pub is_symlink: bool,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    pub permissions: String,
}

fn not_found(path: &Path) -> OsError {
    OsError::NotFound(path.display().to_string())
}

async fn ensure_exists(path: &Path) -> OsResult<()> {
    if fs::symlink_metadata(path).await.is_err() {
        return Err(not_found(path));
    }
    Ok(())
}

pub async fn read(path: &Path) -> OsResult<String> {
    ensure_exists(path).await?;
    if path.is_dir() {
        return Err(OsError::invalid("path", "is a directory"));
    }
    Ok(fs::read_to_string(path).await?)
}

/// Writes through a sibling temp file and renames it into place.
pub async fn write_atomic(path: &Path, content: &str) -> OsResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| OsError::invalid("path", "has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| OsError::invalid("path", "has no file name"))?;
    if !parent.as_os_str().is_empty() {
        fs::create_dir_all(parent).await?;
    }

    let temp_path = parent.join(format!(
        ".{}.{}.tmp",
        file_name.to_string_lossy(),
        uuid::Uuid::new_v4().simple()
    ));

    let result = async {
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, path).await
    }
    .await;

    if let Err(e) = result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }
    Ok(())
}

pub async fn create_dir(path: &Path) -> OsResult<()> {
    fs::create_dir_all(path).await?;
    Ok(())
}

/// Entries prefixed with `[DIR]` or `[FILE]`, sorted by name.
pub async fn list_dir(path: &Path) -> OsResult<Vec<String>> {
    ensure_exists(path).await?;
    if !path.is_dir() {
        return Err(OsError::invalid("path", "is not a directory"));
    }

    let mut entries = fs::read_dir(path).await?;
    let mut items = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().to_string();
        let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
        items.push((name, is_dir));
    }
    items.sort();

    Ok(items
        .into_iter()
        .map(|(name, is_dir)| {
            if is_dir {
                format!("[DIR] {name}")
            } else {
                format!("[FILE] {name}")
            }
        })
        .collect())
}

pub async fn move_path(from: &Path, to: &Path) -> OsResult<()> {
    ensure_exists(from).await?;
    if fs::symlink_metadata(to).await.is_ok() {
        return Err(OsError::invalid(
            "destination",
            format!("{} already exists", to.display()),
        ));
    }
    fs::rename(from, to).await?;
    Ok(())
}

/// Recursive, case-insensitive match of `pattern` against entry names.
/// Symlinked directories are reported but not descended into.
pub async fn search(root: &Path, pattern: &str) -> OsResult<Vec<PathBuf>> {
    ensure_exists(root).await?;
    let needle = pattern.to_lowercase();
    let mut matches = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", dir.display(), e);
                continue;
            }
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry
                .file_name()
                .to_string_lossy()
                .to_lowercase()
                .contains(&needle)
            {
                matches.push(path.clone());
            }
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                pending.push(path);
            }
        }
    }

    matches.sort();
    Ok(matches)
}

fn timestamp(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

#[cfg(unix)]
fn mode_string(metadata: &std::fs::Metadata) -> String {
    use std::os::unix::fs::PermissionsExt;
    format!("{:o}", metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_string(metadata: &std::fs::Metadata) -> String {
    if metadata.permissions().readonly() {
        "readonly".to_string()
    } else {
        "readwrite".to_string()
    }
}

pub async fn info(path: &Path) -> OsResult<FileInfo> {
    let link_meta = fs::symlink_metadata(path)
        .await
        .map_err(|_| not_found(path))?;
    let metadata = fs::metadata(path).await.unwrap_or_else(|_| link_meta.clone());

    Ok(FileInfo {
        path: path.display().to_string(),
        size: metadata.len(),
        is_directory: metadata.is_dir(),
        is_file: metadata.is_file(),
        is_symlink: link_meta.file_type().is_symlink(),
        created: timestamp(metadata.created()),
        modified: timestamp(metadata.modified()),
        accessed: timestamp(metadata.accessed()),
        permissions: mode_string(&metadata),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("note.txt");
        write_atomic(&path, "hello").await.unwrap();
        assert_eq!(read(&path).await.unwrap(), "hello");

        write_atomic(&path, "replaced").await.unwrap();
        assert_eq!(read(&path).await.unwrap(), "replaced");

        // no temp files left behind
        let names = list_dir(path.parent().unwrap()).await.unwrap();
        assert_eq!(names, vec!["[FILE] note.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read(&dir.path().join("missing.txt")).await;
        assert!(matches!(result, Err(OsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_dir_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        create_dir(&dir.path().join("sub")).await.unwrap();
        write_atomic(&dir.path().join("a.txt"), "x").await.unwrap();

        let listing = list_dir(dir.path()).await.unwrap();
        assert_eq!(listing, vec!["[FILE] a.txt", "[DIR] sub"]);
    }

    #[tokio::test]
    async fn test_move_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        write_atomic(&a, "a").await.unwrap();
        write_atomic(&b, "b").await.unwrap();

        assert!(move_path(&a, &b).await.is_err());

        let c = dir.path().join("c.txt");
        move_path(&a, &c).await.unwrap();
        assert_eq!(read(&c).await.unwrap(), "a");
    }

    #[tokio::test]
    async fn test_search_is_recursive_and_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(&dir.path().join("Report.TXT"), "").await.unwrap();
        write_atomic(&dir.path().join("deep").join("old_report.md"), "")
            .await
            .unwrap();
        write_atomic(&dir.path().join("other.rs"), "").await.unwrap();

        let found = search(dir.path(), "report").await.unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        write_atomic(&path, "12345").await.unwrap();

        let info = info(&path).await.unwrap();
        assert_eq!(info.size, 5);
        assert!(info.is_file);
        assert!(!info.is_directory);
    }
}
