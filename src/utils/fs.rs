//! Filesystem helpers.

use std::io;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Replace `path` with `bytes` so that readers never observe a partial file.
///
/// - Write to a uniquely named temp file in the destination directory
/// - fsync the temp file
/// - Rename it over the destination (atomic on POSIX filesystems)
/// - Best-effort fsync the parent directory so the rename itself is durable
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir).await?;

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file");
    let tmp_path = dir.join(format!(".{}.tmp.{}", file_name, Uuid::new_v4().simple()));

    if let Err(err) = write_synced(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err);
    }

    if let Err(err) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(err);
    }

    if let Ok(dir_handle) = tokio::fs::File::open(dir).await {
        let _ = dir_handle.sync_all().await;
    }

    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await
}
