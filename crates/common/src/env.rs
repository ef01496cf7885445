//! Startup checks for the directories the HTTP server reads and writes.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// What `ensure_env` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeDirs {
    pub frontend_index: Option<PathBuf>,
    pub data_dir: PathBuf,
}

/// The frontend is optional (the API works without it); the data directory is created when missing.
pub async fn ensure_env(frontend_dir: &str, data_dir: &str) -> anyhow::Result<RuntimeDirs> {
    let index = Path::new(frontend_dir).join("index.html");
    let frontend_index = match tokio::fs::metadata(&index).await {
        Ok(m) if m.is_file() => Some(index),
        _ => {
            warn!(%frontend_dir, "frontend index.html not found; only the JSON API will be served");
            None
        }
    };

    let data_dir = PathBuf::from(data_dir);
    if tokio::fs::metadata(&data_dir).await.is_err() {
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create data dir {}: {e}", data_dir.display()))?;
        info!(data_dir = %data_dir.display(), "created data directory");
    }
    Ok(RuntimeDirs { frontend_index, data_dir })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_data_dir_and_tolerates_missing_frontend() {
        let root = std::env::temp_dir().join(format!("homeservice-env-{}", std::process::id()));
        let data = root.join("data");
        let dirs = ensure_env(root.join("no-frontend").to_str().unwrap(), data.to_str().unwrap()).await.unwrap();
        assert!(dirs.frontend_index.is_none());
        assert!(tokio::fs::metadata(&data).await.unwrap().is_dir());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
