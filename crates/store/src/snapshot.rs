use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use zixuan_core::store::error::StoreError;
use zixuan_core::store::port::{CatalogSnapshot, SnapshotStore};

/// # Summary
/// `SnapshotStore` 的 JSON 文件实现。
///
/// # Invariants
/// * 快照以美化后的 UTF-8 JSON 保存在单个文件中。
/// * 先写入同目录临时文件再重命名，读取方不会看到半写入内容。
pub struct JsonSnapshotStore {
    path: PathBuf,
}

impl JsonSnapshotStore {
    /// # Summary
    /// 在数据根目录下创建快照存储。
    ///
    /// # Arguments
    /// * `file_name` - 快照文件名，如 `favorite.json`。
    pub fn new(file_name: &str) -> Result<Self, StoreError> {
        Self::with_path(crate::config::snapshot_path(file_name))
    }

    /// 使用指定路径创建快照存储，父目录不存在时自动创建。
    pub fn with_path(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::InitError(e.to_string()))?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for JsonSnapshotStore {
    async fn save(&self, snapshot: &CatalogSnapshot) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| StoreError::Serialize(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;

        debug!(
            "分组快照已写入 {} ({} 个分组)",
            self.path.display(),
            snapshot.groups.len()
        );
        Ok(())
    }

    async fn load(&self) -> Result<Option<CatalogSnapshot>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::Io(e.to_string())),
        };

        let snapshot =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialize(e.to_string()))?;
        Ok(Some(snapshot))
    }
}
