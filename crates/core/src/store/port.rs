use super::error::StoreError;
use crate::favorite::entity::{Catalog, Group};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// # Summary
/// 分组目录的离线快照，记录最近一次成功拉取的结果。
///
/// # Invariants
/// - `groups` 保持拉取时终端返回的顺序。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    // 快照写入时间
    pub saved_at: DateTime<Utc>,
    // 全量分组
    pub groups: Vec<Group>,
}

impl CatalogSnapshot {
    pub fn capture(catalog: &Catalog) -> Self {
        Self {
            saved_at: Utc::now(),
            groups: catalog.iter().cloned().collect(),
        }
    }

    pub fn into_catalog(self) -> Catalog {
        Catalog::new(self.groups)
    }
}

/// # Summary
/// 分组快照存储接口。
///
/// # Invariants
/// - 快照仅作为终端不可用时的降级数据源，不参与正常查询。
/// - 实现者应保证写入是整体替换，读取不会看到半写入状态。
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// # Summary
    /// 覆盖保存快照。
    ///
    /// # Arguments
    /// * `snapshot`: 待保存的快照。
    ///
    /// # Returns
    /// 成功返回 Ok，失败返回 `StoreError`。
    async fn save(&self, snapshot: &CatalogSnapshot) -> Result<(), StoreError>;

    /// # Summary
    /// 读取最近一次保存的快照。
    ///
    /// # Returns
    /// 从未保存过时返回 `None`。
    async fn load(&self) -> Result<Option<CatalogSnapshot>, StoreError>;
}
