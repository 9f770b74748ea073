use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zixuan_core::favorite::entity::{Catalog, Group, GroupId, Item, Share, ShareExpiry};
use zixuan_core::favorite::error::{FavoriteError, TerminalError};
use zixuan_core::favorite::port::TerminalPort;
use zixuan_core::store::port::{CatalogSnapshot, SnapshotStore};

/// # Summary
/// 门面运行参数。
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    // 单次终端往返的超时
    pub call_timeout: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(10),
        }
    }
}

/// 分组目录的数据来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    // 刚从终端拉取
    Live,
    // 终端不可用时读取的本地快照
    Snapshot { saved_at: DateTime<Utc> },
}

/// # Summary
/// 解析字符串形式的分享有效期 (毫秒)。
///
/// # Returns
/// 非数字或超出 i64 范围时返回 `FavoriteError::Validation`；负数在 `share_group` 中拒绝。
pub fn parse_expire_ms(raw: &str) -> Result<i64, FavoriteError> {
    raw.trim().parse::<i64>().map_err(|_| {
        FavoriteError::Validation(format!("分享有效期必须是非负整数毫秒: '{}'", raw))
    })
}

/// # Summary
/// 自选股分组门面 (Facade)，系统的应用服务层。
/// 编译期只依赖 `zixuan-core` 中的 Trait，终端与快照存储的实现通过构造函数注入。
///
/// # Invariants
/// - 实例存在即代表会话已建立；`close` 之后所有操作返回 `FavoriteError::Closed`。
/// - 会话关闭恰好执行一次：显式 `close` 或实例析构时。
/// - 所有终端往返通过 `gate` 串行化，解析、变更、刷新在同一把锁内完成。
/// - 不跨调用缓存目录，每次操作都基于新拉取的目录解析分组。
pub struct FavoriteService {
    // 外部终端
    terminal: Arc<dyn TerminalPort>,
    // 离线快照 (可选)
    snapshots: Option<Arc<dyn SnapshotStore>>,
    options: ServiceOptions,
    gate: Mutex<()>,
    closed: AtomicBool,
}

impl FavoriteService {
    /// # Summary
    /// 建立终端会话并创建门面。
    ///
    /// # Logic
    /// 1. 在超时限制内调用 `TerminalPort::open`。
    /// 2. 任何失败 (含超时) 统一映射为 `FavoriteError::Connection`。
    ///
    /// # Arguments
    /// * `terminal` - 终端接口的具体实现。
    /// * `snapshots` - 快照存储，`None` 表示不写快照。
    /// * `options` - 运行参数。
    ///
    /// # Returns
    /// * `Arc<Self>` - 可在多个请求间共享的门面实例。
    pub async fn open(
        terminal: Arc<dyn TerminalPort>,
        snapshots: Option<Arc<dyn SnapshotStore>>,
        options: ServiceOptions,
    ) -> Result<Arc<Self>, FavoriteError> {
        match tokio::time::timeout(options.call_timeout, terminal.open()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(FavoriteError::Connection(e.to_string())),
            Err(_) => {
                return Err(FavoriteError::Connection(format!(
                    "终端在 {:?} 内未响应",
                    options.call_timeout
                )));
            }
        }

        info!("自选股服务已启动");
        Ok(Arc::new(Self {
            terminal,
            snapshots,
            options,
            gate: Mutex::new(()),
            closed: AtomicBool::new(false),
        }))
    }

    /// 关闭终端会话，重复调用无副作用。
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.terminal.close();
            info!("自选股服务已关闭");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), FavoriteError> {
        if self.is_closed() {
            Err(FavoriteError::Closed)
        } else {
            Ok(())
        }
    }

    // 为一次终端往返加上超时
    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, TerminalError>>,
    ) -> Result<T, FavoriteError> {
        match tokio::time::timeout(self.options.call_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(TerminalError::Timeout(self.options.call_timeout).into()),
        }
    }

    /// # Summary
    /// 拉取全量目录并写入快照 (调用方需持有 `gate`)。
    ///
    /// # Logic
    /// 1. 调用终端拉取所有分组并构建目录。
    /// 2. 若配置了快照存储则覆盖保存，写入失败只记录告警。
    async fn fetch_catalog(&self) -> Result<Catalog, FavoriteError> {
        let groups = self.call(self.terminal.fetch_groups()).await?;
        let catalog = Catalog::new(groups);

        if let Some(store) = &self.snapshots {
            if let Err(e) = store.save(&CatalogSnapshot::capture(&catalog)).await {
                warn!("保存分组快照失败: {}", e);
            }
        }
        Ok(catalog)
    }

    fn resolve(catalog: &Catalog, identifier: &str) -> Result<Group, FavoriteError> {
        catalog
            .resolve(identifier)
            .cloned()
            .ok_or_else(|| FavoriteError::NotFound(format!("分组 '{}'", identifier)))
    }

    // 变更成功后刷新目录；刷新失败时退回本地推算的结果
    async fn refreshed_group(&self, id: &GroupId, fallback: Group) -> Group {
        match self.fetch_catalog().await {
            Ok(catalog) => catalog.get_by_id(id).cloned().unwrap_or(fallback),
            Err(e) => {
                warn!("变更后刷新分组失败，使用本地结果: {}", e);
                fallback
            }
        }
    }

    fn parse_stock(stock: &str) -> Result<Item, FavoriteError> {
        stock.parse::<Item>().map_err(FavoriteError::Validation)
    }

    /// # Summary
    /// 获取所有分组。每次调用都会完整拉取，不返回缓存数据。
    pub async fn get_all_groups(&self) -> Result<Catalog, FavoriteError> {
        self.ensure_open()?;
        let _guard = self.gate.lock().await;
        self.fetch_catalog().await
    }

    /// # Summary
    /// 获取所有分组，终端失败时降级到本地快照。
    ///
    /// # Logic
    /// 1. 优先从终端拉取。
    /// 2. 仅当失败原因是终端错误且存在快照时返回快照，并标注快照时间。
    /// 3. 其它情况返回原始错误。
    pub async fn get_all_groups_or_snapshot(
        &self,
    ) -> Result<(Catalog, CatalogSource), FavoriteError> {
        self.ensure_open()?;
        let _guard = self.gate.lock().await;

        let err = match self.fetch_catalog().await {
            Ok(catalog) => return Ok((catalog, CatalogSource::Live)),
            Err(e @ FavoriteError::Upstream(_)) => e,
            Err(e) => return Err(e),
        };

        let Some(store) = &self.snapshots else {
            return Err(err);
        };
        match store.load().await {
            Ok(Some(snapshot)) => {
                warn!("终端不可用 ({})，使用 {} 的本地快照", err, snapshot.saved_at);
                let saved_at = snapshot.saved_at;
                Ok((snapshot.into_catalog(), CatalogSource::Snapshot { saved_at }))
            }
            Ok(None) => Err(err),
            Err(e) => {
                warn!("读取分组快照失败: {}", e);
                Err(err)
            }
        }
    }

    /// 按名称或 ID 获取单个分组。
    pub async fn get_group(&self, identifier: &str) -> Result<Group, FavoriteError> {
        let catalog = self.get_all_groups().await?;
        Self::resolve(&catalog, identifier)
    }

    /// # Summary
    /// 向分组添加标的。
    ///
    /// # Logic
    /// 1. 校验 `code.market` 格式。
    /// 2. 拉取目录并解析分组 (名称优先，其次 ID)。
    /// 3. 提交终端，重复添加等语义由终端决定。
    /// 4. 刷新目录并返回分组的新快照。
    ///
    /// # Arguments
    /// * `group` - 分组名称或 ID。
    /// * `stock` - 形如 `600519.SH` 的标的。
    pub async fn add_item_to_group(&self, group: &str, stock: &str) -> Result<Group, FavoriteError> {
        let item = Self::parse_stock(stock)?;
        self.ensure_open()?;
        let _guard = self.gate.lock().await;

        let target = Self::resolve(&self.fetch_catalog().await?, group)?;
        self.call(self.terminal.add_item(&target.group_id, &item)).await?;
        info!("已添加 {} 到分组 '{}' ({})", item, target.name, target.group_id);

        let mut fallback = target.clone();
        fallback.items.push(item);
        let updated = self.refreshed_group(&target.group_id, fallback).await;

        let (added, removed) = target.diff(&updated);
        debug!("分组 '{}' 变化: 新增 {:?}, 移除 {:?}", updated.name, added, removed);
        Ok(updated)
    }

    /// # Summary
    /// 从分组删除标的。
    ///
    /// # Logic
    /// 1. 校验格式并解析分组；接受列表中展示的形式，包括缺少市场的纯代码。
    /// 2. 在分组中查找标的，终端未记录市场时只按代码匹配。
    /// 3. 标的不在分组中时返回 `NotFound`，不向终端发送请求。
    /// 4. 以终端保存的原始形式提交删除，并返回分组的新快照。
    pub async fn delete_item_from_group(
        &self,
        group: &str,
        stock: &str,
    ) -> Result<Group, FavoriteError> {
        let wanted = Item::parse_listed(stock).map_err(FavoriteError::Validation)?;
        self.ensure_open()?;
        let _guard = self.gate.lock().await;

        let target = Self::resolve(&self.fetch_catalog().await?, group)?;
        let item = target.find(&wanted).cloned().ok_or_else(|| {
            FavoriteError::NotFound(format!("分组 '{}' 中没有 {}", target.name, wanted))
        })?;

        self.call(self.terminal.delete_item(&target.group_id, &item)).await?;
        info!("已从分组 '{}' ({}) 删除 {}", target.name, target.group_id, item);

        let mut fallback = target.clone();
        fallback.items.retain(|i| i != &item);
        let updated = self.refreshed_group(&target.group_id, fallback).await;

        let (added, removed) = target.diff(&updated);
        debug!("分组 '{}' 变化: 新增 {:?}, 移除 {:?}", updated.name, added, removed);
        Ok(updated)
    }

    /// # Summary
    /// 新建分组。
    ///
    /// # Returns
    /// 新分组的快照；名称为空返回 `Validation`，与现有分组重名返回 `Conflict`。
    pub async fn add_group(&self, name: &str) -> Result<Group, FavoriteError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FavoriteError::Validation("分组名称不能为空".to_string()));
        }
        self.ensure_open()?;
        let _guard = self.gate.lock().await;

        let catalog = self.fetch_catalog().await?;
        if let Some(existing) = catalog.get(name) {
            return Err(FavoriteError::Conflict(format!(
                "分组 '{}' 已存在 (ID: {})",
                name, existing.group_id
            )));
        }

        let id = self.call(self.terminal.add_group(name)).await?;
        info!("已创建分组 '{}' ({})", name, id);

        let fallback = Group::new(id.0.clone(), name, Vec::new());
        Ok(self.refreshed_group(&id, fallback).await)
    }

    /// # Summary
    /// 删除分组及其全部标的。
    ///
    /// # Returns
    /// 被删除分组在删除前的快照。
    pub async fn delete_group(&self, group: &str) -> Result<Group, FavoriteError> {
        self.ensure_open()?;
        let _guard = self.gate.lock().await;

        let target = Self::resolve(&self.fetch_catalog().await?, group)?;
        self.call(self.terminal.delete_group(&target.group_id)).await?;
        info!("已删除分组 '{}' ({})", target.name, target.group_id);

        if let Err(e) = self.fetch_catalog().await {
            warn!("删除分组后刷新失败: {}", e);
        }
        Ok(target)
    }

    /// # Summary
    /// 为分组签发分享。
    ///
    /// # Logic
    /// 1. 校验有效期：负数返回 `Validation`，`0` 表示永久。
    /// 2. 解析分组并请求终端签发，每次调用都产生独立的分享。
    ///
    /// # Arguments
    /// * `group` - 分组名称或 ID。
    /// * `expire_ms` - 有效期毫秒数。
    pub async fn share_group(&self, group: &str, expire_ms: i64) -> Result<Share, FavoriteError> {
        let expiry = ShareExpiry::from_millis(expire_ms).map_err(FavoriteError::Validation)?;
        self.ensure_open()?;
        let _guard = self.gate.lock().await;

        let target = Self::resolve(&self.fetch_catalog().await?, group)?;
        let url = self
            .call(self.terminal.share_group(&target.group_id, expiry))
            .await?;
        info!("已分享分组 '{}' ({})，有效期 {}", target.name, target.group_id, expiry);

        Ok(Share {
            group_id: target.group_id,
            group_name: target.name,
            expiry,
            url,
            issued_at: Utc::now(),
        })
    }
}

impl Drop for FavoriteService {
    fn drop(&mut self) {
        self.close();
    }
}
