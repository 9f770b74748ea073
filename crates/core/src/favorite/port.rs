use super::entity::{Group, GroupId, Item, ShareExpiry};
use super::error::TerminalError;
use async_trait::async_trait;

/// # Summary
/// 外部交易终端的能力接口 (Port)。门面层只依赖此契约，具体协议由适配层实现。
///
/// # Invariants
/// - `open` 成功之前与 `close` 之后的调用都是无效的。
/// - 每个方法都是一次完整的请求/响应往返，不做自动重试。
/// - 实现必须是 `Send + Sync`，并发安全由门面层的串行化保证。
#[async_trait]
pub trait TerminalPort: Send + Sync {
    /// # Summary
    /// 建立与终端的会话。
    ///
    /// # Returns
    /// 终端不可达或拒绝会话时返回 `TerminalError::Connection`。
    async fn open(&self) -> Result<(), TerminalError>;

    /// # Summary
    /// 释放会话资源。
    ///
    /// # Logic
    /// 1. 标记会话关闭，后续调用返回 `TerminalError::Closed`。
    /// 2. 不可失败；重复调用应为无操作。
    fn close(&self);

    /// # Summary
    /// 全量拉取所有分组及其标的。
    ///
    /// # Returns
    /// 按终端顺序排列的分组列表。
    async fn fetch_groups(&self) -> Result<Vec<Group>, TerminalError>;

    /// 向分组追加标的。重复添加的语义由终端决定。
    async fn add_item(&self, group_id: &GroupId, item: &Item) -> Result<(), TerminalError>;

    /// 从分组移除标的。
    async fn delete_item(&self, group_id: &GroupId, item: &Item) -> Result<(), TerminalError>;

    /// # Summary
    /// 新建分组。
    ///
    /// # Returns
    /// 终端分配的分组 ID。
    async fn add_group(&self, name: &str) -> Result<GroupId, TerminalError>;

    /// 删除分组及其全部标的。
    async fn delete_group(&self, group_id: &GroupId) -> Result<(), TerminalError>;

    /// # Summary
    /// 为分组签发分享。
    ///
    /// # Arguments
    /// * `group_id`: 目标分组。
    /// * `expiry`: 有效期，`0` 表示永久。
    ///
    /// # Returns
    /// 终端返回的分享链接 (若有)。每次调用都会产生独立的分享。
    async fn share_group(
        &self,
        group_id: &GroupId,
        expiry: ShareExpiry,
    ) -> Result<Option<String>, TerminalError>;
}
