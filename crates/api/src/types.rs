//! # DTO (Data Transfer Object) 层
//!
//! 将内部领域模型转化为面向调用方 JSON 输出的轻量结构体。
//! 所有 DTO 必须派生 `utoipa::ToSchema` 以自动进入 Swagger 文档。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zixuan_core::favorite::entity::{Group, Share};

// ============================================================
//  分组相关 DTO
// ============================================================

/// 分组 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GroupResponse {
    /// 分组名称
    #[schema(example = "白酒")]
    pub name: String,
    /// 终端分配的分组 ID
    #[schema(example = "0_35")]
    pub group_id: String,
    /// 标的数量
    #[schema(example = 2)]
    pub count: usize,
    /// 标的列表，`code.market` 形式；终端未给出市场时为纯代码
    pub items: Vec<String>,
}

impl From<&Group> for GroupResponse {
    fn from(group: &Group) -> Self {
        Self {
            name: group.name.clone(),
            group_id: group.group_id.to_string(),
            count: group.items.len(),
            items: group.items.iter().map(ToString::to_string).collect(),
        }
    }
}

/// 变更操作的结果
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MutationResponse {
    /// 固定为 true
    pub success: bool,
    /// 面向用户的描述
    #[schema(example = "已添加 600519.SH 到分组 白酒")]
    pub message: String,
    /// 操作后的分组快照；删除分组时为删除前的快照
    pub group: GroupResponse,
}

impl MutationResponse {
    pub fn new(message: impl Into<String>, group: &Group) -> Self {
        Self {
            success: true,
            message: message.into(),
            group: group.into(),
        }
    }
}

/// 分享结果 DTO
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ShareResponse {
    /// 固定为 true
    pub success: bool,
    #[schema(example = "已分享分组 白酒，有效期 永久")]
    pub message: String,
    #[schema(example = "0_35")]
    pub group_id: String,
    #[schema(example = "白酒")]
    pub group_name: String,
    /// 有效期毫秒数，0 表示永久
    #[schema(example = 86400000)]
    pub expire_ms: u64,
    /// 终端返回的分享链接 (若有)
    pub url: Option<String>,
    /// 签发时间
    pub issued_at: DateTime<Utc>,
}

impl From<Share> for ShareResponse {
    fn from(share: Share) -> Self {
        Self {
            success: true,
            message: format!("已分享分组 {}，有效期 {}", share.group_name, share.expiry),
            group_id: share.group_id.to_string(),
            group_name: share.group_name,
            expire_ms: share.expiry.as_millis(),
            url: share.url,
            issued_at: share.issued_at,
        }
    }
}

// ============================================================
//  通用响应包装
// ============================================================

/// 失败响应
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 固定为 false
    pub success: bool,
    /// 错误描述信息
    pub error: String,
}

impl ApiErrorResponse {
    /// 从错误信息构建
    pub fn from_msg(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zixuan_core::favorite::entity::Item;

    #[test]
    fn test_group_response_formats_items() {
        let group = Group::new(
            "0_35",
            "白酒",
            vec![Item::new("600519", "SH"), Item::new("000858", "SZ")],
        );
        let dto = GroupResponse::from(&group);
        assert_eq!(dto.count, 2);
        assert_eq!(dto.items, vec!["600519.SH", "000858.SZ"]);
        assert_eq!(dto.group_id, "0_35");
    }
}
