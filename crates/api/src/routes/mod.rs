//! # 路由控制器
//!
//! 所有接口均为 GET，参数通过查询字符串传递。

pub mod group;
pub mod stock;

use crate::error::ApiError;

/// 取出必填查询参数，缺失或为空白时返回 400。
pub(crate) fn required<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, ApiError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::missing(name))
}
