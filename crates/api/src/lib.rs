//! # `zixuan-api` - HTTP API 层
//!
//! 自选股分组管理的 HTTP/REST 服务入口。
//! 使用 `axum` 构建路由，通过 `utoipa` 自动生成 OpenAPI 3.0 Swagger 文档。
//!
//! ## 架构职责
//! - 解析查询参数，缺失必填参数时返回 400
//! - 调用下层 `FavoriteService` 完成分组与标的操作
//! - 将领域模型转换为 DTO 返回给调用方

pub mod error;
pub mod routes;
pub mod server;
pub mod types;
