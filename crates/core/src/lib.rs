//! # `zixuan-core` - 领域模型与端口定义
//!
//! 定义自选股分组的实体、错误分类以及面向外部终端和快照存储的 Trait 契约。
//! 本 crate 不包含任何 IO 实现，具体实现由 `zixuan-terminal` 与 `zixuan-store` 提供。

pub mod common;
pub mod config;
pub mod favorite;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod test_utils;
