//! # `zixuan-store` - 本地持久化层
//!
//! 提供分组目录快照的 JSON 文件实现。

pub mod config;
pub mod snapshot;
