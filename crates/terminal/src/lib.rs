//! # `zixuan-terminal` - 交易终端适配层
//!
//! 通过 HTTP 调用同花顺自选股服务，实现 `zixuan-core` 中的 `TerminalPort` 契约。

pub mod cookie;
pub mod ths;
