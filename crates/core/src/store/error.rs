use thiserror::Error;

/// # Summary
/// 存储层错误枚举，处理快照文件读写与序列化问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug)]
pub enum StoreError {
    /// 文件读写失败
    #[error("IO error: {0}")]
    Io(String),
    /// 快照内容无法序列化或解析
    #[error("Serialize error: {0}")]
    Serialize(String),
    /// 初始化存储失败
    #[error("Initialization error: {0}")]
    InitError(String),
}
