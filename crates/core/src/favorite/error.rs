use std::time::Duration;
use thiserror::Error;

/// # Summary
/// 终端适配层错误枚举，覆盖会话、网络、业务拒绝与解析问题。
///
/// # Invariants
/// - 必须通过 `thiserror` 派生 `Error` trait。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminalError {
    // 会话无法建立 (终端不可达或拒绝会话)
    #[error("Connection error: {0}")]
    Connection(String),
    // 网络层错误，包含 HTTP 状态异常
    #[error("Network error: {0}")]
    Network(String),
    // 终端未在限定时间内响应
    #[error("Terminal did not respond within {0:?}")]
    Timeout(Duration),
    // 终端返回了非 0 的业务状态码
    #[error("Rejected by terminal: {message} (code: {code})")]
    Rejected { code: i64, message: String },
    // 响应格式不符合预期
    #[error("Parse error: {0}")]
    Parse(String),
    // 会话已关闭
    #[error("Session closed")]
    Closed,
}

/// # Summary
/// 自选股门面层错误，面向 CLI 与 HTTP 调用方。
///
/// # Invariants
/// - 除 `Connection` 外均为可恢复错误，由调用方决定重试或放弃。
#[derive(Error, Debug)]
pub enum FavoriteError {
    /// 用户输入格式错误
    #[error("参数无效: {0}")]
    Validation(String),
    /// 分组或标的不存在
    #[error("未找到: {0}")]
    NotFound(String),
    /// 分组名冲突
    #[error("冲突: {0}")]
    Conflict(String),
    /// 终端调用失败
    #[error("终端错误: {0}")]
    Upstream(#[from] TerminalError),
    /// 启动时无法建立会话
    #[error("无法连接终端: {0}")]
    Connection(String),
    /// 会话已关闭后仍被调用
    #[error("会话已关闭")]
    Closed,
}
