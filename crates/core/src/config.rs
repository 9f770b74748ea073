use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 全局应用配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub terminal: TerminalConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// 交易终端 (同花顺自选股服务) 连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    pub base_url: String,
    // 形如 "k1=v1; k2=v2" 的 Cookie 串
    pub cookies: String,
    pub user_agent: String,
    // 单次往返的超时时间
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    pub snapshot_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    // 设置后 serve 模式额外按天滚动写入日志文件
    pub dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ugc.10jqka.com.cn".to_string(),
            cookies: String::new(),
            user_agent: "Hexin_Gphone/11.28.03 (Royal Flush) hxtheme/0 innerversion/G037.09.028.1.32 followPhoneSystemTheme/0 getHXAPPAccessibilityMode/0 hxNewFont/1 isVip/0 getHXAPPFontSetting/normal getHXAPPAdaptOldSetting/0 okhttp/3.14.9".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            snapshot_file: "favorite.json".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

impl ServerConfig {
    /// 监听地址，如 `0.0.0.0:8080`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl TerminalConfig {
    /// 单次终端往返的超时，至少 1 秒
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.terminal.base_url, "https://ugc.10jqka.com.cn");
        assert_eq!(config.terminal.timeout_secs, 10);
        assert!(config.terminal.cookies.is_empty());
        assert_eq!(config.storage.data_dir, "data");
        assert_eq!(config.storage.snapshot_file, "favorite.json");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"server": {"port": 9000}, "terminal": {"cookies": "a=b"}}"#)
                .unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.terminal.cookies, "a=b");
        assert_eq!(config.terminal.timeout_secs, 10);
    }

    #[test]
    fn test_zero_timeout_is_clamped() {
        let terminal = TerminalConfig {
            timeout_secs: 0,
            ..TerminalConfig::default()
        };
        assert_eq!(terminal.timeout(), Duration::from_secs(1));
        assert_eq!(TerminalConfig::default().timeout(), Duration::from_secs(10));
    }
}
