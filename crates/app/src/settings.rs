//! 配置加载与日志初始化。

use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};
use zixuan_core::config::{AppConfig, LogConfig};

/// # Summary
/// 加载应用配置。
///
/// # Logic
/// 1. 以 `AppConfig::default()` 为底。
/// 2. 叠加配置文件：指定路径时必须存在，否则尝试读取当前目录的 `zixuan.toml`。
/// 3. 叠加环境变量 `ZIXUAN__SECTION__KEY`，如 `ZIXUAN__TERMINAL__COOKIES`。
///
/// # Arguments
/// * `path` - 命令行 `--config` 指定的配置文件。
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let file = match path {
        Some(p) => File::from(p).required(true),
        None => File::with_name("zixuan").required(false),
    };

    Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix("ZIXUAN")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}

/// # Summary
/// 初始化全局日志。
///
/// # Logic
/// 1. `RUST_LOG` 优先，否则使用 `log.level`。
/// 2. 日志始终输出到 stderr，保持 stdout 只有命令结果。
/// 3. `with_file` 且配置了 `log.dir` 时额外按天滚动写入 `zixuan.log`。
///
/// # Returns
/// * 文件日志的 `WorkerGuard`，需持有到进程结束以保证日志落盘。
pub fn init_logging(log: &LogConfig, with_file: bool) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file_layer, guard) = match (&log.dir, with_file) {
        (Some(dir), true) => {
            let appender = tracing_appender::rolling::daily(dir, "zixuan.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        _ => (None, None),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
    {
        eprintln!("日志初始化失败: {}", e);
    }
    guard
}
