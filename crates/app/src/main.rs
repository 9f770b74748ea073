mod cli;
mod settings;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{CommandFactory, Parser};
use tracing::info;
use zixuan_api::server::{AppState, start_server};
use zixuan_core::config::AppConfig;
use zixuan_core::favorite::error::FavoriteError;
use zixuan_core::favorite::port::TerminalPort;
use zixuan_core::store::port::SnapshotStore;
use zixuan_manager::favorite::{FavoriteService, ServiceOptions};
use zixuan_store::snapshot::JsonSnapshotStore;
use zixuan_terminal::ths::ThsTerminal;

use crate::cli::{Cli, Commands};

/// # Summary
/// 应用启动入口。
///
/// # Logic
/// 1. 解析命令行，未给出子命令时打印帮助并以 1 退出。
/// 2. 执行子命令，任何错误写到 stderr 并以 1 退出。
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        if let Err(e) = Cli::command().print_help() {
            eprintln!("{}", e);
        }
        return ExitCode::FAILURE;
    };

    match run(cli.config.as_deref(), command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("错误: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// # Summary
/// 加载配置、初始化日志、装配门面并执行子命令。
///
/// # Logic
/// 1. 加载配置并初始化日志 (`serve` 模式下可额外写入文件)。
/// 2. 通过 `open_service` 装配具体实现。
/// 3. `serve` 启动 HTTP 服务，其余子命令执行一次后输出结果。
/// 4. 无论成功与否都显式关闭会话。
async fn run(config_path: Option<&Path>, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let config = settings::load_config(config_path)?;
    let serving = matches!(command, Commands::Serve { .. });
    let _log_guard = settings::init_logging(&config.log, serving);

    let service = open_service(&config).await?;

    let result = match command {
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind_addr());
            start_server(
                AppState {
                    service: service.clone(),
                },
                &bind,
            )
            .await
        }
        other => cli::execute(&service, other)
            .await
            .map(|out| println!("{}", out))
            .map_err(Into::into),
    };

    service.close();
    result
}

/// # Summary
/// 纯粹的 DI 容器：实例化终端与快照存储，并通过 `Arc<dyn Trait>` 注入门面。
///
/// # Returns
/// * 会话建立失败时返回带有配置提示的错误，调用方据此中止启动。
async fn open_service(config: &AppConfig) -> Result<Arc<FavoriteService>, Box<dyn std::error::Error>> {
    zixuan_store::config::set_root_dir(PathBuf::from(&config.storage.data_dir));
    let snapshots: Arc<dyn SnapshotStore> =
        Arc::new(JsonSnapshotStore::new(&config.storage.snapshot_file)?);
    let terminal: Arc<dyn TerminalPort> = Arc::new(ThsTerminal::new(&config.terminal)?);
    let options = ServiceOptions {
        call_timeout: config.terminal.timeout(),
    };

    info!("正在连接交易终端 {}", config.terminal.base_url);
    match FavoriteService::open(terminal, Some(snapshots), options).await {
        Ok(service) => Ok(service),
        Err(e @ FavoriteError::Connection(_)) => Err(format!(
            "{}。请检查 terminal.cookies 配置或 ZIXUAN__TERMINAL__COOKIES 环境变量",
            e
        )
        .into()),
        Err(e) => Err(e.into()),
    }
}
