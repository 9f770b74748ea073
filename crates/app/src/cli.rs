//! 命令行定义与结果渲染。

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use zixuan_core::favorite::entity::{Catalog, Group, Item, Share};
use zixuan_core::favorite::error::FavoriteError;
use zixuan_manager::favorite::{CatalogSource, FavoriteService, parse_expire_ms};

#[derive(Parser, Debug)]
#[command(name = "zixuan", about = "同花顺自选股管理工具", version)]
pub struct Cli {
    /// 配置文件路径 (默认读取当前目录下的 zixuan.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// 列出分组
    List {
        /// 指定分组名称或 ID，列出该分组中的股票
        #[arg(short, long)]
        group: Option<String>,
        /// 终端不可用时使用本地快照
        #[arg(long)]
        allow_stale: bool,
    },
    /// 添加股票到分组
    Add {
        /// 分组名称或 ID
        group: String,
        /// 股票代码，格式: code.market (如: 600519.SH)
        stock: String,
    },
    /// 从分组删除股票
    Delete {
        /// 分组名称或 ID
        group: String,
        /// 股票代码，格式: code.market (如: 600519.SH)
        stock: String,
    },
    /// 新建分组
    #[command(name = "addgroup")]
    AddGroup {
        /// 分组名称
        group: String,
    },
    /// 删除分组
    #[command(name = "deletegroup")]
    DeleteGroup {
        /// 分组名称或 ID
        group: String,
    },
    /// 分享分组
    Share {
        /// 分组名称或 ID
        group: String,
        /// 有效期 (毫秒)，0 表示永久
        #[arg(allow_negative_numbers = true)]
        time: String,
    },
    /// 启动 HTTP 服务
    Serve {
        /// 监听地址，默认取配置中的 server.host:server.port
        #[arg(long)]
        bind: Option<String>,
    },
}

/// # Summary
/// 执行除 `serve` 以外的子命令，返回写往 stdout 的文本。
///
/// # Logic
/// 1. 标的参数先在本地解析，便于以规范形式回显。
/// 2. 调用门面完成操作并渲染结果。
pub async fn execute(service: &FavoriteService, command: Commands) -> Result<String, FavoriteError> {
    match command {
        Commands::List { group, allow_stale } => {
            let (catalog, source) = if allow_stale {
                service.get_all_groups_or_snapshot().await?
            } else {
                (service.get_all_groups().await?, CatalogSource::Live)
            };

            let mut out = render_source(&source);
            match group {
                Some(identifier) => {
                    let group = catalog
                        .resolve(&identifier)
                        .ok_or_else(|| FavoriteError::NotFound(format!("分组 '{}'", identifier)))?;
                    out.push_str(&render_group(group));
                }
                None => out.push_str(&render_catalog(&catalog)),
            }
            Ok(out)
        }
        Commands::Add { group, stock } => {
            let item = parse_item(&stock)?;
            let updated = service.add_item_to_group(&group, &item.to_string()).await?;
            Ok(format!("已成功添加 {} 到分组 '{}'", item, updated.name))
        }
        Commands::Delete { group, stock } => {
            // 列表中缺少市场的标的以纯代码展示，删除时同样接受
            let item = Item::parse_listed(&stock).map_err(FavoriteError::Validation)?;
            let updated = service
                .delete_item_from_group(&group, &item.to_string())
                .await?;
            Ok(format!("已成功从分组 '{}' 删除 {}", updated.name, item))
        }
        Commands::AddGroup { group } => {
            let created = service.add_group(&group).await?;
            Ok(format!("已创建分组 '{}' (ID: {})", created.name, created.group_id))
        }
        Commands::DeleteGroup { group } => {
            let removed = service.delete_group(&group).await?;
            Ok(format!(
                "已删除分组 '{}' (ID: {}, 股票数量: {})",
                removed.name,
                removed.group_id,
                removed.items.len()
            ))
        }
        Commands::Share { group, time } => {
            let expire_ms = parse_expire_ms(&time)?;
            let share = service.share_group(&group, expire_ms).await?;
            Ok(render_share(&share))
        }
        Commands::Serve { .. } => Err(FavoriteError::Validation(
            "serve 需要由进程入口启动".to_string(),
        )),
    }
}

fn parse_item(stock: &str) -> Result<Item, FavoriteError> {
    stock.parse::<Item>().map_err(FavoriteError::Validation)
}

fn render_source(source: &CatalogSource) -> String {
    match source {
        CatalogSource::Live => String::new(),
        CatalogSource::Snapshot { saved_at } => {
            format!("(终端不可用，以下为 {} 的本地快照)\n", saved_at.format("%Y-%m-%d %H:%M:%S UTC"))
        }
    }
}

/// 渲染分组列表：首行为总数，随后每个分组一行。
pub fn render_catalog(catalog: &Catalog) -> String {
    let mut lines = vec![format!("共有 {} 个分组:", catalog.len())];
    lines.extend(catalog.iter().map(|group| {
        format!(
            "- {} (ID: {}, 股票数量: {})",
            group.name,
            group.group_id,
            group.items.len()
        )
    }));
    lines.join("\n")
}

/// 渲染单个分组及其标的。
pub fn render_group(group: &Group) -> String {
    let mut lines = vec![format!(
        "分组 '{}' (ID: {}) 包含 {} 个股票:",
        group.name,
        group.group_id,
        group.items.len()
    )];
    lines.extend(group.items.iter().map(|item| format!("- {}", item)));
    lines.join("\n")
}

fn render_share(share: &Share) -> String {
    let head = format!(
        "已分享分组 '{}' (ID: {})，有效期 {}",
        share.group_name, share.group_id, share.expiry
    );
    match &share.url {
        Some(url) => format!("{}\n链接: {}", head, url),
        None => head,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use zixuan_core::test_utils::MemoryTerminal;
    use zixuan_manager::favorite::ServiceOptions;

    async fn service_with(terminal: Arc<MemoryTerminal>) -> Arc<FavoriteService> {
        FavoriteService::open(terminal, None, ServiceOptions::default())
            .await
            .unwrap()
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_subcommands() {
        assert_eq!(
            parse(&["zixuan", "list", "-g", "MyGroup"]).command,
            Some(Commands::List {
                group: Some("MyGroup".to_string()),
                allow_stale: false
            })
        );
        assert_eq!(
            parse(&["zixuan", "addgroup", "新分组"]).command,
            Some(Commands::AddGroup {
                group: "新分组".to_string()
            })
        );
        assert_eq!(
            parse(&["zixuan", "share", "MyGroup", "-5"]).command,
            Some(Commands::Share {
                group: "MyGroup".to_string(),
                time: "-5".to_string()
            })
        );
        let cli = parse(&["zixuan", "--config", "a.toml", "serve", "--bind", "127.0.0.1:9000"]);
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert!(parse(&["zixuan"]).command.is_none());
        assert!(Cli::try_parse_from(["zixuan", "add", "MyGroup"]).is_err());
    }

    #[tokio::test]
    async fn test_list_without_groups() {
        let service = service_with(Arc::new(MemoryTerminal::new())).await;
        let out = execute(
            &service,
            Commands::List {
                group: None,
                allow_stale: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "共有 0 个分组:");
    }

    #[tokio::test]
    async fn test_add_then_list_group_shows_stock() {
        let terminal = Arc::new(MemoryTerminal::with_groups(vec![Group::new(
            "101",
            "MyGroup",
            vec![],
        )]));
        let service = service_with(terminal).await;

        let out = execute(
            &service,
            Commands::Add {
                group: "MyGroup".to_string(),
                stock: "600519.sh".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "已成功添加 600519.SH 到分组 'MyGroup'");

        let out = execute(
            &service,
            Commands::List {
                group: Some("MyGroup".to_string()),
                allow_stale: false,
            },
        )
        .await
        .unwrap();
        let stocks: Vec<&str> = out.lines().skip(1).collect();
        assert_eq!(stocks, vec!["- 600519.SH"]);

        let out = execute(
            &service,
            Commands::List {
                group: None,
                allow_stale: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "共有 1 个分组:\n- MyGroup (ID: 101, 股票数量: 1)");
    }

    #[tokio::test]
    async fn test_delete_bare_code_as_listed() {
        let terminal = Arc::new(MemoryTerminal::with_groups(vec![Group::new(
            "101",
            "MyGroup",
            vec![Item {
                code: "300750".to_string(),
                market: None,
            }],
        )]));
        let service = service_with(terminal.clone()).await;

        let out = execute(
            &service,
            Commands::Delete {
                group: "MyGroup".to_string(),
                stock: "300750".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "已成功从分组 'MyGroup' 删除 300750");
        assert!(terminal.groups()[0].items.is_empty());
    }

    #[tokio::test]
    async fn test_group_lifecycle_and_share() {
        let service = service_with(Arc::new(MemoryTerminal::new())).await;

        let out = execute(
            &service,
            Commands::AddGroup {
                group: "新能源".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(out.starts_with("已创建分组 '新能源'"));

        let out = execute(
            &service,
            Commands::Share {
                group: "新能源".to_string(),
                time: "0".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(out.contains("永久"));
        assert!(out.contains("链接: "));

        let out = execute(
            &service,
            Commands::DeleteGroup {
                group: "新能源".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(out.starts_with("已删除分组 '新能源'"));
    }

    #[tokio::test]
    async fn test_errors_are_returned() {
        let service = service_with(Arc::new(MemoryTerminal::new())).await;

        let result = execute(
            &service,
            Commands::Add {
                group: "MyGroup".to_string(),
                stock: "600519".to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(FavoriteError::Validation(_))));

        let result = execute(
            &service,
            Commands::Share {
                group: "MyGroup".to_string(),
                time: "abc".to_string(),
            },
        )
        .await;
        assert!(matches!(result, Err(FavoriteError::Validation(_))));

        let result = execute(
            &service,
            Commands::List {
                group: Some("MyGroup".to_string()),
                allow_stale: false,
            },
        )
        .await;
        assert!(matches!(result, Err(FavoriteError::NotFound(_))));
    }
}
