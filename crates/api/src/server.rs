//! # API 服务启动器
//!
//! 组装 axum 路由、挂载 Swagger UI、配置 CORS 并绑定 TCP 端口对外提供服务。
//! 本模块不直接启动 `main()`, 而是由 `crates/app` 的 DI 容器持有并调用。

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use utoipa_swagger_ui::SwaggerUi;

use zixuan_manager::favorite::FavoriteService;

use crate::routes::{group, stock};

// ============================================================
//  共享应用状态
// ============================================================

/// 全局应用状态，通过 axum 的 `State` 提取器注入到每个 Handler 中。
///
/// # Invariants
/// - 所有请求共享同一个 `FavoriteService`，其内部互斥锁负责串行化终端调用。
#[derive(Clone)]
pub struct AppState {
    /// 自选股门面
    pub service: Arc<FavoriteService>,
}

// ============================================================
//  OpenAPI 文档定义
// ============================================================

/// 全局 OpenAPI 文档结构
#[derive(OpenApi)]
#[openapi(
    info(
        title = "自选股分组 API",
        version = "0.1.0",
        description = "管理交易终端中的自选股分组：查询、增删标的、增删分组以及分享分组。",
        license(name = "MIT")
    ),
    tags(
        (name = "分组 (Group)", description = "分组的查询、创建、删除与分享"),
        (name = "标的 (Stock)", description = "分组内标的的添加与删除")
    )
)]
pub struct ApiDoc;

// ============================================================
//  服务构建与启动
// ============================================================

/// # Summary
/// 构建完整的 axum 应用路由树 (含 Swagger UI 与 CORS)。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
pub fn build_router(state: AppState) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .routes(routes!(group::list_groups))
        .routes(routes!(group::list_stocks))
        .routes(routes!(group::add_group))
        .routes(routes!(group::delete_group))
        .routes(routes!(group::share_group))
        .routes(routes!(stock::add_stocks))
        .routes(routes!(stock::delete_stocks))
        .with_state(state)
        .split_for_parts();

    // 本地工具，允许所有来源
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(cors)
}

/// # Summary
/// 绑定端口并启动 HTTP 服务，收到 Ctrl-C 后优雅退出。
///
/// # Arguments
/// * `state` - 由外部 DI 容器注入的共享状态
/// * `bind_addr` - 监听的地址与端口，如 `"0.0.0.0:8080"`
pub async fn start_server(state: AppState, bind_addr: &str) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(state);

    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("API Server listening on {}", listener.local_addr()?);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("API Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("无法监听 Ctrl-C 信号: {}", e);
        std::future::pending::<()>().await;
    }
}
