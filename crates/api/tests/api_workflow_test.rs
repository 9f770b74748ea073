use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tokio::net::TcpListener;
use zixuan_api::server::{AppState, build_router};
use zixuan_api::types::{GroupResponse, MutationResponse, ShareResponse};
use zixuan_core::favorite::entity::{Group, Item};
use zixuan_core::favorite::error::TerminalError;
use zixuan_core::test_utils::MemoryTerminal;
use zixuan_manager::favorite::{FavoriteService, ServiceOptions};

// 帮助函数：在随机端口启动测试服务器
async fn spawn_test_server(terminal: Arc<MemoryTerminal>) -> String {
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    let _ = rustls::crypto::ring::default_provider().install_default();

    let service = FavoriteService::open(terminal, None, ServiceOptions::default())
        .await
        .unwrap();
    let app = build_router(AppState { service });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn get(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    (status, res.json::<Value>().await.unwrap())
}

#[tokio::test]
async fn test_list_groups_empty_returns_array() {
    let base = spawn_test_server(Arc::new(MemoryTerminal::new())).await;
    let client = reqwest::Client::new();

    let (status, body) = get(&client, format!("{}/list_groups", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_full_api_workflow() {
    let terminal = Arc::new(MemoryTerminal::new());
    let base = spawn_test_server(terminal.clone()).await;
    let client = reqwest::Client::new();

    // ============================================
    // Case 1: 新建分组
    // ============================================
    let res = client
        .get(format!("{}/add_group", base))
        .query(&[("group", "MyGroup")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created: MutationResponse = res.json().await.unwrap();
    assert!(created.success);
    assert_eq!(created.group.name, "MyGroup");
    assert_eq!(created.group.count, 0);

    // ============================================
    // Case 2: 添加标的，消息包含分组与标的
    // ============================================
    let res = client
        .get(format!("{}/add_stocks", base))
        .query(&[("group", "MyGroup"), ("stock", "600519.SH")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let added: MutationResponse = res.json().await.unwrap();
    assert!(added.message.contains("MyGroup"));
    assert!(added.message.contains("600519.SH"));
    assert_eq!(added.group.items, vec!["600519.SH"]);

    // ============================================
    // Case 3: 按名称与按 ID 查看分组结果一致
    // ============================================
    let res = client
        .get(format!("{}/list_stocks", base))
        .query(&[("group", "MyGroup")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let by_name: GroupResponse = res.json().await.unwrap();
    let res = client
        .get(format!("{}/list_stocks", base))
        .query(&[("group", created.group.group_id.as_str())])
        .send()
        .await
        .unwrap();
    let by_id: GroupResponse = res.json().await.unwrap();
    assert_eq!(by_name.items, by_id.items);
    assert_eq!(by_name.group_id, by_id.group_id);

    // ============================================
    // Case 4: 分享分组
    // ============================================
    let res = client
        .get(format!("{}/share_group", base))
        .query(&[("group", "MyGroup"), ("time", "0")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let share: ShareResponse = res.json().await.unwrap();
    assert_eq!(share.expire_ms, 0);
    assert_eq!(share.group_name, "MyGroup");
    assert!(share.url.is_some());

    // ============================================
    // Case 5: 删除标的并删除分组
    // ============================================
    let res = client
        .get(format!("{}/delete_stocks", base))
        .query(&[("group", "MyGroup"), ("stock", "600519.SH")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let deleted: MutationResponse = res.json().await.unwrap();
    assert!(deleted.group.items.is_empty());

    let res = client
        .get(format!("{}/delete_group", base))
        .query(&[("group", "MyGroup")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = get(&client, format!("{}/list_groups", base)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));
    assert!(terminal.groups().is_empty());
}

#[tokio::test]
async fn test_missing_and_invalid_parameters_are_bad_request() {
    let terminal = Arc::new(MemoryTerminal::with_groups(vec![Group::new(
        "101",
        "MyGroup",
        vec![],
    )]));
    let base = spawn_test_server(terminal.clone()).await;
    let client = reqwest::Client::new();

    let cases = [
        format!("{}/add_stocks?group=MyGroup", base),
        format!("{}/add_stocks?group=MyGroup&stock=", base),
        format!("{}/delete_stocks?stock=600519.SH", base),
        format!("{}/list_stocks", base),
        format!("{}/add_group", base),
        format!("{}/delete_group", base),
        format!("{}/share_group?group=MyGroup", base),
        format!("{}/add_stocks?group=MyGroup&stock=600519", base),
        format!("{}/share_group?group=MyGroup&time=-5", base),
        format!("{}/share_group?group=MyGroup&time=abc", base),
    ];
    for url in cases {
        let (status, body) = get(&client, url.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{url}");
        assert_eq!(body["success"], Value::Bool(false));
        assert!(body["error"].is_string());
    }

    // 参数校验失败时不会触达终端
    assert!(terminal.groups()[0].items.is_empty());
    assert_eq!(terminal.share_count(), 0);
}

#[tokio::test]
async fn test_facade_failures_map_to_status() {
    let terminal = Arc::new(MemoryTerminal::with_groups(vec![Group::new(
        "101",
        "MyGroup",
        vec![Item::new("600519", "SH")],
    )]));
    let base = spawn_test_server(terminal.clone()).await;
    let client = reqwest::Client::new();

    // 查询不存在的分组 → 404
    let (status, _) = get(&client, format!("{}/list_stocks?group=Nope", base)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 变更类接口的门面失败 → 500
    let (status, body) = get(
        &client,
        format!("{}/add_stocks?group=Nope&stock=600519.SH", base),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["success"], Value::Bool(false));

    let (status, _) = get(&client, format!("{}/add_group?group=MyGroup", base)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = get(
        &client,
        format!("{}/delete_stocks?group=MyGroup&stock=000001.SZ", base),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    // 终端错误 → 500
    terminal.fail_next(TerminalError::Network("HTTP 502".to_string()));
    let (status, _) = get(&client, format!("{}/list_groups", base)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let base = spawn_test_server(Arc::new(MemoryTerminal::new())).await;
    let client = reqwest::Client::new();

    let (status, doc) = get(&client, format!("{}/api-docs/openapi.json", base)).await;
    assert_eq!(status, StatusCode::OK);
    for path in [
        "/list_groups",
        "/list_stocks",
        "/add_stocks",
        "/delete_stocks",
        "/add_group",
        "/delete_group",
        "/share_group",
    ] {
        assert!(doc["paths"][path].is_object(), "{path}");
    }
}
