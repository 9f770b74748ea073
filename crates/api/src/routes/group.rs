use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use utoipa::IntoParams;
use zixuan_manager::favorite::parse_expire_ms;

use super::required;
use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, GroupResponse, MutationResponse, ShareResponse};

/// 以分组为目标的查询参数
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GroupQuery {
    /// 分组名称或 ID
    pub group: Option<String>,
}

/// 分享查询参数
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShareQuery {
    /// 分组名称或 ID
    pub group: Option<String>,
    /// 有效期毫秒数，0 表示永久
    pub time: Option<String>,
}

/// 列出所有分组
///
/// 每次请求都会从终端完整拉取，不返回缓存数据。
#[utoipa::path(
    get,
    path = "/list_groups",
    tag = "分组 (Group)",
    responses(
        (status = 200, description = "分组列表", body = Vec<GroupResponse>),
        (status = 500, description = "终端错误", body = ApiErrorResponse)
    )
)]
pub async fn list_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let catalog = state
        .service
        .get_all_groups()
        .await
        .map_err(ApiError::from_query)?;
    Ok(Json(catalog.iter().map(GroupResponse::from).collect()))
}

/// 查看分组内的标的
#[utoipa::path(
    get,
    path = "/list_stocks",
    tag = "分组 (Group)",
    params(GroupQuery),
    responses(
        (status = 200, description = "分组详情", body = GroupResponse),
        (status = 400, description = "缺少参数", body = ApiErrorResponse),
        (status = 404, description = "分组不存在", body = ApiErrorResponse),
        (status = 500, description = "终端错误", body = ApiErrorResponse)
    )
)]
pub async fn list_stocks(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = required(&query.group, "group")?;
    let group = state
        .service
        .get_group(group)
        .await
        .map_err(ApiError::from_query)?;
    Ok(Json(GroupResponse::from(&group)))
}

/// 新建分组
#[utoipa::path(
    get,
    path = "/add_group",
    tag = "分组 (Group)",
    params(GroupQuery),
    responses(
        (status = 200, description = "创建成功", body = MutationResponse),
        (status = 400, description = "缺少参数", body = ApiErrorResponse),
        (status = 500, description = "创建失败 (含重名)", body = ApiErrorResponse)
    )
)]
pub async fn add_group(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<MutationResponse>, ApiError> {
    let name = required(&query.group, "group")?;
    let group = state
        .service
        .add_group(name)
        .await
        .map_err(ApiError::from_mutation)?;
    Ok(Json(MutationResponse::new(
        format!("已创建分组 {} (ID: {})", group.name, group.group_id),
        &group,
    )))
}

/// 删除分组
#[utoipa::path(
    get,
    path = "/delete_group",
    tag = "分组 (Group)",
    params(GroupQuery),
    responses(
        (status = 200, description = "删除成功，返回删除前的分组", body = MutationResponse),
        (status = 400, description = "缺少参数", body = ApiErrorResponse),
        (status = 500, description = "删除失败", body = ApiErrorResponse)
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Query(query): Query<GroupQuery>,
) -> Result<Json<MutationResponse>, ApiError> {
    let group = required(&query.group, "group")?;
    let removed = state
        .service
        .delete_group(group)
        .await
        .map_err(ApiError::from_mutation)?;
    Ok(Json(MutationResponse::new(
        format!("已删除分组 {} (ID: {})", removed.name, removed.group_id),
        &removed,
    )))
}

/// 分享分组
///
/// 每次调用都会签发一个新的分享。
#[utoipa::path(
    get,
    path = "/share_group",
    tag = "分组 (Group)",
    params(ShareQuery),
    responses(
        (status = 200, description = "分享成功", body = ShareResponse),
        (status = 400, description = "缺少参数或有效期无效", body = ApiErrorResponse),
        (status = 500, description = "分享失败", body = ApiErrorResponse)
    )
)]
pub async fn share_group(
    State(state): State<AppState>,
    Query(query): Query<ShareQuery>,
) -> Result<Json<ShareResponse>, ApiError> {
    let group = required(&query.group, "group")?;
    let time = required(&query.time, "time")?;
    let expire_ms = parse_expire_ms(time).map_err(ApiError::from_mutation)?;

    let share = state
        .service
        .share_group(group, expire_ms)
        .await
        .map_err(ApiError::from_mutation)?;
    Ok(Json(ShareResponse::from(share)))
}
