use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use utoipa::IntoParams;
use zixuan_core::favorite::entity::Item;

use super::required;
use crate::error::ApiError;
use crate::server::AppState;
use crate::types::{ApiErrorResponse, MutationResponse};

/// 标的变更查询参数
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StockQuery {
    /// 分组名称或 ID
    pub group: Option<String>,
    /// `code.market` 形式的标的，如 `600519.SH`
    pub stock: Option<String>,
}

// 取出并规范化 group 与 stock 参数
fn parse(
    query: &StockQuery,
    parse_stock: fn(&str) -> Result<Item, String>,
) -> Result<(&str, Item), ApiError> {
    let group = required(&query.group, "group")?;
    let stock = required(&query.stock, "stock")?;
    let item = parse_stock(stock).map_err(ApiError::BadRequest)?;
    Ok((group, item))
}

/// 添加标的到分组
#[utoipa::path(
    get,
    path = "/add_stocks",
    tag = "标的 (Stock)",
    params(StockQuery),
    responses(
        (status = 200, description = "添加成功", body = MutationResponse),
        (status = 400, description = "缺少参数或标的格式无效", body = ApiErrorResponse),
        (status = 500, description = "添加失败", body = ApiErrorResponse)
    )
)]
pub async fn add_stocks(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> Result<Json<MutationResponse>, ApiError> {
    let (group, item) = parse(&query, str::parse::<Item>)?;
    let updated = state
        .service
        .add_item_to_group(group, &item.to_string())
        .await
        .map_err(ApiError::from_mutation)?;
    Ok(Json(MutationResponse::new(
        format!("已添加 {} 到分组 {}", item, updated.name),
        &updated,
    )))
}

/// 从分组删除标的
#[utoipa::path(
    get,
    path = "/delete_stocks",
    tag = "标的 (Stock)",
    params(StockQuery),
    responses(
        (status = 200, description = "删除成功", body = MutationResponse),
        (status = 400, description = "缺少参数或标的格式无效", body = ApiErrorResponse),
        (status = 500, description = "删除失败", body = ApiErrorResponse)
    )
)]
pub async fn delete_stocks(
    State(state): State<AppState>,
    Query(query): Query<StockQuery>,
) -> Result<Json<MutationResponse>, ApiError> {
    // 删除时接受列表中展示的纯代码形式
    let (group, item) = parse(&query, Item::parse_listed)?;
    let updated = state
        .service
        .delete_item_from_group(group, &item.to_string())
        .await
        .map_err(ApiError::from_mutation)?;
    Ok(Json(MutationResponse::new(
        format!("已从分组 {} 删除 {}", updated.name, item),
        &updated,
    )))
}
