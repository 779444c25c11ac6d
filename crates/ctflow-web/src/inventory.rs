//! 库存处理器

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use ctflow_core::CtflowError;
use ctflow_database::{models::NewInventoryItem, DatabaseQueries};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// 新增库存物品请求体
#[derive(Debug, Deserialize)]
pub struct AddInventoryRequest {
    pub item_name: String,
    pub category: Option<String>,
    pub quantity: Option<i32>,
    pub reorder_level: Option<i32>,
    pub unit_price: Option<i64>,
}

/// 库存调整请求体
#[derive(Debug, Deserialize)]
pub struct AdjustInventoryRequest {
    pub delta: i32,
}

/// 库存列表处理器
pub async fn list_inventory(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let items = queries.list_inventory().await?;

    Ok(Json(json!({ "items": items, "total": items.len() })))
}

/// 新增库存物品处理器
pub async fn add_inventory_item(
    State(state): State<AppState>,
    Json(request): Json<AddInventoryRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.item_name.trim().is_empty() {
        return Err(CtflowError::Validation("Item name is required".to_string()).into());
    }
    if request.quantity.unwrap_or(0) < 0 {
        return Err(CtflowError::Validation("Quantity cannot be negative".to_string()).into());
    }

    let item = NewInventoryItem {
        item_name: request.item_name.trim().to_string(),
        category: request.category,
        quantity: request.quantity.unwrap_or(0),
        reorder_level: request.reorder_level.unwrap_or(0),
        unit_price: request.unit_price.unwrap_or(0),
    };

    let queries = DatabaseQueries::new(&state.db);
    let created = queries.add_inventory_item(&item).await?;

    Ok((StatusCode::CREATED, Json(json!({ "item": created }))))
}

/// 库存调整处理器
pub async fn adjust_inventory(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AdjustInventoryRequest>,
) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let item = queries.adjust_inventory(id, request.delta).await?;

    Ok(Json(json!({ "item": item })))
}
