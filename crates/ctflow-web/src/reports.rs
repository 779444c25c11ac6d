//! 报表处理器
//!
//! 数据库取回行集，聚合在 ctflow-reports 内完成，结果以JSON返回。

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
};
use ctflow_core::CtflowError;
use ctflow_database::DatabaseQueries;
use ctflow_reports::{summarize_by_hospital, summarize_revenue};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::ApiResult;
use crate::handlers::parse_optional_date;
use crate::state::AppState;

/// 单日报表查询参数
#[derive(Debug, Deserialize)]
pub struct DailyParams {
    /// dd-mm-yyyy，缺省为当天
    pub date: Option<String>,
}

/// 日期范围报表查询参数
#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub from_date: String,
    pub to_date: String,
}

/// 单日收入汇总处理器
pub async fn daily_revenue(
    State(state): State<AppState>,
    Query(params): Query<DailyParams>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_optional_date(params.date.as_deref())?;
    info!("Generating daily revenue report for {}", date);

    let queries = DatabaseQueries::new(&state.db);
    let rows = queries.revenue_rows(date, date).await?;
    let summary = summarize_revenue(&rows);

    Ok(Json(json!({ "date": date, "summary": summary })))
}

/// 日期范围收入汇总处理器
pub async fn revenue_range(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> ApiResult<impl IntoResponse> {
    let (from, to) = parse_range(&params)?;

    let queries = DatabaseQueries::new(&state.db);
    let rows = queries.revenue_rows(from, to).await?;
    let summary = summarize_revenue(&rows);

    Ok(Json(json!({ "from_date": from, "to_date": to, "summary": summary })))
}

/// 单日待处理患者列表处理器
pub async fn pending_list(
    State(state): State<AppState>,
    Query(params): Query<DailyParams>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_optional_date(params.date.as_deref())?;

    let queries = DatabaseQueries::new(&state.db);
    let patients = queries.patients_by_completion(date, false).await?;

    Ok(Json(json!({ "date": date, "patients": patients, "total": patients.len() })))
}

/// 单日已完成患者列表处理器
pub async fn completed_list(
    State(state): State<AppState>,
    Query(params): Query<DailyParams>,
) -> ApiResult<impl IntoResponse> {
    let date = parse_optional_date(params.date.as_deref())?;

    let queries = DatabaseQueries::new(&state.db);
    let patients = queries.patients_by_completion(date, true).await?;

    Ok(Json(json!({ "date": date, "patients": patients, "total": patients.len() })))
}

/// 医院维度汇总处理器
pub async fn hospital_breakdown(
    State(state): State<AppState>,
    Query(params): Query<RangeParams>,
) -> ApiResult<impl IntoResponse> {
    let (from, to) = parse_range(&params)?;

    let queries = DatabaseQueries::new(&state.db);
    let rows = queries.hospital_rows(from, to).await?;
    let summary = summarize_by_hospital(&rows);

    Ok(Json(json!({ "from_date": from, "to_date": to, "hospitals": summary })))
}

fn parse_range(params: &RangeParams) -> ApiResult<(chrono::NaiveDate, chrono::NaiveDate)> {
    let from = ctflow_core::utils::parse_boundary_date(&params.from_date)?;
    let to = ctflow_core::utils::parse_boundary_date(&params.to_date)?;

    if from > to {
        return Err(CtflowError::Validation(format!(
            "from_date {} is after to_date {}",
            params.from_date, params.to_date
        ))
        .into());
    }

    Ok((from, to))
}
