//! HTTP处理器
//!
//! 患者登记、队列路由与护理/操作台/医生各角色的工作流端点。

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, Utc};
use ctflow_core::{
    utils::{format_scan_gap, parse_boundary_date, parse_clock},
    Gender, Result as CoreResult, CtflowError, ScanStatus,
};
use ctflow_database::{
    models::{NewConsoleEntry, NewPatient},
    DatabaseQueries, PatientPageFilter,
};
use ctflow_workflow::{RouteDestination, RouteRequest, ScanEvent};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

/// API根路径处理器
pub async fn api_root() -> impl IntoResponse {
    Json(json!({
        "service": "CTFlow Web API",
        "version": "0.1.0",
        "status": "running",
        "endpoints": {
            "health": "/health",
            "api": "/api/v1",
            "upstream": "/upstream"
        }
    }))
}

/// 健康检查处理器
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": "0.1.0"
    }))
}

// ========== 接待台 ==========

/// 患者登记请求体
#[derive(Debug, Deserialize)]
pub struct RegisterPatientRequest {
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub mobile: Option<String>,
    pub address: Option<String>,
    pub doctor_id: Option<i64>,
    pub hospital_id: Option<i64>,
    pub category: String,
    pub total_scans: Option<i32>,
    pub amount: i64,
    pub received_amount: Option<i64>,
    /// 登记日期 dd-mm-yyyy，缺省为当天
    pub date: Option<String>,
}

/// 登记新患者，初始状态为已登记(0)
pub async fn register_patient(
    State(state): State<AppState>,
    Json(request): Json<RegisterPatientRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.name.trim().is_empty() {
        return Err(CtflowError::Validation("Patient name is required".to_string()).into());
    }
    if request.amount < 0 {
        return Err(CtflowError::Validation("Amount cannot be negative".to_string()).into());
    }

    let registration_date = parse_optional_date(request.date.as_deref())?;
    let gender = request.gender.as_deref().map(parse_gender).transpose()?;

    let new_patient = NewPatient {
        name: request.name.trim().to_string(),
        age: request.age,
        gender,
        mobile: request.mobile,
        address: request.address,
        doctor_id: request.doctor_id,
        hospital_id: request.hospital_id,
        category: request.category,
        total_scans: request.total_scans.unwrap_or(1).max(1),
        amount: request.amount,
        received_amount: request.received_amount.unwrap_or(0),
        registration_date,
    };

    let queries = DatabaseQueries::new(&state.db);
    let patient = queries.register_patient(&new_patient).await?;

    Ok((StatusCode::CREATED, Json(json!({ "patient": patient }))))
}

/// 患者列表查询参数
#[derive(Debug, Deserialize)]
pub struct PatientQueryParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub date: Option<String>,
}

/// 患者分页查询处理器
pub async fn get_patients(
    State(state): State<AppState>,
    Query(params): Query<PatientQueryParams>,
) -> ApiResult<impl IntoResponse> {
    info!("Getting patients with query: {:?}", params);

    let filter = PatientPageFilter {
        page: params.page,
        limit: params.limit,
        search: params.search.filter(|s| !s.trim().is_empty()),
        date: params.date.as_deref().map(parse_boundary_date).transpose()?,
    };

    let queries = DatabaseQueries::new(&state.db);
    let page = queries.get_patients(&filter).await?;

    Ok(Json(json!({
        "patients": page.patients,
        "total": page.total,
        "page": page.page,
        "limit": page.limit
    })))
}

/// 按CRO查询单个患者
pub async fn get_patient(
    State(state): State<AppState>,
    Path(cro): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let patient = queries
        .get_patient_by_cro(&cro)
        .await?
        .ok_or_else(|| CtflowError::NotFound(format!("Patient with CRO {} not found", cro)))?;

    Ok(Json(json!({ "patient": patient })))
}

/// 队列路由处理器，请求体 {destination, cro}
pub async fn route_patient(
    State(state): State<AppState>,
    Json(request): Json<RouteRequest>,
) -> ApiResult<impl IntoResponse> {
    let destination = RouteDestination::parse(&request.destination)?;

    let queries = DatabaseQueries::new(&state.db);
    let next = queries.route_patient(&request.cro, destination).await?;

    Ok(Json(json!({
        "cro": request.cro,
        "destination": destination.as_str(),
        "scan_status": next.code()
    })))
}

// ========== 护理台 ==========

/// 仅携带CRO的请求体
#[derive(Debug, Deserialize)]
pub struct CroRequest {
    pub cro: String,
}

/// 护理队列处理器
pub async fn nursing_queue(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let patients = queries.nursing_queue().await?;

    Ok(Json(json!({ "patients": patients, "total": patients.len() })))
}

/// 护理准备完成处理器
pub async fn nursing_prepare(
    State(state): State<AppState>,
    Json(request): Json<CroRequest>,
) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let next = queries.nursing_prepare(&request.cro).await?;

    Ok(Json(json!({ "cro": request.cro, "scan_status": next.code() })))
}

/// 护理完成处理器
pub async fn nursing_complete(
    State(state): State<AppState>,
    Json(request): Json<CroRequest>,
) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let next = queries.nursing_complete(&request.cro).await?;

    Ok(Json(json!({ "cro": request.cro, "scan_status": next.code() })))
}

// ========== 操作台 ==========

/// 操作台队列处理器
pub async fn console_queue(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let patients = queries.console_queue().await?;

    Ok(Json(json!({ "patients": patients, "total": patients.len() })))
}

/// 技师扫描记录请求体
#[derive(Debug, Deserialize)]
pub struct ConsoleEntryRequest {
    pub c_cro: String,
    pub status: String,
    pub start_time: Option<String>,
    pub stop_time: Option<String>,
    pub examination_id: Option<String>,
    pub technician: Option<String>,
    pub number_films: Option<i32>,
    pub number_scans: Option<i32>,
    pub issue_cd: Option<String>,
    pub remark: Option<String>,
}

/// 技师记录扫描执行结果
///
/// 文本状态映射为状态编码 (Complete→1, Pending→4, Recall→3)，起止
/// 时刻换算为间隔文本，扫描记录与患者状态在同一事务内更新。
pub async fn create_console_entry(
    State(state): State<AppState>,
    Json(request): Json<ConsoleEntryRequest>,
) -> ApiResult<impl IntoResponse> {
    let target = ScanStatus::from_console_text(&request.status);
    if ScanEvent::for_console_status(target).is_none() {
        return Err(CtflowError::Validation(format!(
            "Unknown console status '{}', expected Complete, Pending or Recall",
            request.status
        ))
        .into());
    }

    let start_time = request.start_time.as_deref().map(parse_clock).transpose()?;
    let stop_time = request.stop_time.as_deref().map(parse_clock).transpose()?;
    let gap = match (start_time, stop_time) {
        (Some(start), Some(stop)) => Some(format_scan_gap(start, stop)),
        _ => None,
    };

    let examination_id = request
        .examination_id
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("EXM-{}", Uuid::new_v4().simple()));

    let entry = NewConsoleEntry {
        cro: request.c_cro,
        examination_id,
        technician: request.technician,
        start_time,
        stop_time,
        gap,
        number_films: request.number_films,
        number_scans: request.number_scans,
        issue_cd: request.issue_cd,
        remark: request.remark,
        status: request.status,
        scan_date: Utc::now().date_naive(),
    };

    let queries = DatabaseQueries::new(&state.db);
    let recorded = queries.record_console_entry(&entry, target).await?;

    Ok((StatusCode::CREATED, Json(json!({ "console": recorded }))))
}

/// 按CRO查询扫描记录
pub async fn get_console_entry(
    State(state): State<AppState>,
    Path(cro): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let entry = queries
        .get_console_entry(&cro)
        .await?
        .ok_or_else(|| CtflowError::NotFound(format!("Console entry for CRO {} not found", cro)))?;

    Ok(Json(json!({ "console": entry })))
}

// ========== 医生 ==========

/// 医生报告请求体
#[derive(Debug, Deserialize)]
pub struct DoctorReportRequest {
    pub cro: String,
    /// 报告日期 dd-mm-yyyy，缺省为当天
    pub report_date: Option<String>,
}

/// 医生队列处理器：扫描完成待出报告的患者
pub async fn doctor_queue(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let patients = queries.doctor_queue().await?;

    Ok(Json(json!({ "patients": patients, "total": patients.len() })))
}

/// 医生出具报告处理器
pub async fn doctor_report(
    State(state): State<AppState>,
    Json(request): Json<DoctorReportRequest>,
) -> ApiResult<impl IntoResponse> {
    let report_date = parse_optional_date(request.report_date.as_deref())?;

    let queries = DatabaseQueries::new(&state.db);
    queries.record_doctor_report(&request.cro, report_date).await?;

    Ok(Json(json!({ "cro": request.cro, "report_date": report_date })))
}

// ========== 维度表 ==========

/// 医生列表处理器
pub async fn get_doctors(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let doctors = queries.get_doctors().await?;

    Ok(Json(json!({ "doctors": doctors, "total": doctors.len() })))
}

/// 医院列表处理器
pub async fn get_hospitals(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let hospitals = queries.get_hospitals().await?;

    Ok(Json(json!({ "hospitals": hospitals, "total": hospitals.len() })))
}

/// 时段列表处理器
pub async fn get_time_slots(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let queries = DatabaseQueries::new(&state.db);
    let slots = queries.get_time_slots().await?;

    Ok(Json(json!({ "time_slots": slots, "total": slots.len() })))
}

// ========== 内部辅助 ==========

/// 解析可选的 dd-mm-yyyy 日期，缺省为当天
pub(crate) fn parse_optional_date(text: Option<&str>) -> CoreResult<NaiveDate> {
    match text {
        Some(text) => parse_boundary_date(text),
        None => Ok(Utc::now().date_naive()),
    }
}

fn parse_gender(text: &str) -> CoreResult<Gender> {
    match text.to_ascii_uppercase().as_str() {
        "M" | "MALE" => Ok(Gender::Male),
        "F" | "FEMALE" => Ok(Gender::Female),
        "O" | "OTHER" => Ok(Gender::Other),
        _ => Err(CtflowError::Validation(format!("Unknown gender '{}'", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gender() {
        assert_eq!(parse_gender("M").unwrap(), Gender::Male);
        assert_eq!(parse_gender("female").unwrap(), Gender::Female);
        assert!(parse_gender("unknown").is_err());
    }

    #[test]
    fn test_parse_optional_date() {
        let parsed = parse_optional_date(Some("15-01-2026")).unwrap();
        assert_eq!(parsed, NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        assert!(parse_optional_date(Some("not-a-date")).is_err());
        assert!(parse_optional_date(None).is_ok());
    }
}
