//! Web服务器

use axum::{
    routing::{get, post},
    Router,
};
use ctflow_core::{CtflowError, Result};
use ctflow_integration::{proxy_routes, UpstreamClient};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers;
use crate::inventory;
use crate::reports;
use crate::state::AppState;

pub struct WebServer {
    addr: SocketAddr,
    app: Router,
}

impl WebServer {
    pub fn new(addr: SocketAddr, state: AppState, upstream: Option<Arc<UpstreamClient>>) -> Self {
        let app = Self::create_app(state, upstream);

        Self { addr, app }
    }

    fn create_app(state: AppState, upstream: Option<Arc<UpstreamClient>>) -> Router {
        let mut app = Router::new()
            // 根路径与健康检查
            .route("/", get(handlers::api_root))
            .route("/health", get(handlers::health))
            // API路由
            .nest("/api/v1", api_routes())
            .with_state(state);

        // 转发层按配置挂载
        if let Some(client) = upstream {
            app = app.nest("/upstream", proxy_routes(client));
        }

        // 全局中间件
        app.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
    }

    pub async fn run(self) -> Result<()> {
        info!("Starting web server on {}", self.addr);

        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        axum::serve(listener, self.app)
            .await
            .map_err(|e| CtflowError::Internal(format!("Web server failed: {}", e)))?;

        Ok(())
    }
}

/// API v1 路由
fn api_routes() -> Router<AppState> {
    Router::new()
        // 接待台
        .route("/patients", get(handlers::get_patients).post(handlers::register_patient))
        .route("/patients/route", post(handlers::route_patient))
        .route("/patients/:cro", get(handlers::get_patient))
        // 护理台
        .route("/nursing/queue", get(handlers::nursing_queue))
        .route("/nursing/prepare", post(handlers::nursing_prepare))
        .route("/nursing/complete", post(handlers::nursing_complete))
        // 操作台
        .route("/console/queue", get(handlers::console_queue))
        .route("/console/entries", post(handlers::create_console_entry))
        .route("/console/entries/:cro", get(handlers::get_console_entry))
        // 医生
        .route("/doctor/queue", get(handlers::doctor_queue))
        .route("/doctor/report", post(handlers::doctor_report))
        // 维度表
        .route("/doctors", get(handlers::get_doctors))
        .route("/hospitals", get(handlers::get_hospitals))
        .route("/time-slots", get(handlers::get_time_slots))
        // 库存
        .route("/inventory", get(inventory::list_inventory).post(inventory::add_inventory_item))
        .route("/inventory/:id/adjust", post(inventory::adjust_inventory))
        // 报表
        .route("/reports/daily-revenue", get(reports::daily_revenue))
        .route("/reports/revenue", get(reports::revenue_range))
        .route("/reports/pending", get(reports::pending_list))
        .route("/reports/completed", get(reports::completed_list))
        .route("/reports/hospital-breakdown", get(reports::hospital_breakdown))
}
