//! 转发处理器
//!
//! 将挂载在 /upstream 下的请求原样转发到远端API。上游的状态码与
//! 响应体不做改写；连接失败报502并附带错误消息。

use crate::upstream::UpstreamClient;
use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::any,
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// 转发路由挂载前缀
const MOUNT_PREFIX: &str = "/upstream";

/// 转发状态
#[derive(Clone)]
pub struct ProxyState {
    client: Arc<UpstreamClient>,
}

/// 创建转发路由
///
/// 远端持有的资源逐个列出，未列出的路径不转发。
pub fn proxy_routes(client: Arc<UpstreamClient>) -> Router {
    let state = ProxyState { client };

    Router::new()
        .route("/patients", any(relay))
        .route("/patients/*rest", any(relay))
        .route("/stats", any(relay))
        .route("/stats/*rest", any(relay))
        .route("/doctors", any(relay))
        .route("/doctors/*rest", any(relay))
        .route("/hospitals", any(relay))
        .route("/hospitals/*rest", any(relay))
        .route("/scan-heads", any(relay))
        .route("/scan-heads/*rest", any(relay))
        .route("/inventory", any(relay))
        .route("/inventory/*rest", any(relay))
        .with_state(state)
}

/// 通用转发处理器
async fn relay(
    State(state): State<ProxyState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    body: Bytes,
) -> Response {
    let path = uri.path().trim_start_matches(MOUNT_PREFIX);
    let query = uri.query();

    info!("Proxying {} {} to upstream", method, path);

    let result = state
        .client
        .forward(method.as_str(), path, query, Some(body.to_vec()))
        .await;

    match result {
        Ok(upstream) => {
            let status =
                StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::BAD_GATEWAY);

            let mut builder = Response::builder().status(status);
            if let Some(content_type) = upstream.content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }

            builder
                .body(Body::from(upstream.body))
                .unwrap_or_else(|e| {
                    error!("Failed to build relay response: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                })
        }
        Err(e) => {
            error!("Upstream fetch failed for {}: {}", path, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({
                    "error": true,
                    "message": format!("Upstream fetch failed: {}", e),
                    "status": StatusCode::BAD_GATEWAY.as_u16()
                })),
            )
                .into_response()
        }
    }
}
