//! 上游REST客户端
//!
//! 持有到远端API的HTTP客户端与认证配置，按原始方法/路径/查询
//! 转发请求。上游不可达时由调用方转换为502。

use anyhow::Result;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 认证配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum UpstreamAuth {
    None,
    BasicAuth { username: String, password: String },
    ApiKey { key: String, header: Option<String> },
    BearerToken { token: String },
}

impl UpstreamAuth {
    /// 从可选的API密钥构造认证配置
    pub fn from_api_key(key: Option<String>) -> Self {
        match key {
            Some(key) if !key.is_empty() => UpstreamAuth::ApiKey { key, header: None },
            _ => UpstreamAuth::None,
        }
    }
}

/// 上游响应
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// 上游REST客户端
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    endpoint: String,
    auth: UpstreamAuth,
    client: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(endpoint: String, auth: UpstreamAuth, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            auth,
            client,
        })
    }

    /// 拼接上游URL
    pub fn build_url(&self, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query {
            Some(query) if !query.is_empty() => format!("{}/{}?{}", self.endpoint, path, query),
            _ => format!("{}/{}", self.endpoint, path),
        }
    }

    /// 原样转发一次请求，返回上游状态码与响应体
    pub async fn forward(
        &self,
        method: &str,
        path: &str,
        query: Option<&str>,
        body: Option<Vec<u8>>,
    ) -> Result<UpstreamResponse> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| anyhow::anyhow!("Unsupported method: {}", method))?;
        let url = self.build_url(path, query);

        debug!("Forwarding {} {} to upstream", method, url);

        let mut request = self.client.request(method, &url);
        request = self.apply_auth(request);

        if let Some(body) = body {
            if !body.is_empty() {
                request = request.header(CONTENT_TYPE, "application/json").body(body);
            }
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let body = response.bytes().await?.to_vec();

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }

    /// 添加认证头
    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.auth {
            UpstreamAuth::None => request,
            UpstreamAuth::BasicAuth { username, password } => {
                request.basic_auth(username, Some(password))
            }
            UpstreamAuth::ApiKey { key, header } => {
                let header_name = header.as_deref().unwrap_or("X-API-Key").to_string();
                request.header(header_name, key.as_str())
            }
            UpstreamAuth::BearerToken { token } => request.bearer_auth(token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(endpoint: &str) -> UpstreamClient {
        UpstreamClient::new(endpoint.to_string(), UpstreamAuth::None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_url() {
        let c = client("http://backend.local/api");
        assert_eq!(c.build_url("/patients", None), "http://backend.local/api/patients");
        assert_eq!(
            c.build_url("patients/123", Some("limit=10")),
            "http://backend.local/api/patients/123?limit=10"
        );
    }

    #[test]
    fn test_build_url_trailing_slash() {
        let c = client("http://backend.local/api/");
        assert_eq!(c.build_url("/stats", Some("")), "http://backend.local/api/stats");
    }

    #[test]
    fn test_auth_from_api_key() {
        assert!(matches!(UpstreamAuth::from_api_key(None), UpstreamAuth::None));
        assert!(matches!(
            UpstreamAuth::from_api_key(Some(String::new())),
            UpstreamAuth::None
        ));
        assert!(matches!(
            UpstreamAuth::from_api_key(Some("secret".to_string())),
            UpstreamAuth::ApiKey { .. }
        ));
    }
}
