//! # CTFlow集成模块
//!
//! 远端REST后端的转发层：部分资源（患者、统计、医生、医院、
//! 扫描头、库存）由远端系统持有，本服务原样转发请求并回传
//! 上游的状态码与响应体。

pub mod relay;
pub mod upstream;

pub use relay::proxy_routes;
pub use upstream::{UpstreamAuth, UpstreamClient, UpstreamResponse};
