//! # CTFlow Web模块
//!
//! HTTP API层：患者登记、队列路由、护理/操作台/医生各角色的
//! 处理器、报表端点、库存端点与服务器装配。

pub mod error;
pub mod handlers;
pub mod inventory;
pub mod reports;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::WebServer;
pub use state::AppState;
