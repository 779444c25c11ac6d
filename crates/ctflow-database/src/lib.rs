//! # CTFlow数据库模块
//!
//! 提供连接池管理、表模型与全部SQL查询操作。多语句的
//! "插入队列行 + 更新患者状态" 序列在这里以事务方式执行。

pub mod connection;
pub mod models;
pub mod queries;

pub use connection::{DatabasePool, PoolSettings};
pub use queries::{DatabaseQueries, PatientPage, PatientPageFilter};
