//! # CTFlow报表模块
//!
//! 收入与工作量报表的应用层聚合。数据库只负责取回行集，
//! 分类小计、总计与免费份额扣减都在这里完成。

pub mod hospital;
pub mod revenue;

pub use hospital::{summarize_by_hospital, HospitalSummary};
pub use revenue::{summarize_revenue, CategorySummary, RevenueSummary, FREE_SHARE_PERCENT};
