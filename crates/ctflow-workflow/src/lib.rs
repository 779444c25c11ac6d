//! # CTFlow工作流模块
//!
//! 提供患者扫描生命周期的工作流管理功能，包括：
//! - 扫描状态机：以显式转换表约束 scan_status 的生命周期
//! - 队列路由：接待台将患者转入护理或操作台队列

pub mod queue;
pub mod state_machine;

// 重新导出主要类型
pub use queue::{RouteDestination, RouteRequest};
pub use state_machine::{ScanEvent, ScanStateMachine};
