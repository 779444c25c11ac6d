//! # CTFlow管理模块
//!
//! 提供统一的配置管理功能。

pub mod config;

pub use config::{
    CtflowConfig, DatabaseSection, LoggingSection, ServerSection, UpstreamSection,
};
