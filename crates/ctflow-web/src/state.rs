//! 应用共享状态

use ctflow_admin::CtflowConfig;
use ctflow_database::DatabasePool;
use std::sync::Arc;

/// 所有处理器共享的应用状态
#[derive(Clone)]
pub struct AppState {
    pub db: DatabasePool,
    pub config: Arc<CtflowConfig>,
}

impl AppState {
    pub fn new(db: DatabasePool, config: Arc<CtflowConfig>) -> Self {
        Self { db, config }
    }
}
