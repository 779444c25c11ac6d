//! CTFlow服务器主程序

use anyhow::Result;
use clap::Parser;
use ctflow_admin::CtflowConfig;
use ctflow_database::{DatabasePool, DatabaseQueries, PoolSettings};
use ctflow_integration::{UpstreamAuth, UpstreamClient};
use ctflow_web::{AppState, WebServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CTFlow服务器命令行参数
#[derive(Parser, Debug)]
#[command(name = "ctflow-server")]
#[command(about = "CT扫描工作流管理服务器")]
struct Args {
    /// 服务器端口，覆盖配置文件
    #[arg(short, long)]
    port: Option<u16>,

    /// 数据库连接字符串，覆盖配置文件
    #[arg(short, long)]
    database_url: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 日志级别
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    info!("启动CTFlow服务器...");

    // 加载配置并应用命令行覆盖
    let mut config = CtflowConfig::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }
    config.validate()?;

    info!("CTFlow服务器配置:");
    info!("  服务名称: {}", config.server.name);
    info!("  监听地址: {}:{}", config.server.host, config.server.port);
    info!("  上游转发: {}", if config.upstream.enabled { "启用" } else { "停用" });

    // 建立数据库连接池
    let pool_settings = PoolSettings {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        acquire_timeout: Duration::from_secs(config.database.acquire_timeout_secs),
    };
    let db = DatabasePool::connect(&pool_settings).await?;

    if config.database.auto_migrate {
        DatabaseQueries::new(&db).create_tables().await?;
    }

    // 按配置构造上游客户端
    let upstream = if config.upstream.enabled {
        let client = UpstreamClient::new(
            config.upstream.endpoint.clone(),
            UpstreamAuth::from_api_key(config.upstream.api_key.clone()),
            Duration::from_secs(config.upstream.timeout_secs),
        )?;
        Some(Arc::new(client))
    } else {
        None
    };

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(db, Arc::new(config));

    // 启动Web服务器
    let server = WebServer::new(addr, state, upstream);
    if let Err(e) = server.run().await {
        error!("服务器启动失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
