use checker_core::{
    DdlParser, MysqlGateway, OnlineDdlChecker, config::AppConfig, error::Result,
};
use tracing::{info, warn};

use crate::cli::Commands;

pub struct CliApp {
    pub config: AppConfig,
    checker: OnlineDdlChecker<MysqlGateway>,
}

impl CliApp {
    /// 使用智能配置查找初始化CLI应用
    pub async fn new_with_auto_config() -> Result<Self> {
        let config = AppConfig::find_and_load_config()?;
        Self::with_config(config).await
    }

    /// 用给定配置建立连接并初始化
    pub async fn with_config(config: AppConfig) -> Result<Self> {
        let gateway = MysqlGateway::connect(&config.connection).await?;
        info!(
            "已连接 MySQL: {}:{}/{}",
            config.connection.host, config.connection.port, config.connection.database
        );

        let checker = OnlineDdlChecker::new(gateway, DdlParser::new());

        Ok(Self { config, checker })
    }

    /// 运行应用命令
    pub async fn run(self, command: Commands) -> Result<()> {
        match command {
            Commands::Init { .. } => unreachable!(), // 已经在 main.rs 中处理
            Commands::Check { ddl, json } => self.run_check(&ddl, json).await,
        }
    }

    async fn run_check(self, ddl_query: &str, json: bool) -> Result<()> {
        info!("Query: {}", ddl_query);

        let outcome = self.checker.check_ddl(ddl_query).await;

        // 成败都要归还并断开连接
        if let Err(close_err) = self.checker.into_repository().close().await {
            warn!("断开 MySQL 连接失败: {}", close_err);
        }

        let result = outcome?;

        if json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            println!("✅ ALGORITHM={}, LOCK={}", result.algorithm, result.lock);
            if let Some(message) = &result.message {
                println!("ℹ️  {message}");
            }
        }

        Ok(())
    }
}
