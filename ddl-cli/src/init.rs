use checker_core::config::AppConfig;
use checker_core::constants::config::DEFAULT_CONFIG_FILE;
use checker_core::error::Result;
use std::path::Path;
use tracing::{info, warn};

/// 运行独立的初始化流程，生成配置文件模板
pub fn run_init(force: bool) -> Result<()> {
    info!("🔎 Online DDL Checker 初始化");
    info!("============================");

    // 检查是否已经初始化过
    if !force && Path::new(DEFAULT_CONFIG_FILE).exists() {
        warn!("⚠️  检测到已存在的配置文件: {}", DEFAULT_CONFIG_FILE);
        info!("如果您要重新初始化，请使用 --force 参数");
        info!("示例: ddl-cli init --force");
        return Ok(());
    }

    let config = AppConfig::default();
    config.save_to_file(DEFAULT_CONFIG_FILE)?;
    info!("✅ 创建配置文件: {}", DEFAULT_CONFIG_FILE);
    info!("请填写 MySQL 连接信息后运行: ddl-cli check \"<DDL>\"");

    Ok(())
}
