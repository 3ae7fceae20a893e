use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// MySQL Online DDL 预检工具
///
/// 在影子表上逐个试探 ALGORITHM/LOCK 组合，不触碰原表。
#[derive(Parser)]
#[command(name = "ddl-cli", version)]
pub struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "online-ddl-check.toml")]
    pub config: PathBuf,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 首次使用时初始化，生成配置文件模板
    Init {
        /// 如果配置文件已存在，强制覆盖
        #[arg(long)]
        force: bool,
    },
    /// 探测一条 DDL 可用的 ALGORITHM/LOCK 组合
    Check {
        /// 待探测的 DDL 语句
        ddl: String,

        /// 以 JSON 形式输出结果
        #[arg(long)]
        json: bool,
    },
}
