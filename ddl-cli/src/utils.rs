/// 设置日志记录
///
/// - 库代码只使用 `tracing` 宏，日志配置由应用入口控制
/// - 默认输出到 stderr，探测结果走 stdout，互不干扰
/// - `RUST_LOG` 可覆盖日志级别
/// - `DDL_CHECK_LOG_FILE` 设置后日志输出到文件而非终端
pub fn setup_logging(verbose: bool) {
    use tracing_subscriber::{EnvFilter, fmt};

    // 根据verbose参数和环境变量确定日志级别
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 检查环境变量，决定是否输出到文件
    if let Ok(log_file) = std::env::var("DDL_CHECK_LOG_FILE") {
        // 输出到文件 - 使用详细格式便于调试
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .expect("Failed to create log file");

        fmt()
            .with_env_filter(env_filter)
            .with_writer(file)
            .with_target(true)
            .with_line_number(true)
            .init();
    } else {
        // 输出到终端 - 使用简洁格式，写到 stderr
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .compact()
            .init();
    }
}
