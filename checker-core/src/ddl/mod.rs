pub mod checker;
pub mod parser;
pub mod types;

#[cfg(test)]
mod tests;

// 重新导出公共接口
pub use checker::{ONLINE_DDL_STRATEGIES, OnlineDdlChecker};
pub use parser::DdlParser;
pub use types::{DdlAlgorithm, DdlCheckResult, DdlLock, DdlStrategy, ShadowTable};
