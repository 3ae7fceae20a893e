pub mod config;
pub mod constants;
pub mod ddl;
pub mod error;
pub mod repository;

pub use ddl::checker::OnlineDdlChecker;
pub use ddl::parser::DdlParser;
pub use ddl::types::{DdlAlgorithm, DdlCheckResult, DdlLock, DdlStrategy, ShadowTable};
pub use error::{CheckerError, Result};
pub use repository::{MysqlRepository, mysql::MysqlGateway};
