pub mod mysql;

use crate::ddl::types::ShadowTable;
use crate::error::Result;

pub use mysql::MysqlGateway;

/// 数据库网关契约
///
/// 核心逻辑唯一触达真实连接的边界，测试用内存桩实现。
#[allow(async_fn_in_trait)]
pub trait MysqlRepository {
    /// 查询服务器版本串（SELECT VERSION()）
    async fn get_mysql_version(&self) -> Result<String>;

    /// 查询表的存储引擎，表不存在时返回 NotFound
    async fn get_table_engine(&self, table_name: &str) -> Result<String>;

    /// 为原表创建结构性影子副本（含重命名后的外键约束）
    async fn copy_table_temporary(&self, origin_table_name: &str) -> Result<ShadowTable>;

    /// 删除表，表不存在不算错误
    async fn drop_table_if_exists(&self, table_name: &str) -> Result<()>;

    /// 执行一条语句，服务器拒绝时返回携带原始消息的 Statement 错误
    async fn execute(&self, query: &str) -> Result<()>;
}
