use crate::config::ConnectionConfig;
use crate::constants::shadow::{CONSTRAINT_SUFFIX_TAG, SHADOW_TABLE_PREFIX};
use crate::ddl::types::{ForeignKeyConstraint, ShadowTable};
use crate::error::{CheckerError, Result};
use crate::repository::MysqlRepository;
use chrono::Utc;
use mysql_async::prelude::*;
use mysql_async::{Conn, Opts, OptsBuilder, Row};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// 原表上声明的外键约束查询，复合外键占多行，按约束名与列序号排序
const FK_QUERY: &str = r"
SELECT
    k.CONSTRAINT_NAME,
    k.COLUMN_NAME,
    k.REFERENCED_TABLE_NAME,
    k.REFERENCED_COLUMN_NAME,
    r.UPDATE_RULE,
    r.DELETE_RULE
FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE k
INNER JOIN INFORMATION_SCHEMA.REFERENTIAL_CONSTRAINTS r
    ON k.CONSTRAINT_NAME = r.CONSTRAINT_NAME
WHERE
    k.TABLE_SCHEMA = DATABASE()
    AND k.TABLE_NAME = ?
    AND k.REFERENCED_TABLE_NAME IS NOT NULL
ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION";

/// 基于 mysql_async 的数据库网关
///
/// 持有单条连接：foreign_key_checks 是会话级开关，
/// 影子表重建外键期间必须和后续语句跑在同一个会话里。
pub struct MysqlGateway {
    conn: Mutex<Conn>,
}

impl MysqlGateway {
    /// 按配置建立连接
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let opts: Opts = OptsBuilder::default()
            .ip_or_hostname(config.host.clone())
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()))
            .into();

        let conn = Conn::new(opts)
            .await
            .map_err(|e| CheckerError::connectivity(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// 优雅断开连接
    pub async fn close(self) -> Result<()> {
        self.conn.into_inner().disconnect().await?;
        Ok(())
    }

    /// 查询原表外键并在影子表上以新名字重建，返回新旧名映射
    async fn rebuild_foreign_keys(
        conn: &mut Conn,
        origin_table_name: &str,
        shadow_name: &str,
    ) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, String, String, String, String, String)> =
            conn.exec(FK_QUERY, (origin_table_name,)).await?;

        let constraints = group_foreign_keys(rows);
        let mut fk_name_map = HashMap::new();

        if constraints.is_empty() {
            return Ok(fk_name_map);
        }

        // 重建期间临时关闭外键检查，避免影响原库的数据校验
        conn.query_drop("SET SESSION foreign_key_checks = 0")
            .await?;

        let mut rebuild_result: Result<()> = Ok(());

        for fk in &constraints {
            let new_name = format!(
                "{}{}{}",
                fk.name,
                CONSTRAINT_SUFFIX_TAG,
                Utc::now().timestamp_millis()
            );

            let alter_statement = format!(
                "ALTER TABLE {shadow_name} \
                 ADD CONSTRAINT {new_name} \
                 FOREIGN KEY ({columns}) \
                 REFERENCES {referenced_table}({referenced_columns}) \
                 ON UPDATE {update_rule} \
                 ON DELETE {delete_rule}",
                columns = fk.columns.join(", "),
                referenced_table = fk.referenced_table,
                referenced_columns = fk.referenced_columns.join(", "),
                update_rule = fk.update_rule,
                delete_rule = fk.delete_rule,
            );

            if let Err(e) = conn.query_drop(alter_statement).await {
                rebuild_result = Err(CheckerError::provisioning(format!(
                    "外键 '{}' 重建失败: {e}",
                    fk.name
                )));
                break;
            }

            info!("外键 '{}' 已添加 (原约束: '{}')", new_name, fk.name);
            fk_name_map.insert(fk.name.clone(), new_name);
        }

        // 无论重建成败都恢复外键检查，连接还要继续服务后续试探
        conn.query_drop("SET SESSION foreign_key_checks = 1")
            .await?;

        rebuild_result?;
        Ok(fk_name_map)
    }
}

impl MysqlRepository for MysqlGateway {
    async fn get_mysql_version(&self) -> Result<String> {
        let mut conn = self.conn.lock().await;

        let version: Option<String> = conn.query_first("SELECT VERSION()").await?;

        version.ok_or_else(|| CheckerError::connectivity("无法获取 MySQL 版本"))
    }

    async fn get_table_engine(&self, table_name: &str) -> Result<String> {
        let mut conn = self.conn.lock().await;

        let row: Option<Row> = conn
            .query_first(format!("SHOW TABLE STATUS LIKE '{table_name}'"))
            .await?;

        // Engine 列对视图为 NULL，和表不存在一并按 NotFound 处理
        row.and_then(|mut r| r.take_opt::<String, _>("Engine"))
            .and_then(|engine| engine.ok())
            .ok_or_else(|| CheckerError::not_found(format!("表不存在 (table: '{table_name}')")))
    }

    async fn copy_table_temporary(&self, origin_table_name: &str) -> Result<ShadowTable> {
        let mut conn = self.conn.lock().await;

        // 毫秒时间戳作为唯一性标记，支撑并发会话各用各的影子表
        let shadow_name = format!(
            "{}{}_{}",
            SHADOW_TABLE_PREFIX,
            origin_table_name,
            Utc::now().timestamp_millis()
        );

        // 结构性复制：列、类型、索引，不含数据和外键
        conn.query_drop(format!(
            "CREATE TABLE {shadow_name} LIKE {origin_table_name}"
        ))
        .await
        .map_err(|e| CheckerError::provisioning(e.to_string()))?;

        // 从这里起影子表已存在，重建外键失败时先回收再上抛
        match Self::rebuild_foreign_keys(&mut conn, origin_table_name, &shadow_name).await {
            Ok(fk_name_map) => Ok(ShadowTable {
                name: shadow_name,
                origin_table: origin_table_name.to_string(),
                fk_name_map,
            }),
            Err(err) => {
                if let Err(drop_err) = conn
                    .query_drop(format!("DROP TABLE IF EXISTS {shadow_name}"))
                    .await
                {
                    warn!("回收部分创建的影子表 {} 失败: {}", shadow_name, drop_err);
                }
                match err {
                    e @ CheckerError::Provisioning(_) => Err(e),
                    other => Err(CheckerError::provisioning(other.to_string())),
                }
            }
        }
    }

    async fn drop_table_if_exists(&self, table_name: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;

        conn.query_drop(format!("DROP TABLE IF EXISTS {table_name}"))
            .await?;
        debug!("已删除表（如存在）: {}", table_name);

        Ok(())
    }

    async fn execute(&self, query: &str) -> Result<()> {
        let mut conn = self.conn.lock().await;

        conn.query_drop(query).await?;

        Ok(())
    }
}

/// 把多行目录查询结果按约束名合并为复合外键描述
fn group_foreign_keys(
    rows: Vec<(String, String, String, String, String, String)>,
) -> Vec<ForeignKeyConstraint> {
    let mut constraints: Vec<ForeignKeyConstraint> = Vec::new();

    for (name, column, referenced_table, referenced_column, update_rule, delete_rule) in rows {
        match constraints.iter_mut().find(|fk| fk.name == name) {
            Some(fk) => {
                fk.columns.push(column);
                fk.referenced_columns.push(referenced_column);
            }
            None => constraints.push(ForeignKeyConstraint {
                name,
                columns: vec![column],
                referenced_table,
                referenced_columns: vec![referenced_column],
                update_rule,
                delete_rule,
            }),
        }
    }

    constraints
}
