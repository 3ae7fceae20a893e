use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Online DDL 执行算法，按破坏性从小到大排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DdlAlgorithm {
    Instant,
    Inplace,
    Copy,
}

/// DDL 执行期间的表锁级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DdlLock {
    None,
    Shared,
    Exclusive,
}

impl DdlAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            DdlAlgorithm::Instant => "INSTANT",
            DdlAlgorithm::Inplace => "INPLACE",
            DdlAlgorithm::Copy => "COPY",
        }
    }
}

impl DdlLock {
    pub fn as_str(&self) -> &'static str {
        match self {
            DdlLock::None => "NONE",
            DdlLock::Shared => "SHARED",
            DdlLock::Exclusive => "EXCLUSIVE",
        }
    }
}

impl fmt::Display for DdlAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DdlLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 一个待试探的 ALGORITHM/LOCK 组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdlStrategy {
    pub algorithm: DdlAlgorithm,
    pub lock: DdlLock,
}

/// 探测结果，message 仅在非 InnoDB 短路时出现
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DdlCheckResult {
    pub algorithm: DdlAlgorithm,
    pub lock: DdlLock,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<DdlStrategy> for DdlCheckResult {
    fn from(strategy: DdlStrategy) -> Self {
        Self {
            algorithm: strategy.algorithm,
            lock: strategy.lock,
            message: None,
        }
    }
}

/// 外键约束描述，复合外键由多行目录信息按约束名合并而来
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyConstraint {
    pub name: String,
    pub columns: Vec<String>,
    pub referenced_table: String,
    pub referenced_columns: Vec<String>,
    pub update_rule: String,
    pub delete_rule: String,
}

/// 影子表句柄
///
/// 创建成功后立即记录表名，探测会话结束时无论成败都必须删除。
#[derive(Debug, Clone)]
pub struct ShadowTable {
    pub name: String,
    pub origin_table: String,
    /// 原外键约束名 -> 影子表上的新约束名
    pub fk_name_map: HashMap<String, String>,
}
