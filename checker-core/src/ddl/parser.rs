use crate::error::{CheckerError, Result};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use std::collections::HashMap;

/// 表名提取用的语句形态列表（正则 + 表名所在捕获组），进程级只读常量
static TABLE_NAME_PATTERNS: Lazy<Vec<(Regex, usize)>> = Lazy::new(|| {
    vec![
        // ALTER/CREATE/DROP/RENAME/TRUNCATE TABLE
        (
            Regex::new(r"(?i)^(ALTER|CREATE|DROP|RENAME|TRUNCATE)\s+TABLE\s+(\w+\.)?(\w+)")
                .unwrap(),
            3,
        ),
        // INDEX
        (
            Regex::new(r"(?i)^(CREATE|DROP)\s+(UNIQUE\s+)?INDEX\s+.+\s+ON\s+(\w+\.)?(\w+)")
                .unwrap(),
            4,
        ),
        // TEMPORARY TABLE
        (
            Regex::new(r"(?i)^CREATE\s+TEMPORARY\s+TABLE\s+(\w+\.)?(\w+)").unwrap(),
            2,
        ),
        // PARTITION
        (
            Regex::new(r"(?i)^ALTER\s+TABLE\s+(\w+\.)?(\w+)\s+(PARTITION|COALESCE)").unwrap(),
            2,
        ),
    ]
});

/// 索引相关语句的形态列表
static INDEX_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(?i)^CREATE\s+(UNIQUE\s+)?INDEX").unwrap(),
        Regex::new(r"(?i)^DROP\s+INDEX").unwrap(),
        Regex::new(r"(?i)^ALTER\s+TABLE\s+.+\s+(ADD|DROP)\s+(INDEX|KEY|PRIMARY\s+KEY|UNIQUE)")
            .unwrap(),
        Regex::new(r"(?i)^CREATE\s+TABLE\s+.+\s+\(.*(INDEX|KEY|PRIMARY\s+KEY|UNIQUE)\s+").unwrap(),
    ]
});

static FK_RELATED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(FOREIGN\s+KEY|CONSTRAINT|REFERENCES)").unwrap());

static BLOCK_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*.*?\*/").unwrap());
static MULTI_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static STRIP_ALGORITHM_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),\s*ALGORITHM\s*=\s*[A-Z]+").unwrap());
static STRIP_LOCK_CLAUSE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i),\s*LOCK\s*=\s*[A-Z]+").unwrap());
static TRAILING_SEMICOLON: Lazy<Regex> = Lazy::new(|| Regex::new(r";$").unwrap());

/// DDL 语句分析器
///
/// 基于语句形态列表做尽力而为的识别，不是完整 SQL 语法。
/// 识别不了的语句一律返回 None，由上层判定为解析失败，不做猜测。
#[derive(Debug, Default, Clone)]
pub struct DdlParser;

impl DdlParser {
    pub fn new() -> Self {
        Self
    }

    /// 从 DDL 中提取目标表名（去掉 schema 前缀和反引号）
    pub fn find_table_name(&self, ddl_query: &str) -> Option<String> {
        let normalized = Self::normalize(ddl_query);

        for (pattern, group) in TABLE_NAME_PATTERNS.iter() {
            if let Some(captures) = pattern.captures(&normalized) {
                if let Some(name) = captures.get(*group) {
                    // 捕获组本身不含 schema 前缀，split 仅作兜底
                    return name.as_str().split('.').next_back().map(String::from);
                }
            }
        }

        None
    }

    /// 是否索引相关语句
    ///
    /// MySQL 要求索引类 DDL 的 ALGORITHM/LOCK 子句用空格连接而非逗号，
    /// 判断错误会生成语法非法的试探语句。
    pub fn is_index_related(&self, ddl_query: &str) -> bool {
        INDEX_PATTERNS
            .iter()
            .any(|pattern| pattern.is_match(ddl_query))
    }

    /// 是否外键相关语句
    pub fn is_fk_related(&self, ddl_query: &str) -> bool {
        FK_RELATED.is_match(ddl_query)
    }

    /// 把 DDL 改写为针对影子表执行的版本
    ///
    /// 替换第一个完整出现的原表名，剥掉已有的 ALGORITHM/LOCK 子句和结尾分号；
    /// 外键相关语句按映射表把原约束名改写为影子表上的新约束名。
    ///
    /// 约束名改写是文本级替换，识别不了藏在字符串字面量中的名字，
    /// 调用方默认是受信的内部操作者。
    pub fn rewrite_for_shadow_table(
        &self,
        ddl_query: &str,
        shadow_name: &str,
        fk_name_map: &HashMap<String, String>,
    ) -> Result<String> {
        let origin_table = self
            .find_table_name(ddl_query)
            .ok_or_else(|| CheckerError::parse(format!("无法从 DDL 中识别目标表名: {ddl_query}")))?;

        let table_pattern = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(&origin_table)))
            .map_err(|e| CheckerError::custom(format!("正则表达式编译失败: {e}")))?;

        let mut result = table_pattern
            .replace(ddl_query, NoExpand(shadow_name))
            .into_owned();
        result = STRIP_ALGORITHM_CLAUSE.replace(&result, "").into_owned();
        result = STRIP_LOCK_CLAUSE.replace(&result, "").into_owned();
        result = TRAILING_SEMICOLON.replace(&result, "").into_owned();

        if !self.is_fk_related(&result) || fk_name_map.is_empty() {
            return Ok(result);
        }

        for (original_fk_name, new_fk_name) in fk_name_map {
            result = Self::rewrite_fk_name(&result, original_fk_name, new_fk_name)?;
        }

        Ok(result)
    }

    /// 改写单个外键约束名
    ///
    /// 覆盖 FOREIGN KEY / CONSTRAINT / DROP FOREIGN KEY 三种子句，
    /// 各自支持裸名、反引号和双引号写法，改写后统一输出反引号形式。
    fn rewrite_fk_name(ddl: &str, original_fk_name: &str, new_fk_name: &str) -> Result<String> {
        let escaped = regex::escape(original_fk_name);

        let rules = [
            (
                format!(r"(?i)FOREIGN\s+KEY\s+{escaped}\b"),
                format!("FOREIGN KEY `{new_fk_name}`"),
            ),
            (
                format!(r"(?i)FOREIGN\s+KEY\s+`{escaped}`"),
                format!("FOREIGN KEY `{new_fk_name}`"),
            ),
            (
                format!(r#"(?i)FOREIGN\s+KEY\s+"{escaped}""#),
                format!("FOREIGN KEY `{new_fk_name}`"),
            ),
            (
                format!(r"(?i)CONSTRAINT\s+{escaped}\b"),
                format!("CONSTRAINT `{new_fk_name}`"),
            ),
            (
                format!(r"(?i)CONSTRAINT\s+`{escaped}`"),
                format!("CONSTRAINT `{new_fk_name}`"),
            ),
            (
                format!(r#"(?i)CONSTRAINT\s+"{escaped}""#),
                format!("CONSTRAINT `{new_fk_name}`"),
            ),
            (
                format!(r"(?i)DROP\s+FOREIGN\s+KEY\s+{escaped}\b"),
                format!("DROP FOREIGN KEY `{new_fk_name}`"),
            ),
            (
                format!(r"(?i)DROP\s+FOREIGN\s+KEY\s+`{escaped}`"),
                format!("DROP FOREIGN KEY `{new_fk_name}`"),
            ),
            (
                format!(r#"(?i)DROP\s+FOREIGN\s+KEY\s+"{escaped}""#),
                format!("DROP FOREIGN KEY `{new_fk_name}`"),
            ),
        ];

        let mut result = ddl.to_string();
        for (pattern, replacement) in &rules {
            let regex = Regex::new(pattern)
                .map_err(|e| CheckerError::custom(format!("正则表达式编译失败: {e}")))?;
            if regex.is_match(&result) {
                result = regex
                    .replace(&result, NoExpand(replacement.as_str()))
                    .into_owned();
            }
        }

        Ok(result)
    }

    /// 归一化：去块注释、折叠空白、去首尾空白、去反引号
    fn normalize(ddl_query: &str) -> String {
        let without_comments = BLOCK_COMMENT.replace_all(ddl_query, "");
        let collapsed = MULTI_WHITESPACE.replace_all(&without_comments, " ");
        collapsed.trim().replace('`', "")
    }
}
