use crate::constants::mysql::{INNODB_ENGINE, INSTANT_MIN_MAJOR_VERSION};
use crate::ddl::parser::DdlParser;
use crate::ddl::types::{DdlAlgorithm, DdlCheckResult, DdlLock, DdlStrategy, ShadowTable};
use crate::error::{CheckerError, Result};
use crate::repository::MysqlRepository;
use tracing::{debug, info, warn};

/// 候选组合，按破坏性从小到大排列
///
/// 顺序即搜索算法：MySQL 对每条语句事实上存在能力上限，
/// 第一个被接受的组合就是答案，后面的组合不再尝试。
pub const ONLINE_DDL_STRATEGIES: [DdlStrategy; 5] = [
    DdlStrategy {
        algorithm: DdlAlgorithm::Instant,
        lock: DdlLock::None,
    },
    DdlStrategy {
        algorithm: DdlAlgorithm::Inplace,
        lock: DdlLock::None,
    },
    DdlStrategy {
        algorithm: DdlAlgorithm::Inplace,
        lock: DdlLock::Shared,
    },
    DdlStrategy {
        algorithm: DdlAlgorithm::Copy,
        lock: DdlLock::Shared,
    },
    DdlStrategy {
        algorithm: DdlAlgorithm::Copy,
        lock: DdlLock::Exclusive,
    },
];

/// Online DDL 探测器
///
/// 对影子表逐个试探候选组合，不会触碰原表。
pub struct OnlineDdlChecker<R: MysqlRepository> {
    repo: R,
    parser: DdlParser,
}

impl<R: MysqlRepository> OnlineDdlChecker<R> {
    pub fn new(repo: R, parser: DdlParser) -> Self {
        Self { repo, parser }
    }

    /// 归还底层网关，用于收尾断开连接
    pub fn into_repository(self) -> R {
        self.repo
    }

    /// 探测一条 DDL 可用的 ALGORITHM/LOCK 组合
    pub async fn check_ddl(&self, ddl_query: &str) -> Result<DdlCheckResult> {
        let target_table = self.parser.find_table_name(ddl_query).ok_or_else(|| {
            CheckerError::parse(format!("无法从 DDL 中识别目标表名: {ddl_query}"))
        })?;
        debug!("目标表: {}", target_table);

        let engine = self.repo.get_table_engine(&target_table).await?;
        debug!("表存储引擎: {}", engine);

        if engine != INNODB_ENGINE {
            // 非 InnoDB 不支持 Online DDL 子句，直接给出固定的最坏情况答案
            return Ok(DdlCheckResult {
                algorithm: DdlAlgorithm::Copy,
                lock: DdlLock::Exclusive,
                message: Some("Only InnoDB supports Online DDL".to_string()),
            });
        }

        let version = self.repo.get_mysql_version().await?;
        debug!("MySQL 版本: {}", version);
        let instant_supported = supports_instant(&version);

        let shadow = self.repo.copy_table_temporary(&target_table).await?;
        info!("影子表已创建: {}", shadow.name);

        // 影子表名一旦拿到，所有退出路径都必须删除它
        let result = self
            .probe_strategies(ddl_query, &shadow, instant_supported)
            .await;

        if let Err(drop_err) = self.repo.drop_table_if_exists(&shadow.name).await {
            warn!("清理影子表 {} 失败: {}", shadow.name, drop_err);
        }

        result
    }

    /// 按优先级逐个试探候选组合，第一个被接受的立即返回
    async fn probe_strategies(
        &self,
        ddl_query: &str,
        shadow: &ShadowTable,
        instant_supported: bool,
    ) -> Result<DdlCheckResult> {
        let modified_ddl =
            self.parser
                .rewrite_for_shadow_table(ddl_query, &shadow.name, &shadow.fk_name_map)?;

        // 索引类 DDL 的子句用空格连接，其余用逗号
        let separator = if self.parser.is_index_related(&modified_ddl) {
            " "
        } else {
            ", "
        };

        let mut last_rejection = String::from("未执行任何试探");

        for strategy in &ONLINE_DDL_STRATEGIES {
            if strategy.algorithm == DdlAlgorithm::Instant && !instant_supported {
                // 8.0 之前没有 INSTANT，服务器的报错会与语句本身非法混淆
                debug!("MySQL 版本过低，跳过 ALGORITHM=INSTANT");
                continue;
            }

            let trial_ddl = [
                modified_ddl.clone(),
                format!("ALGORITHM={}", strategy.algorithm),
                format!("LOCK={};", strategy.lock),
            ]
            .join(separator);

            debug!("试探: {}", trial_ddl);

            match self.repo.execute(&trial_ddl).await {
                Ok(()) => {
                    info!(
                        "服务器接受 ALGORITHM={}, LOCK={}",
                        strategy.algorithm, strategy.lock
                    );
                    return Ok(DdlCheckResult::from(*strategy));
                }
                Err(err) => {
                    // 被拒绝是常规控制流，记录后继续下一个候选
                    debug!(
                        "ALGORITHM={}, LOCK={} 被拒绝: {}",
                        strategy.algorithm, strategy.lock, err
                    );
                    last_rejection = err.to_string();
                }
            }
        }

        Err(CheckerError::Exhausted(last_rejection))
    }
}

/// 服务器版本是否支持 INSTANT 算法（8.0 起）
///
/// 版本串无法解析时按不支持处理，宁可跳过也不发出语义含糊的试探。
fn supports_instant(version: &str) -> bool {
    parse_major_minor(version).is_some_and(|(major, _)| major >= INSTANT_MIN_MAJOR_VERSION)
}

/// 从 "8.0.32-log" 这类版本串解析出 major.minor
fn parse_major_minor(version: &str) -> Option<(u32, u32)> {
    let mut parts = version.split('.');
    let major = leading_number(parts.next()?)?;
    let minor = parts.next().and_then(leading_number).unwrap_or(0);
    Some((major, minor))
}

fn leading_number(part: &str) -> Option<u32> {
    let digits: String = part
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}
