use super::checker::OnlineDdlChecker;
use super::parser::DdlParser;
use super::types::{DdlAlgorithm, DdlCheckResult, DdlLock, ShadowTable};
use crate::error::{CheckerError, Result};
use crate::repository::MysqlRepository;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Mutex;

#[test]
fn test_find_table_name_basic_shapes() {
    let parser = DdlParser::new();

    assert_eq!(
        parser.find_table_name("ALTER TABLE user ADD COLUMN name VARCHAR(10)"),
        Some("user".to_string())
    );
    assert_eq!(
        parser.find_table_name("CREATE TABLE orders (id INT PRIMARY KEY)"),
        Some("orders".to_string())
    );
    assert_eq!(
        parser.find_table_name("DROP TABLE old_logs"),
        Some("old_logs".to_string())
    );
    assert_eq!(
        parser.find_table_name("RENAME TABLE user TO member"),
        Some("user".to_string())
    );
    assert_eq!(
        parser.find_table_name("TRUNCATE TABLE session"),
        Some("session".to_string())
    );
}

#[test]
fn test_find_table_name_strips_schema_and_backticks() {
    let parser = DdlParser::new();

    assert_eq!(
        parser.find_table_name("ALTER TABLE `main`.`user` ADD COLUMN age INT"),
        Some("user".to_string())
    );
    assert_eq!(
        parser.find_table_name("CREATE INDEX idx_name ON main.user (name)"),
        Some("user".to_string())
    );
}

#[test]
fn test_find_table_name_index_and_temporary() {
    let parser = DdlParser::new();

    assert_eq!(
        parser.find_table_name("CREATE UNIQUE INDEX idx_email ON user (email)"),
        Some("user".to_string())
    );
    assert_eq!(
        parser.find_table_name("DROP INDEX idx_email ON user"),
        Some("user".to_string())
    );
    assert_eq!(
        parser.find_table_name("CREATE TEMPORARY TABLE tmp_report (id INT)"),
        Some("tmp_report".to_string())
    );
    assert_eq!(
        parser.find_table_name("ALTER TABLE metrics PARTITION BY HASH(id) PARTITIONS 4"),
        Some("metrics".to_string())
    );
}

#[test]
fn test_find_table_name_normalizes_comments_and_whitespace() {
    let parser = DdlParser::new();

    assert_eq!(
        parser.find_table_name("/* deploy-1234 */  ALTER   TABLE\tuser ADD COLUMN age INT"),
        Some("user".to_string())
    );
}

#[test]
fn test_find_table_name_unrecognized_statement() {
    let parser = DdlParser::new();

    assert_eq!(parser.find_table_name("SELECT * FROM user"), None);
    assert_eq!(
        parser.find_table_name("GRANT ALL PRIVILEGES ON main.* TO 'app'@'%'"),
        None
    );
}

#[test]
fn test_is_index_related() {
    let parser = DdlParser::new();

    assert!(parser.is_index_related("CREATE UNIQUE INDEX idx ON t(c)"));
    assert!(parser.is_index_related("DROP INDEX idx ON t"));
    assert!(parser.is_index_related("ALTER TABLE t ADD INDEX idx_c (c)"));
    assert!(parser.is_index_related("ALTER TABLE t DROP PRIMARY KEY"));
    assert!(!parser.is_index_related("ALTER TABLE t ADD COLUMN c INT"));
    assert!(!parser.is_index_related("TRUNCATE TABLE t"));
}

#[test]
fn test_is_fk_related() {
    let parser = DdlParser::new();

    assert!(parser.is_fk_related("ALTER TABLE t ADD CONSTRAINT fk FOREIGN KEY (uid) REFERENCES user(id)"));
    assert!(parser.is_fk_related("ALTER TABLE t DROP FOREIGN KEY fk_user"));
    assert!(!parser.is_fk_related("ALTER TABLE t ADD COLUMN c INT"));
}

#[test]
fn test_rewrite_strips_mode_clauses_and_terminator() {
    let parser = DdlParser::new();

    let rewritten = parser
        .rewrite_for_shadow_table(
            "ALTER TABLE user ADD COLUMN age INT, ALGORITHM=INPLACE, LOCK=NONE;",
            "_test_user_1700000000000",
            &HashMap::new(),
        )
        .unwrap();

    assert!(rewritten.contains("_test_user_1700000000000"));
    assert!(!rewritten.to_uppercase().contains("ALGORITHM="));
    assert!(!rewritten.to_uppercase().contains("LOCK="));
    assert!(!rewritten.ends_with(';'));
}

#[test]
fn test_rewrite_replaces_whole_word_only() {
    let parser = DdlParser::new();

    let rewritten = parser
        .rewrite_for_shadow_table(
            "ALTER TABLE user ADD COLUMN user_id INT",
            "_test_user_1700000000000",
            &HashMap::new(),
        )
        .unwrap();

    // user_id 不是完整的表名出现，不能被误替换
    assert!(rewritten.contains("_test_user_1700000000000 ADD COLUMN user_id INT"));
}

#[test]
fn test_rewrite_fk_names_with_map() {
    let parser = DdlParser::new();
    let fk_name_map = HashMap::from([("fk_a".to_string(), "fk_a_test_123".to_string())]);

    let bare_fk_name = Regex::new(r"\bfk_a\b").unwrap();

    let dropped = parser
        .rewrite_for_shadow_table(
            "ALTER TABLE orders DROP FOREIGN KEY fk_a;",
            "_test_orders_1700000000000",
            &fk_name_map,
        )
        .unwrap();
    assert!(dropped.contains("fk_a_test_123"));
    assert!(!bare_fk_name.is_match(&dropped));

    let quoted = parser
        .rewrite_for_shadow_table(
            "ALTER TABLE orders ADD CONSTRAINT `fk_a` FOREIGN KEY (uid) REFERENCES user(id)",
            "_test_orders_1700000000000",
            &fk_name_map,
        )
        .unwrap();
    assert!(quoted.contains("CONSTRAINT `fk_a_test_123`"));
    assert!(!bare_fk_name.is_match(&quoted));
}

#[test]
fn test_rewrite_unrecognized_statement_fails() {
    let parser = DdlParser::new();

    let result = parser.rewrite_for_shadow_table("SELECT 1", "_test_x_1", &HashMap::new());

    assert!(matches!(result, Err(CheckerError::Parse(_))));
}

/// 内存桩网关，记录所有发往"服务器"的语句
#[derive(Default)]
struct MockRepository {
    version: String,
    engine: String,
    /// 服务器会接受的组合
    accepted: Vec<(DdlAlgorithm, DdlLock)>,
    fk_name_map: HashMap<String, String>,
    executed: Mutex<Vec<String>>,
    copied: Mutex<Vec<String>>,
    dropped: Mutex<Vec<String>>,
}

impl MockRepository {
    fn new(version: &str, engine: &str) -> Self {
        Self {
            version: version.to_string(),
            engine: engine.to_string(),
            ..Default::default()
        }
    }

    fn accept(mut self, algorithm: DdlAlgorithm, lock: DdlLock) -> Self {
        self.accepted.push((algorithm, lock));
        self
    }

    fn with_fk_name_map(mut self, fk_name_map: HashMap<String, String>) -> Self {
        self.fk_name_map = fk_name_map;
        self
    }

    fn shadow_name_for(origin: &str) -> String {
        format!("_test_{origin}_1700000000000")
    }
}

impl MysqlRepository for MockRepository {
    async fn get_mysql_version(&self) -> Result<String> {
        Ok(self.version.clone())
    }

    async fn get_table_engine(&self, _table_name: &str) -> Result<String> {
        Ok(self.engine.clone())
    }

    async fn copy_table_temporary(&self, origin_table_name: &str) -> Result<ShadowTable> {
        self.copied
            .lock()
            .unwrap()
            .push(origin_table_name.to_string());

        Ok(ShadowTable {
            name: Self::shadow_name_for(origin_table_name),
            origin_table: origin_table_name.to_string(),
            fk_name_map: self.fk_name_map.clone(),
        })
    }

    async fn drop_table_if_exists(&self, table_name: &str) -> Result<()> {
        self.dropped.lock().unwrap().push(table_name.to_string());
        Ok(())
    }

    async fn execute(&self, query: &str) -> Result<()> {
        self.executed.lock().unwrap().push(query.to_string());

        let accepted = self.accepted.iter().any(|(algorithm, lock)| {
            query.contains(&format!("ALGORITHM={}", algorithm.as_str()))
                && query.contains(&format!("LOCK={};", lock.as_str()))
        });

        if accepted {
            Ok(())
        } else {
            Err(CheckerError::statement(
                "this operation is not supported by the server",
            ))
        }
    }
}

fn checker(repo: MockRepository) -> OnlineDdlChecker<MockRepository> {
    OnlineDdlChecker::new(repo, DdlParser::new())
}

#[tokio::test]
async fn test_non_innodb_short_circuit() {
    let checker = checker(MockRepository::new("8.0.32", "MyISAM"));

    let result = checker
        .check_ddl("ALTER TABLE user ADD COLUMN name VARCHAR(10)")
        .await
        .unwrap();

    assert_eq!(
        result,
        DdlCheckResult {
            algorithm: DdlAlgorithm::Copy,
            lock: DdlLock::Exclusive,
            message: Some("Only InnoDB supports Online DDL".to_string()),
        }
    );

    // 不能创建影子表，也不能发出任何试探语句
    let repo = checker.into_repository();
    assert!(repo.copied.lock().unwrap().is_empty());
    assert!(repo.executed.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_instant_accepted_on_mysql8() {
    let checker = checker(
        MockRepository::new("8.0.32", "InnoDB")
            .accept(DdlAlgorithm::Instant, DdlLock::None)
            .accept(DdlAlgorithm::Inplace, DdlLock::None)
            .accept(DdlAlgorithm::Copy, DdlLock::Exclusive),
    );

    let result = checker
        .check_ddl("ALTER TABLE user ADD COLUMN name VARCHAR(10)")
        .await
        .unwrap();

    assert_eq!(result.algorithm, DdlAlgorithm::Instant);
    assert_eq!(result.lock, DdlLock::None);
    assert_eq!(result.message, None);

    // 第一个被接受即停，后续候选不再试
    let repo = checker.into_repository();
    assert_eq!(repo.executed.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_priority_ordering() {
    // INPLACE,NONE 和 COPY,EXCLUSIVE 都会被接受时，必须返回优先级更高的前者
    let checker = checker(
        MockRepository::new("8.0.32", "InnoDB")
            .accept(DdlAlgorithm::Inplace, DdlLock::None)
            .accept(DdlAlgorithm::Copy, DdlLock::Exclusive),
    );

    let result = checker
        .check_ddl("ALTER TABLE user MODIFY COLUMN name VARCHAR(30)")
        .await
        .unwrap();

    assert_eq!(result.algorithm, DdlAlgorithm::Inplace);
    assert_eq!(result.lock, DdlLock::None);
}

#[tokio::test]
async fn test_version_gate_skips_instant_below_8() {
    let checker = checker(
        MockRepository::new("5.7.44-log", "InnoDB")
            .accept(DdlAlgorithm::Instant, DdlLock::None)
            .accept(DdlAlgorithm::Inplace, DdlLock::None),
    );

    let result = checker
        .check_ddl("ALTER TABLE user ADD COLUMN name VARCHAR(10)")
        .await
        .unwrap();

    assert_eq!(result.algorithm, DdlAlgorithm::Inplace);
    assert_eq!(result.lock, DdlLock::None);

    let repo = checker.into_repository();
    for trial in repo.executed.lock().unwrap().iter() {
        assert!(!trial.contains("ALGORITHM=INSTANT"));
    }
}

#[tokio::test]
async fn test_index_ddl_joins_clauses_with_space() {
    let checker = checker(
        MockRepository::new("8.0.32", "InnoDB").accept(DdlAlgorithm::Instant, DdlLock::None),
    );

    checker
        .check_ddl("CREATE UNIQUE INDEX idx_email ON user (email)")
        .await
        .unwrap();

    let repo = checker.into_repository();
    let executed = repo.executed.lock().unwrap();
    assert!(executed[0].contains(" ALGORITHM=INSTANT LOCK=NONE;"));
    assert!(!executed[0].contains(", ALGORITHM="));
}

#[tokio::test]
async fn test_exhaustion_reports_last_rejection_and_cleans_up() {
    let checker = checker(MockRepository::new("8.0.32", "InnoDB"));

    let err = checker
        .check_ddl("ALTER TABLE user ADD COLUMN name VARCHAR(10)")
        .await
        .unwrap_err();

    assert!(matches!(err, CheckerError::Exhausted(_)));
    assert!(err.to_string().contains("not supported by the server"));

    let repo = checker.into_repository();
    // 五个候选全部试过
    assert_eq!(repo.executed.lock().unwrap().len(), 5);
    // 失败路径也必须删除影子表
    assert_eq!(
        repo.dropped.lock().unwrap().as_slice(),
        [MockRepository::shadow_name_for("user")]
    );
}

#[tokio::test]
async fn test_shadow_dropped_after_success() {
    let checker = checker(
        MockRepository::new("8.0.32", "InnoDB").accept(DdlAlgorithm::Instant, DdlLock::None),
    );

    checker
        .check_ddl("ALTER TABLE user ADD COLUMN name VARCHAR(10)")
        .await
        .unwrap();

    let repo = checker.into_repository();
    assert_eq!(
        repo.dropped.lock().unwrap().as_slice(),
        [MockRepository::shadow_name_for("user")]
    );
}

#[tokio::test]
async fn test_parse_failure_is_fatal_without_probing() {
    let checker = checker(MockRepository::new("8.0.32", "InnoDB"));

    let err = checker.check_ddl("SELECT 1").await.unwrap_err();

    assert!(matches!(err, CheckerError::Parse(_)));

    let repo = checker.into_repository();
    assert!(repo.copied.lock().unwrap().is_empty());
    assert!(repo.executed.lock().unwrap().is_empty());
    assert!(repo.dropped.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_trial_uses_remapped_fk_name() {
    let fk_name_map = HashMap::from([("fk_user".to_string(), "fk_user_test_9".to_string())]);
    let checker = checker(
        MockRepository::new("8.0.32", "InnoDB")
            .accept(DdlAlgorithm::Inplace, DdlLock::None)
            .with_fk_name_map(fk_name_map),
    );

    checker
        .check_ddl("ALTER TABLE orders DROP FOREIGN KEY fk_user;")
        .await
        .unwrap();

    let repo = checker.into_repository();
    let executed = repo.executed.lock().unwrap();
    assert!(executed.iter().all(|q| q.contains("fk_user_test_9")));
    assert!(
        executed
            .iter()
            .all(|q| q.contains(&MockRepository::shadow_name_for("orders")))
    );
}
