/// 配置文件相关常量
pub mod config {
    /// 按优先级查找的配置文件名
    pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [
        "online-ddl-check.toml",
        ".online-ddl-check.toml",
        "config.toml",
    ];

    /// `init` 生成的默认配置文件名
    pub const DEFAULT_CONFIG_FILE: &str = "online-ddl-check.toml";

    /// MySQL 默认端口
    pub const DEFAULT_MYSQL_PORT: u16 = 3306;
}

/// 影子表相关常量
pub mod shadow {
    /// 影子表名前缀（前缀 + 原表名 + 毫秒时间戳，避免并发会话冲突）
    pub const SHADOW_TABLE_PREFIX: &str = "_test_";

    /// 重命名外键约束时插入的标记
    pub const CONSTRAINT_SUFFIX_TAG: &str = "_test_";
}

/// MySQL 服务器相关常量
pub mod mysql {
    /// 支持 Online DDL 的唯一存储引擎
    pub const INNODB_ENGINE: &str = "InnoDB";

    /// INSTANT 算法要求的最低主版本号
    pub const INSTANT_MIN_MAJOR_VERSION: u32 = 8;
}
