use crate::constants::config::{CONFIG_FILE_CANDIDATES, DEFAULT_MYSQL_PORT};
use crate::error::{CheckerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use toml;

/// 应用配置结构
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub connection: ConnectionConfig,
}

/// MySQL 连接配置
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            connection: ConnectionConfig {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_MYSQL_PORT,
                user: String::new(),
                password: String::new(),
                database: String::new(),
            },
        }
    }
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：online-ddl-check.toml -> .online-ddl-check.toml -> config.toml
    pub fn find_and_load_config() -> Result<Self> {
        for config_file in &CONFIG_FILE_CANDIDATES {
            if Path::new(config_file).exists() {
                tracing::info!("找到配置文件: {}", config_file);
                return Self::load_from_file(config_file);
            }
        }

        Err(CheckerError::ConfigNotFound)
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;

        config.validate()?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml_with_comments();
        fs::write(&path, content)?;
        Ok(())
    }

    /// 校验连接配置，空字符串和 0 端口都视为无效
    pub fn validate(&self) -> Result<()> {
        let conn = &self.connection;

        Self::check_not_empty("host", &conn.host)?;
        Self::check_not_empty("user", &conn.user)?;
        Self::check_not_empty("password", &conn.password)?;
        Self::check_not_empty("database", &conn.database)?;

        if conn.port == 0 {
            return Err(CheckerError::invalid_config(
                "配置项 \"port\" 必须是有效的端口号",
            ));
        }

        Ok(())
    }

    fn check_not_empty(key: &str, value: &str) -> Result<()> {
        if value.is_empty() {
            return Err(CheckerError::invalid_config(format!(
                "配置项 \"{key}\" 不能为空字符串"
            )));
        }
        Ok(())
    }

    /// 生成带注释的TOML配置
    fn to_toml_with_comments(&self) -> String {
        const TEMPLATE: &str = include_str!("../templates/config.toml.template");

        TEMPLATE
            .replace("{host}", &self.connection.host)
            .replace("{port}", &self.connection.port.to_string())
            .replace("{user}", &self.connection.user)
            .replace("{password}", &self.connection.password)
            .replace("{database}", &self.connection.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[connection]
host = "127.0.0.1"
port = 3306
user = "testuser"
password = "testpassword"
database = "main"
"#;
        let config: AppConfig = toml::from_str(content).unwrap();
        config.validate().unwrap();

        assert_eq!(config.connection.host, "127.0.0.1");
        assert_eq!(config.connection.port, 3306);
        assert_eq!(config.connection.database, "main");
    }

    #[test]
    fn test_empty_string_rejected() {
        let mut config = AppConfig::default();
        config.connection.host = "localhost".to_string();
        config.connection.user = "root".to_string();
        config.connection.password = String::new();
        config.connection.database = "main".to_string();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("password"));
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = AppConfig::default();
        config.connection.user = "root".to_string();
        config.connection.password = "pw".to_string();
        config.connection.database = "main".to_string();
        config.connection.port = 0;

        assert!(config.validate().is_err());
    }
}
