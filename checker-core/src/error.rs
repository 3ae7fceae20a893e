use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckerError>;

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("配置错误: {0}")]
    Config(#[from] toml::de::Error),

    #[error("配置文件未找到")]
    ConfigNotFound,

    #[error("配置无效: {0}")]
    InvalidConfig(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("DDL 解析失败: {0}")]
    Parse(String),

    #[error("MySQL 连接错误: {0}")]
    Connectivity(String),

    #[error("表未找到: {0}")]
    NotFound(String),

    #[error("影子表创建失败: {0}")]
    Provisioning(String),

    #[error("语句被服务器拒绝: {0}")]
    Statement(String),

    #[error("找不到该语句可用的 Online DDL 算法与锁组合 (最后一次拒绝: {0})")]
    Exhausted(String),

    #[error("自定义错误: {0}")]
    Custom(String),
}

// 服务端拒绝与传输层故障分别映射，保留服务器原始消息
impl From<mysql_async::Error> for CheckerError {
    fn from(err: mysql_async::Error) -> Self {
        match err {
            mysql_async::Error::Server(e) => CheckerError::Statement(e.to_string()),
            other => CheckerError::Connectivity(other.to_string()),
        }
    }
}

impl CheckerError {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn connectivity(msg: impl Into<String>) -> Self {
        Self::Connectivity(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn provisioning(msg: impl Into<String>) -> Self {
        Self::Provisioning(msg.into())
    }

    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }
}
