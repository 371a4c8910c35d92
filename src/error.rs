//! 配置错误类型

use std::path::PathBuf;
use thiserror::Error;

/// 配置加载/保存过程中可能出现的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("无法读取配置文件 {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// 配置文件内容无法解析
    #[error("无法解析配置文件 {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// 系统随机源不可用
    #[error("密钥生成失败: {0}")]
    SecretGeneration(#[source] rand::rand_core::OsError),

    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    Serialize(#[source] serde_yaml::Error),

    /// 写入配置文件失败
    #[error("无法写入配置文件 {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    /// 配置对象不是从文件加载的，没有可保存的路径
    #[error("配置未关联文件路径，无法保存")]
    MissingPath,
}
