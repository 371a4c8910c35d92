//! 密钥生成与首次落盘
//!
//! 分两步：[`provision`] 只为空缺的密钥生成候选值，不修改配置；
//! [`PendingSecrets::commit`] 写入配置并立即保存，保存失败则整个加载失败。

use rand::{TryRngCore, rngs::OsRng};
use std::fmt;
use tracing::info;

use crate::config::Config;
use crate::error::ConfigError;

/// JWT 签名密钥长度
pub const JWT_SECRET_LEN: usize = 1024;
/// Agent 通信密钥长度
pub const AGENT_SECRET_LEN: usize = 32;

const CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// 生成指定长度的随机字符串（系统安全随机源）
pub fn generate_secret(len: usize) -> Result<String, ConfigError> {
    // 大于等于该值的字节丢弃，避免取模偏差
    let limit = (256 / CHARSET.len() * CHARSET.len()) as u8;

    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 64];
    while out.len() < len {
        OsRng
            .try_fill_bytes(&mut buf)
            .map_err(ConfigError::SecretGeneration)?;
        for &b in buf.iter().filter(|&&b| b < limit) {
            if out.len() == len {
                break;
            }
            out.push(CHARSET[b as usize % CHARSET.len()] as char);
        }
    }
    Ok(out)
}

/// 待写入的密钥
#[derive(Default)]
pub struct PendingSecrets {
    pub jwt_secret_key: Option<String>,
    pub agent_secret_key: Option<String>,
}

/// 为空缺的密钥生成候选值
pub fn provision(config: &Config) -> Result<PendingSecrets, ConfigError> {
    let mut pending = PendingSecrets::default();
    if config.jwt_secret_key.is_empty() {
        pending.jwt_secret_key = Some(generate_secret(JWT_SECRET_LEN)?);
    }
    if config.agent_secret_key.is_empty() {
        pending.agent_secret_key = Some(generate_secret(AGENT_SECRET_LEN)?);
    }
    Ok(pending)
}

// 只输出长度，不输出密钥本身
impl fmt::Debug for PendingSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingSecrets")
            .field("jwt_secret_key_len", &self.jwt_secret_key.as_ref().map(String::len))
            .field("agent_secret_key_len", &self.agent_secret_key.as_ref().map(String::len))
            .finish()
    }
}

impl PendingSecrets {
    pub fn is_empty(&self) -> bool {
        self.jwt_secret_key.is_none() && self.agent_secret_key.is_none()
    }

    /// 写入配置并保存到文件，返回是否发生了写入
    pub fn commit(self, config: &mut Config) -> Result<bool, ConfigError> {
        if self.is_empty() {
            return Ok(false);
        }

        if let Some(key) = self.jwt_secret_key {
            info!("已生成 JWTSecretKey (len={})", key.len());
            config.jwt_secret_key = key;
        }
        if let Some(key) = self.agent_secret_key {
            info!("已生成 AgentSecretKey (len={})", key.len());
            config.agent_secret_key = key;
        }

        config.save()?;
        Ok(true)
    }
}
