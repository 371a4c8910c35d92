//! dashboard-config - 面板配置核心
//!
//! 负责读取 YAML 配置文件、填充默认值、首次运行时生成密钥并落盘、
//! 维护由 IgnoredIPNotification 派生的服务器 ID 集合，以及写回原路径。
//!
//! 本 crate 不做内部同步：多个子系统并发修改与保存时，由嵌入方自行加锁。

pub mod catalog;
pub mod config;
pub mod error;
pub mod ignored;
pub mod logging;
pub mod secret;

pub use catalog::{Cover, OauthProvider};
pub use config::Config;
pub use error::ConfigError;
pub use logging::{LogOptions, init_logging};
pub use secret::{AGENT_SECRET_LEN, JWT_SECRET_LEN};
