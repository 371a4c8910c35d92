//! 配置模块

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::HashSet;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::catalog::{self, Cover};
use crate::error::ConfigError;
use crate::ignored::parse_server_ids;
use crate::secret;

/// 面板配置
///
/// 读取时键名不区分大小写，写入时使用标准键名。未知键忽略，缺失键取零值。
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(rename = "Debug")]
    pub debug: bool,

    /// 系统语言，默认 zh-CN
    #[serde(rename = "Language")]
    pub language: String,
    #[serde(rename = "SiteName")]
    pub site_name: String,
    #[serde(rename = "JWTSecretKey")]
    pub jwt_secret_key: String,
    #[serde(rename = "AgentSecretKey")]
    pub agent_secret_key: String,
    #[serde(rename = "ListenPort")]
    pub listen_port: u16,
    #[serde(rename = "InstallHost")]
    pub install_host: String,
    #[serde(rename = "TLS")]
    pub tls: bool,
    /// 时区，默认 Asia/Shanghai
    #[serde(rename = "Location")]
    pub location: String,

    /// 通知中的 IP 不打码
    #[serde(rename = "EnablePlainIPInNotification")]
    pub enable_plain_ip_in_notification: bool,

    // IP 变更提醒
    #[serde(rename = "EnableIPChangeNotification")]
    pub enable_ip_change_notification: bool,
    #[serde(rename = "IPChangeNotificationTag")]
    pub ip_change_notification_tag: String,
    #[serde(rename = "Cover")]
    pub cover: Cover,
    /// 特定服务器 ID，逗号分隔
    #[serde(rename = "IgnoredIPNotification")]
    pub ignored_ip_notification: String,

    /// 由 `ignored_ip_notification` 派生的缓存，每次加载/保存时整体重建，不落盘
    #[serde(skip)]
    ignored_ip_notification_server_ids: HashSet<u64>,

    #[serde(rename = "AvgPingCount")]
    pub avg_ping_count: i64,
    #[serde(rename = "DNSServers")]
    pub dns_servers: String,

    /// 加载来源，保存时写回此路径
    #[serde(skip)]
    path: PathBuf,
}

/// 文件中的标准键名
const FILE_KEYS: &[&str] = &[
    "Debug",
    "Language",
    "SiteName",
    "JWTSecretKey",
    "AgentSecretKey",
    "ListenPort",
    "InstallHost",
    "TLS",
    "Location",
    "EnablePlainIPInNotification",
    "EnableIPChangeNotification",
    "IPChangeNotificationTag",
    "Cover",
    "IgnoredIPNotification",
    "AvgPingCount",
    "DNSServers",
];

/// 把顶层键按不区分大小写的方式映射为标准键名，其余键原样保留
///
/// 同一字段出现多种大小写写法时，以文件中靠后的为准。
fn canonicalize_keys(value: Value) -> Value {
    let Value::Mapping(mapping) = value else {
        return value;
    };

    let mut out = Mapping::with_capacity(mapping.len());
    for (key, val) in mapping {
        let key = match key {
            Value::String(name) => Value::String(
                FILE_KEYS
                    .iter()
                    .find(|k| k.eq_ignore_ascii_case(&name))
                    .map_or(name, |k| (*k).to_string()),
            ),
            other => other,
        };
        out.insert(key, val);
    }
    Value::Mapping(out)
}

// 默认值
const DEFAULT_LANGUAGE: &str = "zh-CN";
const DEFAULT_LOCATION: &str = "Asia/Shanghai";
const DEFAULT_LISTEN_PORT: u16 = 8008;
const DEFAULT_AVG_PING_COUNT: i64 = 2;
const DEFAULT_IP_CHANGE_TAG: &str = "default";

impl Config {
    /// 读取配置文件并应用默认值
    ///
    /// 缺少密钥时会生成并立即写回同一文件，写回失败则加载失败。
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(path, &content)
    }

    /// 解析已读入的文件内容，后续步骤与 [`Config::load`] 相同
    fn from_source(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let parse_error = |source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        };

        let mut config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            match serde_yaml::from_str::<Value>(content).map_err(parse_error)? {
                Value::Null => Self::default(),
                value => serde_yaml::from_value(canonicalize_keys(value)).map_err(parse_error)?,
            }
        };
        config.path = path.to_path_buf();

        config.apply_defaults();

        let pending = secret::provision(&config)?;
        if pending.commit(&mut config)? {
            info!("新生成的密钥已写入 {}", path.display());
        }

        config.refresh_ignored_server_ids();
        debug!(
            "配置已加载: {} (ignored servers={})",
            path.display(),
            config.ignored_ip_notification_server_ids.len()
        );
        Ok(config)
    }

    /// 保存到加载时的路径（权限 0600）
    pub fn save(&mut self) -> Result<(), ConfigError> {
        self.refresh_ignored_server_ids();

        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingPath);
        }

        let data = serde_yaml::to_string(self).map_err(ConfigError::Serialize)?;
        write_restricted_file(&self.path, data.as_bytes()).map_err(|source| {
            ConfigError::Write {
                path: self.path.clone(),
                source,
            }
        })?;

        debug!("配置已保存: {}", self.path.display());
        Ok(())
    }

    /// 填充空缺的标量字段
    pub fn apply_defaults(&mut self) {
        if self.listen_port == 0 {
            self.listen_port = DEFAULT_LISTEN_PORT;
        }
        if self.language.is_empty() {
            self.language = DEFAULT_LANGUAGE.to_string();
        }
        if self.enable_ip_change_notification && self.ip_change_notification_tag.is_empty() {
            self.ip_change_notification_tag = DEFAULT_IP_CHANGE_TAG.to_string();
        }
        if self.location.is_empty() {
            self.location = DEFAULT_LOCATION.to_string();
        }
        if self.avg_ping_count == 0 {
            self.avg_ping_count = DEFAULT_AVG_PING_COUNT;
        }
    }

    /// 按 `ignored_ip_notification` 重建特定服务器集合
    pub fn refresh_ignored_server_ids(&mut self) {
        self.ignored_ip_notification_server_ids = parse_server_ids(&self.ignored_ip_notification);
    }

    pub fn ignored_server_ids(&self) -> &HashSet<u64> {
        &self.ignored_ip_notification_server_ids
    }

    /// 配置文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 该服务器 IP 变更时是否需要提醒（按 Cover 覆盖范围判断）
    pub fn covers_ip_change(&self, server_id: u64) -> bool {
        self.cover
            .covers(self.ignored_ip_notification_server_ids.contains(&server_id))
    }

    /// 当前语言的显示名，未知语言返回 None
    pub fn language_name(&self) -> Option<&'static str> {
        catalog::display_name(catalog::LANGUAGES, &self.language)
    }
}

// 密钥不进日志
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("debug", &self.debug)
            .field("language", &self.language)
            .field("site_name", &self.site_name)
            .field("jwt_secret_key", &redact(&self.jwt_secret_key))
            .field("agent_secret_key", &redact(&self.agent_secret_key))
            .field("listen_port", &self.listen_port)
            .field("install_host", &self.install_host)
            .field("tls", &self.tls)
            .field("location", &self.location)
            .field("enable_plain_ip_in_notification", &self.enable_plain_ip_in_notification)
            .field("enable_ip_change_notification", &self.enable_ip_change_notification)
            .field("ip_change_notification_tag", &self.ip_change_notification_tag)
            .field("cover", &self.cover)
            .field("ignored_ip_notification", &self.ignored_ip_notification)
            .field("avg_ping_count", &self.avg_ping_count)
            .field("dns_servers", &self.dns_servers)
            .field("path", &self.path)
            .finish()
    }
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "" } else { "<redacted>" }
}

/// 以 0600 权限写文件，覆盖原内容
fn write_restricted_file(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()?;

    // mode 只在新建时生效，已有文件需要单独收紧权限
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_zero_values() {
        let mut config = Config::default();
        config.apply_defaults();

        assert_eq!(config.listen_port, 8008);
        assert_eq!(config.language, "zh-CN");
        assert_eq!(config.location, "Asia/Shanghai");
        assert_eq!(config.avg_ping_count, 2);
        assert!(config.ip_change_notification_tag.is_empty());
    }

    #[test]
    fn defaults_keep_explicit_values() {
        let mut config = Config {
            listen_port: 80,
            language: "en-US".to_string(),
            location: "UTC".to_string(),
            avg_ping_count: -3,
            ..Default::default()
        };
        config.apply_defaults();

        assert_eq!(config.listen_port, 80);
        assert_eq!(config.language, "en-US");
        assert_eq!(config.location, "UTC");
        assert_eq!(config.avg_ping_count, -3);
    }

    #[test]
    fn tag_default_only_when_enabled() {
        let mut config = Config {
            enable_ip_change_notification: true,
            ..Default::default()
        };
        config.apply_defaults();
        assert_eq!(config.ip_change_notification_tag, "default");

        let mut config = Config {
            enable_ip_change_notification: true,
            ip_change_notification_tag: "ops".to_string(),
            ..Default::default()
        };
        config.apply_defaults();
        assert_eq!(config.ip_change_notification_tag, "ops");
    }

    #[test]
    fn refresh_replaces_previous_set() {
        let mut config = Config {
            ignored_ip_notification: "1,2".to_string(),
            ..Default::default()
        };
        config.refresh_ignored_server_ids();
        assert_eq!(config.ignored_server_ids().len(), 2);

        config.ignored_ip_notification = "5".to_string();
        config.refresh_ignored_server_ids();
        assert_eq!(config.ignored_server_ids(), &HashSet::from([5]));
    }

    #[test]
    fn cover_policy_uses_derived_set() {
        let mut config = Config {
            ignored_ip_notification: "4".to_string(),
            ..Default::default()
        };
        config.refresh_ignored_server_ids();

        assert!(!config.covers_ip_change(4));
        assert!(config.covers_ip_change(9));

        config.cover = Cover::IgnoredOnly;
        assert!(config.covers_ip_change(4));
        assert!(!config.covers_ip_change(9));
    }

    #[test]
    fn serialized_form_uses_file_keys_and_omits_cache() -> anyhow::Result<()> {
        let mut config = Config {
            site_name: "edge-node".to_string(),
            ignored_ip_notification: "1,2".to_string(),
            cover: Cover::IgnoredOnly,
            ..Default::default()
        };
        config.refresh_ignored_server_ids();

        let yaml = serde_yaml::to_string(&config)?;
        assert!(yaml.contains("SiteName: edge-node"));
        assert!(yaml.contains("Cover: 1"));
        assert!(yaml.contains("JWTSecretKey"));
        assert!(!yaml.contains("ServerIDs"));
        assert!(!yaml.to_lowercase().contains("path"));
        Ok(())
    }

    #[test]
    fn keys_match_in_any_case_and_unknown_are_ignored() -> anyhow::Result<()> {
        let yaml = "debug: true\nlistenPort: 9000\nSITENAME: x\nIgnoredIpNotification: \"3\"\noauth2:\n  type: github\n";
        let value = canonicalize_keys(serde_yaml::from_str(yaml)?);
        let config: Config = serde_yaml::from_value(value)?;
        assert!(config.debug);
        assert_eq!(config.listen_port, 9000);
        assert_eq!(config.site_name, "x");
        assert_eq!(config.ignored_ip_notification, "3");
        Ok(())
    }

    #[test]
    fn later_spelling_of_a_key_wins() -> anyhow::Result<()> {
        let value = canonicalize_keys(serde_yaml::from_str("ListenPort: 80
listenport: 81
")?);
        let config: Config = serde_yaml::from_value(value)?;
        assert_eq!(config.listen_port, 81);
        Ok(())
    }

    #[test]
    fn invalid_cover_is_a_parse_error() {
        assert!(serde_yaml::from_str::<Config>("Cover: 7\n").is_err());
    }

    #[test]
    fn failed_secret_save_aborts_load() -> anyhow::Result<()> {
        // 父路径是普通文件，任何用户都无法在其下创建文件
        let dir = tempfile::TempDir::new()?;
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "")?;
        let path = blocker.join("config.yaml");

        let result = Config::from_source(&path, "SiteName: edge-node\n");
        assert!(matches!(result, Err(ConfigError::Write { .. })));
        Ok(())
    }

    #[test]
    fn loaded_source_with_secrets_skips_save() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let path = dir.path().join("missing").join("config.yaml");

        let config = Config::from_source(&path, "jwtSecretKey: a\nagentsecretkey: b\n")?;
        assert_eq!(config.jwt_secret_key, "a");
        assert_eq!(config.agent_secret_key, "b");
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn save_without_path_fails() {
        let mut config = Config::default();
        assert!(matches!(config.save(), Err(ConfigError::MissingPath)));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = Config {
            jwt_secret_key: "top-secret-jwt".to_string(),
            agent_secret_key: "top-secret-agent".to_string(),
            ..Default::default()
        };
        let out = format!("{config:?}");
        assert!(!out.contains("top-secret"));
        assert!(out.contains("<redacted>"));
    }

    #[test]
    fn language_name_lookup() {
        let config = Config {
            language: "zh-TW".to_string(),
            ..Default::default()
        };
        assert_eq!(config.language_name(), Some("繁體中文"));
    }
}
