//! 固定枚举表：界面语言、主题、OAuth 提供方、IP 变更提醒覆盖范围

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 支持的界面语言 (locale tag, 显示名)
pub const LANGUAGES: &[(&str, &str)] = &[
    ("zh-CN", "简体中文"),
    ("zh-TW", "繁體中文"),
    ("en-US", "English"),
    ("es-ES", "Español"),
];

/// 前台主题
pub const THEMES: &[(&str, &str)] = &[
    ("default", "Default"),
    ("daynight", "JackieSung DayNight"),
    ("mdui", "Neko Mdui"),
    ("hotaru", "Hotaru"),
    ("angel-kanade", "AngelKanade"),
    ("server-status", "ServerStatus"),
    ("custom", "Custom(local)"),
];

/// 后台主题
pub const DASHBOARD_THEMES: &[(&str, &str)] = &[
    ("default", "Default"),
    ("custom", "Custom(local)"),
];

/// 查找显示名
pub fn display_name(table: &[(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, name)| *name)
}

/// OAuth 登录提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OauthProvider {
    Github,
    Gitee,
    Gitlab,
    Jihulab,
    Gitea,
    Cloudflare,
    Oidc,
}

impl OauthProvider {
    pub const ALL: [OauthProvider; 7] = [
        Self::Github,
        Self::Gitee,
        Self::Gitlab,
        Self::Jihulab,
        Self::Gitea,
        Self::Cloudflare,
        Self::Oidc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Github => "github",
            Self::Gitee => "gitee",
            Self::Gitlab => "gitlab",
            Self::Jihulab => "jihulab",
            Self::Gitea => "gitea",
            Self::Cloudflare => "cloudflare",
            Self::Oidc => "oidc",
        }
    }
}

impl fmt::Display for OauthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知的 OAuth 提供方
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("未知的 OAuth 提供方: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for OauthProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownProvider(s.to_string()))
    }
}

/// IP 变更提醒覆盖范围
///
/// 文件中以数字保存：0 提醒未被忽略列表包含的所有服务器，1 仅提醒忽略列表内的服务器。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Cover {
    #[default]
    All,
    IgnoredOnly,
}

impl Cover {
    /// 给定服务器是否在特定服务器列表内，判断是否需要提醒
    pub fn covers(self, in_list: bool) -> bool {
        match self {
            Self::All => !in_list,
            Self::IgnoredOnly => in_list,
        }
    }
}

impl From<Cover> for u8 {
    fn from(cover: Cover) -> Self {
        match cover {
            Cover::All => 0,
            Cover::IgnoredOnly => 1,
        }
    }
}

impl TryFrom<u8> for Cover {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::All),
            1 => Ok(Self::IgnoredOnly),
            other => Err(format!("Cover 只能是 0 或 1，实际为 {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_lookup() {
        assert_eq!(display_name(LANGUAGES, "en-US"), Some("English"));
        assert_eq!(display_name(LANGUAGES, "fr-FR"), None);
        assert_eq!(display_name(DASHBOARD_THEMES, "custom"), Some("Custom(local)"));
    }

    #[test]
    fn provider_names_parse_back() {
        for provider in OauthProvider::ALL {
            assert_eq!(provider.as_str().parse::<OauthProvider>(), Ok(provider));
        }
        assert!("facebook".parse::<OauthProvider>().is_err());
    }

    #[test]
    fn cover_policy() {
        assert!(Cover::All.covers(false));
        assert!(!Cover::All.covers(true));
        assert!(Cover::IgnoredOnly.covers(true));
        assert!(!Cover::IgnoredOnly.covers(false));
    }

    #[test]
    fn cover_rejects_unknown_values() {
        assert_eq!(Cover::try_from(1), Ok(Cover::IgnoredOnly));
        assert!(Cover::try_from(2).is_err());
    }
}
