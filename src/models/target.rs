use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::sync::OnceLock;

/// 目标主页（公司主页或个人主页）
///
/// 创建后不可变，URL 由 `feed_url` 纯函数推导。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetHandle {
    /// 公司主页，如 `acceldata`
    Company(String),
    /// 个人主页，如 `in/jane-doe`
    User(String),
}

fn url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:https?://[^/]+/)?(company|in|user)/([^/?#]+)")
            .unwrap_or_else(|e| panic!("目标地址正则无效: {}", e))
    })
}

fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_\-.%]*$")
            .unwrap_or_else(|e| panic!("目标名称正则无效: {}", e))
    })
}

impl TargetHandle {
    pub fn handle(&self) -> &str {
        match self {
            TargetHandle::Company(handle) | TargetHandle::User(handle) => handle,
        }
    }

    /// 帖子列表页地址
    pub fn feed_url(&self, service_host: &str) -> String {
        match self {
            TargetHandle::Company(handle) => {
                format!("https://{}/company/{}/posts/", service_host, handle)
            }
            TargetHandle::User(handle) => {
                format!("https://{}/in/{}/recent-activity/all/", service_host, handle)
            }
        }
    }
}

impl FromStr for TargetHandle {
    type Err = ConfigError;

    /// 支持 `acme`、`company/acme`、`in/jane`、`user/jane` 以及完整的主页地址
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_start_matches('/');
        let invalid = || ConfigError::InvalidTarget {
            value: value.to_string(),
        };

        let (kind, handle) = match url_pattern().captures(trimmed) {
            Some(caps) => (
                caps.get(1).map(|m| m.as_str()).unwrap_or("company"),
                caps.get(2).map(|m| m.as_str()).unwrap_or_default(),
            ),
            None => {
                let bare = trimmed.trim_end_matches('/');
                if bare.contains('/') {
                    return Err(invalid());
                }
                ("company", bare)
            }
        };

        if !handle_pattern().is_match(handle) {
            return Err(invalid());
        }

        Ok(match kind {
            "company" => TargetHandle::Company(handle.to_string()),
            _ => TargetHandle::User(handle.to_string()),
        })
    }
}

impl TryFrom<String> for TargetHandle {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetHandle> for String {
    fn from(target: TargetHandle) -> Self {
        target.to_string()
    }
}

impl Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetHandle::Company(handle) => write!(f, "company/{}", handle),
            TargetHandle::User(handle) => write!(f, "in/{}", handle),
        }
    }
}
