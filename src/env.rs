//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => Self::DEFAULT.ok_or_else(|| EnvError {
                variable: Self::NAME.to_string(),
                message: "Required environment variable not set".to_string(),
            }),
        }
    }

    /// 仅在变量被显式设置时返回值
    fn get_set() -> Option<EnvResult<T>> {
        env::var(Self::NAME).ok().map(|value| Self::parse(&value))
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "LEXOV_LOG_LEVEL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 注释引擎相关环境变量
pub mod engine {
    use super::*;

    /// 翻译服务地址
    pub struct ApiUrl;
    impl EnvVar<String> for ApiUrl {
        const NAME: &'static str = "LEXOV_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation service endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// 悬停统计上报地址
    pub struct BeaconUrl;
    impl EnvVar<String> for BeaconUrl {
        const NAME: &'static str = "LEXOV_BEACON_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Usage-frequency beacon endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// 健康检查地址
    pub struct HealthUrl;
    impl EnvVar<String> for HealthUrl {
        const NAME: &'static str = "LEXOV_HEALTH_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation service health endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// 变更防抖延迟
    pub struct DebounceMs;
    impl EnvVar<Duration> for DebounceMs {
        const NAME: &'static str = "LEXOV_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(1000));
        const DESCRIPTION: &'static str = "Quiet period before re-processing changed content, in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_positive_u64(value, Self::NAME, 1, 60_000).map(Duration::from_millis)
        }
    }

    /// 请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "LEXOV_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(10));
        const DESCRIPTION: &'static str = "Translation request timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_positive_u64(value, Self::NAME, 1, 300).map(Duration::from_secs)
        }
    }

    /// 是否显示发音按钮
    pub struct ShowPlayback;
    impl EnvVar<bool> for ShowPlayback {
        const NAME: &'static str = "LEXOV_SHOW_PLAYBACK";
        const DEFAULT: Option<bool> = Some(true);
        const DESCRIPTION: &'static str = "Render a pronunciation button next to each translated word";

        fn parse(value: &str) -> EnvResult<bool> {
            parse_bool(value, Self::NAME)
        }
    }
}

/// 解析布尔值
pub fn parse_bool(value: &str, name: &str) -> EnvResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(EnvError {
            variable: name.to_string(),
            message: format!("Invalid boolean '{}'. Use: true/false, 1/0, yes/no, on/off", value),
        }),
    }
}

/// 解析有范围限制的正整数
pub fn parse_positive_u64(value: &str, name: &str, min: u64, max: u64) -> EnvResult<u64> {
    let number: u64 = value.trim().parse().map_err(|_| EnvError {
        variable: name.to_string(),
        message: "Must be a valid positive integer".to_string(),
    })?;

    if number < min || number > max {
        return Err(EnvError {
            variable: name.to_string(),
            message: format!("Must be between {} and {}", min, max),
        });
    }

    Ok(number)
}

fn parse_http_url(value: &str, name: &str) -> EnvResult<String> {
    let raw = value.trim();
    let url = url::Url::parse(raw).map_err(|e| EnvError {
        variable: name.to_string(),
        message: format!("Invalid URL: {}", e),
    })?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(raw.to_string()),
        _ => Err(EnvError {
            variable: name.to_string(),
            message: "URL must use http:// or https:// with a host".to_string(),
        }),
    }
}

/// 生成环境变量文档
pub fn generate_env_docs() -> String {
    let mut docs = String::from("# Environment Variables\n\n");

    docs.push_str("## Core\n\n");
    docs.push_str(&format!(
        "- `{}`: {} (default: info)\n",
        core::LogLevel::NAME,
        core::LogLevel::DESCRIPTION
    ));

    docs.push_str("\n## Engine\n\n");
    for (name, description) in [
        (engine::ApiUrl::NAME, engine::ApiUrl::DESCRIPTION),
        (engine::BeaconUrl::NAME, engine::BeaconUrl::DESCRIPTION),
        (engine::HealthUrl::NAME, engine::HealthUrl::DESCRIPTION),
        (engine::DebounceMs::NAME, engine::DebounceMs::DESCRIPTION),
        (engine::RequestTimeout::NAME, engine::RequestTimeout::DESCRIPTION),
        (engine::ShowPlayback::NAME, engine::ShowPlayback::DESCRIPTION),
    ] {
        docs.push_str(&format!("- `{}`: {}\n", name, description));
    }

    docs
}
