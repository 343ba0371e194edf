//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

use crate::env::EnvError;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 网络错误
    #[error("网络错误: {0}")]
    NetworkError(String),

    /// 服务返回非 2xx 状态
    #[error("服务返回状态码 {0}")]
    HttpStatus(u16),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 设置存储错误
    #[error("存储错误: {0}")]
    StorageError(String),

    /// 发音播放错误
    #[error("发音播放失败: {0}")]
    PlaybackError(#[from] PlaybackFailure),
}

/// 语音合成失败原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackFailure {
    /// 平台没有语音合成能力
    #[error("当前平台不支持语音合成")]
    Unsupported,

    /// 合成过程中出错
    #[error("语音合成错误: {0}")]
    Synthesis(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::NetworkError(_) => true,
            TranslationError::HttpStatus(code) => *code >= 500 || *code == 429,
            TranslationError::PlaybackError(PlaybackFailure::Synthesis(_)) => true,
            TranslationError::PlaybackError(PlaybackFailure::Unsupported) => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::ParseError(_) => false,
            TranslationError::SerializationError(_) => false,
            TranslationError::StorageError(_) => true,
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::NetworkError(_) => ErrorSeverity::Warning,
            TranslationError::HttpStatus(_) => ErrorSeverity::Warning,
            TranslationError::ParseError(_) => ErrorSeverity::Warning,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::StorageError(_) => ErrorSeverity::Error,
            TranslationError::PlaybackError(_) => ErrorSeverity::Info,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::NetworkError(_) | TranslationError::HttpStatus(_) => {
                ErrorCategory::Transport
            }
            TranslationError::ParseError(_) => ErrorCategory::Transport,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::StorageError(_) => ErrorCategory::Storage,
            TranslationError::PlaybackError(_) => ErrorCategory::Playback,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(self, context: T) -> Self {
        let wrap = |msg: String| format!("{} (上下文: {})", msg, context);

        match self {
            TranslationError::ConfigError(msg) => TranslationError::ConfigError(wrap(msg)),
            TranslationError::NetworkError(msg) => TranslationError::NetworkError(wrap(msg)),
            TranslationError::ParseError(msg) => TranslationError::ParseError(wrap(msg)),
            TranslationError::SerializationError(msg) => {
                TranslationError::SerializationError(wrap(msg))
            }
            TranslationError::StorageError(msg) => TranslationError::StorageError(wrap(msg)),
            other @ (TranslationError::HttpStatus(_) | TranslationError::PlaybackError(_)) => other,
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    /// 请求失败、非 2xx、响应格式错误
    Transport,
    Serialization,
    Storage,
    Playback,
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => TranslationError::HttpStatus(status.as_u16()),
            None => TranslationError::NetworkError(error.to_string()),
        }
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::ParseError(error.to_string())
    }
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::StorageError(error.to_string())
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ConfigError(format!("解析TOML配置失败: {}", error))
    }
}

impl From<EnvError> for TranslationError {
    fn from(error: EnvError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

/// 翻译操作的结果类型
pub type TranslationResult<T> = Result<T, TranslationError>;
