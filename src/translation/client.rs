//! 翻译服务客户端
//!
//! 远程推理服务只按请求/响应约定访问。非 2xx 或格式错误的响应在这里返回错误，
//! 由生命周期控制器统一降级为“零条翻译”。

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::translation::config::EngineConfig;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::pipeline::TranslationRecord;

/// 翻译请求体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    pub level: String,
    pub target_language: String,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>, level: &str, target_language: &str) -> Self {
        Self {
            text: text.into(),
            level: level.to_string(),
            target_language: target_language.to_string(),
        }
    }
}

/// 解析服务响应体
///
/// 缺少 `translations` 视为零条；单条记录无法解码或原词为空时单独跳过。
pub fn parse_translation_body(body: &str) -> TranslationResult<Vec<TranslationRecord>> {
    let value: Value = serde_json::from_str(body)?;

    let items = match value.get("translations") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(TranslationError::ParseError(format!(
                "translations 字段不是数组: {}",
                other
            )))
        }
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<TranslationRecord>(item.clone()) {
            Ok(record) if !record.original.trim().is_empty() => records.push(record),
            Ok(_) => tracing::debug!("跳过原词为空的记录"),
            Err(e) => tracing::debug!("跳过无法解析的记录: {}", e),
        }
    }
    Ok(records)
}

/// 翻译服务
#[allow(async_fn_in_trait)]
pub trait TranslationBackend {
    async fn translate(&self, request: &TranslateRequest) -> TranslationResult<Vec<TranslationRecord>>;
}

/// 基于 HTTP 的翻译服务客户端
#[derive(Debug, Clone)]
pub struct HttpTranslationClient {
    client: reqwest::Client,
    api_url: String,
    health_url: String,
}

impl HttpTranslationClient {
    pub fn new(config: &EngineConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            health_url: config.health_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// 探测服务是否可达
    pub async fn health_check(&self) -> TranslationResult<()> {
        let response = self
            .client
            .get(&self.health_url)
            .send()
            .await
            .map_err(|e| TranslationError::from(e).with_context(&self.health_url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::HttpStatus(status.as_u16()));
        }
        tracing::debug!("翻译服务健康检查通过: {}", self.health_url);
        Ok(())
    }
}

impl TranslationBackend for HttpTranslationClient {
    async fn translate(&self, request: &TranslateRequest) -> TranslationResult<Vec<TranslationRecord>> {
        tracing::debug!(
            "请求翻译: {} 字符, level={}, target={}",
            request.text.chars().count(),
            request.level,
            request.target_language
        );

        let response = self
            .client
            .post(&self.api_url)
            .json(request)
            .send()
            .await
            .map_err(|e| TranslationError::from(e).with_context(&self.api_url))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        parse_translation_body(&body)
    }
}

/// 返回固定记录的本地服务
#[derive(Debug, Clone, Default)]
pub struct StaticBackend {
    records: Vec<TranslationRecord>,
}

impl StaticBackend {
    pub fn new(records: Vec<TranslationRecord>) -> Self {
        Self { records }
    }

    /// 从与服务响应同格式的 JSON 构建
    pub fn from_json(body: &str) -> TranslationResult<Self> {
        Ok(Self::new(parse_translation_body(body)?))
    }

    pub fn from_file(path: impl AsRef<Path>) -> TranslationResult<Self> {
        let body = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&body)
    }

    pub fn records(&self) -> &[TranslationRecord] {
        &self.records
    }
}

impl TranslationBackend for StaticBackend {
    async fn translate(&self, _request: &TranslateRequest) -> TranslationResult<Vec<TranslationRecord>> {
        Ok(self.records.clone())
    }
}

/// 使用频率通知的接收者；实现不得阻塞，也不得报告失败
pub trait UsageSink {
    fn notify(&self, original: &str);
}

#[derive(Debug, Serialize)]
struct UsagePayload<'a> {
    english: &'a str,
}

/// 向服务上报首次悬停的单词
#[derive(Debug, Clone)]
pub struct HttpUsageBeacon {
    client: reqwest::Client,
    url: String,
}

impl HttpUsageBeacon {
    pub fn new(config: &EngineConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;
        Ok(Self {
            client,
            url: config.beacon_url.clone(),
        })
    }
}

impl UsageSink for HttpUsageBeacon {
    fn notify(&self, original: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("没有可用的异步运行时，丢弃使用通知: {}", original);
            return;
        };

        let client = self.client.clone();
        let url = self.url.clone();
        let word = original.to_string();
        runtime.spawn(async move {
            let payload = UsagePayload { english: &word };
            if let Err(e) = client.post(&url).json(&payload).send().await {
                tracing::debug!("使用通知发送失败: {}", e);
            }
        });
    }
}

/// 丢弃所有通知
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsageSink;

impl UsageSink for NoopUsageSink {
    fn notify(&self, _original: &str) {}
}
