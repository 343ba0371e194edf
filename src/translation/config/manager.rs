//! 配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants;
use crate::translation::error::{TranslationError, TranslationResult};

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    // 服务地址
    pub api_url: String,
    pub beacon_url: String,
    pub health_url: String,

    // 时间
    pub debounce_ms: u64,
    pub playback_feedback_ms: u64,
    pub request_timeout_secs: u64,

    // 界面
    pub tooltip_offset_px: f64,
    pub show_playback: bool,
    pub speech_rate: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            api_url: constants::DEFAULT_API_URL.to_string(),
            beacon_url: constants::DEFAULT_BEACON_URL.to_string(),
            health_url: constants::DEFAULT_HEALTH_URL.to_string(),

            debounce_ms: constants::DEFAULT_DEBOUNCE.as_millis() as u64,
            playback_feedback_ms: constants::DEFAULT_PLAYBACK_FEEDBACK.as_millis() as u64,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),

            tooltip_offset_px: constants::DEFAULT_TOOLTIP_OFFSET_PX,
            show_playback: true,
            speech_rate: constants::DEFAULT_SPEECH_RATE,
        }
    }
}

impl EngineConfig {
    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        for (field, value) in [
            ("api_url", &self.api_url),
            ("beacon_url", &self.beacon_url),
            ("health_url", &self.health_url),
        ] {
            Url::parse(value).map_err(|e| {
                TranslationError::ConfigError(format!("{} 不是有效的URL ({}): {}", field, value, e))
            })?;
        }

        if self.debounce_ms == 0 {
            return Err(TranslationError::ConfigError("防抖延迟必须大于0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        if !(0.1..=10.0).contains(&self.speech_rate) {
            return Err(TranslationError::ConfigError(
                "语速必须在 0.1 到 10 之间".to_string(),
            ));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{engine, EnvVar};

        if let Some(result) = engine::ApiUrl::get_set() {
            match result {
                Ok(url) => {
                    tracing::info!("环境变量覆盖 API URL: {}", url);
                    self.api_url = url;
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        if let Some(Ok(url)) = engine::BeaconUrl::get_set() {
            self.beacon_url = url;
        }

        if let Some(Ok(url)) = engine::HealthUrl::get_set() {
            self.health_url = url;
        }

        if let Some(Ok(delay)) = engine::DebounceMs::get_set() {
            self.debounce_ms = delay.as_millis() as u64;
        }

        if let Some(Ok(timeout)) = engine::RequestTimeout::get_set() {
            self.request_timeout_secs = timeout.as_secs();
        }

        if let Some(Ok(show)) = engine::ShowPlayback::get_set() {
            self.show_playback = show;
        }
    }

    /// 转换为Duration类型
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn playback_feedback(&self) -> Duration {
        Duration::from_millis(self.playback_feedback_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 配置管理器
#[derive(Debug)]
pub struct ConfigManager {
    config: EngineConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量 → 校验
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 只从指定文件加载（仍然应用环境变量覆盖）
    pub fn from_file(path: &str) -> TranslationResult<Self> {
        let mut config = Self::load_from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_config(self) -> EngineConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> TranslationResult<EngineConfig> {
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(EngineConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<EngineConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslationError::ConfigError(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            Ok(toml::from_str(&content)?)
        } else {
            serde_json::from_str(&content)
                .map_err(|e| TranslationError::ConfigError(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = EngineConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::SerializationError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}
