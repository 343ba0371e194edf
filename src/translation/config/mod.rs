//! 引擎配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, EngineConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 默认服务地址
    pub const DEFAULT_API_URL: &str = "http://localhost:5001/translate";
    pub const DEFAULT_BEACON_URL: &str = "http://localhost:5001/api/hover";
    pub const DEFAULT_HEALTH_URL: &str = "http://localhost:5001/health";

    // 时间相关
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1000);
    pub const DEFAULT_PLAYBACK_FEEDBACK: Duration = Duration::from_millis(2000);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    // 界面
    pub const DEFAULT_TOOLTIP_OFFSET_PX: f64 = 5.0;
    pub const SPEAKER_ICON: &str = "\u{1F50A}";

    // 语音合成
    pub const DEFAULT_SPEECH_RATE: f32 = 0.8;
    pub const DEFAULT_SPEECH_PITCH: f32 = 1.0;
    pub const DEFAULT_SPEECH_VOLUME: f32 = 1.0;
    pub const FALLBACK_LOCALE: &str = "en-US";

    /// 目标语言到语音区域设置的映射
    pub const LANGUAGE_LOCALES: &[(&str, &str)] = &[
        ("fr", "fr-FR"),
        ("es", "es-ES"),
        ("de", "de-DE"),
        ("it", "it-IT"),
        ("pt", "pt-PT"),
        ("ru", "ru-RU"),
        ("ja", "ja-JP"),
        ("ko", "ko-KR"),
        ("zh", "zh-CN"),
        ("ar", "ar-SA"),
        ("hi", "hi-IN"),
        ("nl", "nl-NL"),
        ("sv", "sv-SE"),
        ("no", "no-NO"),
        ("da", "da-DK"),
        ("pl", "pl-PL"),
        ("tr", "tr-TR"),
        ("he", "he-IL"),
        ("th", "th-TH"),
        ("vi", "vi-VN"),
    ];

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "lexical-overlay.toml",
        ".lexical-overlay.toml",
        "~/.config/lexical-overlay/config.toml",
        "/etc/lexical-overlay/config.toml",
    ];
}

/// 查找目标语言对应的语音区域设置
pub fn locale_for(target_language: &str) -> &'static str {
    let lang = target_language.trim().to_ascii_lowercase();
    constants::LANGUAGE_LOCALES
        .iter()
        .find(|(code, _)| *code == lang)
        .map(|(_, locale)| *locale)
        .unwrap_or(constants::FALLBACK_LOCALE)
}

/// 便利函数
pub fn config_file_exists() -> bool {
    constants::CONFIG_PATHS
        .iter()
        .any(|path| std::path::Path::new(shellexpand::tilde(path).as_ref()).exists())
}

/// 加载引擎配置，失败时回退到默认配置
pub fn load_engine_config() -> EngineConfig {
    match ConfigManager::new() {
        Ok(manager) => manager.into_config(),
        Err(e) => {
            tracing::warn!("配置加载失败，使用默认配置: {}", e);
            EngineConfig::default()
        }
    }
}
