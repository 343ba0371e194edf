//! 用户设置与键值存储
//!
//! 设置由外部键值存储持有；引擎在初始化时读取，在用户修改设置时写回。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::translation::error::{TranslationError, TranslationResult};

pub const KEY_TARGET_LANGUAGE: &str = "targetLanguage";
pub const KEY_LEARNING_LEVEL: &str = "learningLevel";
pub const KEY_TRANSLATION_ENABLED: &str = "translationEnabled";
pub const KEY_WORDS_TRANSLATED: &str = "wordsTranslated";

pub const DEFAULT_TARGET_LANGUAGE: &str = "fr";
pub const DEFAULT_LEARNING_LEVEL: &str = "beginner";

/// 键值存储
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> TranslationResult<()>;
}

/// 内存存储
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> TranslationResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// 以 JSON 对象文件持久化的存储，每次写入都落盘
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// 打开存储文件；文件不存在时从空对象开始
    pub fn open(path: impl AsRef<Path>) -> TranslationResult<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                _ => {
                    return Err(TranslationError::StorageError(format!(
                        "设置文件 {} 不是JSON对象",
                        path.display()
                    )))
                }
            }
        } else {
            Map::new()
        };

        Ok(Self { path, values })
    }

    fn persist(&self) -> TranslationResult<()> {
        let content = serde_json::to_string_pretty(&self.values)
            .map_err(|e| TranslationError::SerializationError(e.to_string()))?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> TranslationResult<()> {
        self.values.insert(key.to_string(), value);
        self.persist()
    }
}

/// 学习者设置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub target_language: String,
    pub learning_level: String,
    pub translation_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            learning_level: DEFAULT_LEARNING_LEVEL.to_string(),
            translation_enabled: false,
        }
    }
}

impl Settings {
    /// 从存储读取，缺失或类型不符的键使用默认值
    pub fn load(store: &dyn SettingsStore) -> Self {
        let defaults = Self::default();

        let target_language = read_string(store, KEY_TARGET_LANGUAGE)
            .unwrap_or(defaults.target_language);
        let learning_level = read_string(store, KEY_LEARNING_LEVEL)
            .unwrap_or(defaults.learning_level);
        let translation_enabled = store
            .get(KEY_TRANSLATION_ENABLED)
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.translation_enabled);

        Self {
            target_language,
            learning_level,
            translation_enabled,
        }
    }

    /// 写回存储
    pub fn save(&self, store: &mut dyn SettingsStore) -> TranslationResult<()> {
        store.set(
            KEY_TARGET_LANGUAGE,
            Value::String(self.target_language.clone()),
        )?;
        store.set(KEY_LEARNING_LEVEL, Value::String(self.learning_level.clone()))?;
        store.set(KEY_TRANSLATION_ENABLED, Value::Bool(self.translation_enabled))?;
        Ok(())
    }

    /// 首次安装：只补齐缺失的键
    pub fn install_defaults(store: &mut dyn SettingsStore) -> TranslationResult<()> {
        let defaults = Self::default();
        let entries = [
            (KEY_TARGET_LANGUAGE, Value::String(defaults.target_language)),
            (KEY_LEARNING_LEVEL, Value::String(defaults.learning_level)),
            (KEY_TRANSLATION_ENABLED, Value::Bool(defaults.translation_enabled)),
            (KEY_WORDS_TRANSLATED, Value::from(0u64)),
        ];

        for (key, value) in entries {
            if store.get(key).is_none() {
                store.set(key, value)?;
            }
        }
        Ok(())
    }

    /// 是否与另一份设置请求不同的翻译内容
    pub fn changes_translations(&self, other: &Settings) -> bool {
        self.target_language != other.target_language || self.learning_level != other.learning_level
    }
}

/// 记录已翻译词数
pub fn record_words_translated(store: &mut dyn SettingsStore, count: usize) -> TranslationResult<()> {
    store.set(KEY_WORDS_TRANSLATED, Value::from(count as u64))
}

/// 读取已翻译词数
pub fn words_translated(store: &dyn SettingsStore) -> u64 {
    store
        .get(KEY_WORDS_TRANSLATED)
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

fn read_string(store: &dyn SettingsStore, key: &str) -> Option<String> {
    match store.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(other) => {
            tracing::warn!("设置项 {} 的值无效: {}，使用默认值", key, other);
            None
        }
        None => None,
    }
}
