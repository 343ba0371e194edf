//! 存储模块
//!
//! 学习者设置与使用计数的键值存储

pub mod settings;

pub use settings::{JsonFileStore, MemoryStore, Settings, SettingsStore};
