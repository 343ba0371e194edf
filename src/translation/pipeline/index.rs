//! 翻译记录与注释索引

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::applier::lookup_key;

/// 一条翻译记录，收到后不再修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRecord {
    pub original: String,
    pub translated: String,
    #[serde(default)]
    pub meaning: String,
    #[serde(default)]
    pub pronunciation: String,
}

impl TranslationRecord {
    pub fn new(original: &str, translated: &str, meaning: &str, pronunciation: &str) -> Self {
        Self {
            original: original.to_string(),
            translated: translated.to_string(),
            meaning: meaning.to_string(),
            pronunciation: pronunciation.to_string(),
        }
    }

    /// 规范化的查找键，与页面词核使用同一套规则（去掉非单词字符并小写）
    pub fn key(&self) -> String {
        lookup_key(&self.original)
    }
}

/// 小写原词 → 翻译记录
///
/// 每次成功获取后整体替换，从不与旧内容合并。
#[derive(Debug, Clone, Default)]
pub struct AnnotationIndex {
    records: HashMap<String, TranslationRecord>,
}

impl AnnotationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = TranslationRecord>) -> Self {
        let mut index = Self::new();
        index.replace(records);
        index
    }

    /// 用新的记录整体替换索引；同键记录后者覆盖前者
    pub fn replace(&mut self, records: impl IntoIterator<Item = TranslationRecord>) {
        self.records.clear();
        for record in records {
            let key = record.key();
            if key.is_empty() {
                continue;
            }
            self.records.insert(key, record);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn get(&self, key: &str) -> Option<&TranslationRecord> {
        self.records.get(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
