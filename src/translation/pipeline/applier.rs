//! 覆盖层应用器
//!
//! 对单个文本叶子做分词、查索引，命中时用一个包装容器整体替换原节点。
//! 所有生成的节点都带有 `data-lexov-role` 标记，监视器和提取器据此识别并跳过。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::parsers::html::dom::{create_element, create_text, text_of};
use crate::parsers::html::utils::{
    ATTR_MEANING, ATTR_ORIGINAL, ATTR_PRONUNCIATION, ATTR_TRANSLATION, CLASS_MARKER,
    CLASS_SPEAKER, CLASS_WORD, CLASS_WRAPPER, ROLE_ATTR, ROLE_MARKER, ROLE_SPEAKER, ROLE_WORD,
    ROLE_WRAPPER,
};
use crate::parsers::html::Document;
use crate::translation::config::constants::SPEAKER_ICON;

use super::extractor::{leaves, VisitedLeaves};
use super::index::{AnnotationIndex, TranslationRecord};

const MARKER_STYLE: &str = "display: inline-flex; align-items: center; gap: 2px; position: relative;";
const WORD_STYLE: &str =
    "color: #2196F3; text-decoration: underline; text-decoration-style: dotted; cursor: help; position: relative;";
const SPEAKER_STYLE: &str =
    "cursor: pointer; font-size: 12px; opacity: 0.7; user-select: none; display: inline-block; vertical-align: middle; margin-left: 2px;";

/// 是否为“单词字符”
pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// 按空白切分，空白本身作为独立片段保留，拼接后与原文完全一致
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_space: Option<bool> = None;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        match in_space {
            Some(prev) if prev != space => {
                tokens.push(&text[start..i]);
                start = i;
            }
            _ => {}
        }
        in_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }
    tokens
}

/// 一个非空白片段拆成：前导标点、词核、尾随标点
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenParts<'a> {
    pub prefix: &'a str,
    pub core: &'a str,
    pub suffix: &'a str,
}

pub fn split_token(token: &str) -> TokenParts<'_> {
    let core_start = token
        .char_indices()
        .find(|(_, c)| is_word_char(*c))
        .map(|(i, _)| i);

    let Some(core_start) = core_start else {
        return TokenParts {
            prefix: token,
            core: "",
            suffix: "",
        };
    };

    let core_end = token
        .char_indices()
        .rev()
        .find(|(_, c)| is_word_char(*c))
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(token.len());

    TokenParts {
        prefix: &token[..core_start],
        core: &token[core_start..core_end],
        suffix: &token[core_end..],
    }
}

/// 查找键：去掉所有非单词字符并转小写
pub fn lookup_key(token: &str) -> String {
    token.chars().filter(|c| is_word_char(*c)).collect::<String>().to_lowercase()
}

/// 首字母是否大写
pub fn starts_uppercase(text: &str) -> bool {
    text.chars().next().map(char::is_uppercase).unwrap_or(false)
}

/// 首字母大写
pub fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 按源词的大小写决定译文显示形式
pub fn display_translation(source: &str, translated: &str) -> String {
    if starts_uppercase(source) {
        capitalize_first(translated)
    } else {
        translated.to_string()
    }
}

/// 应用器选项
#[derive(Debug, Clone, Copy)]
pub struct ApplyOptions {
    /// 是否在译词旁渲染发音按钮
    pub show_playback: bool,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self { show_playback: true }
    }
}

/// 单个叶子的处理结果
#[derive(Debug, Clone)]
pub enum ApplyOutcome {
    /// 没有命中，原节点保持不变
    Untouched,
    /// 已被包装容器替换
    Replaced { wrapper: Handle, markers: usize },
}

/// 一次完整遍历的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyStats {
    pub leaves_visited: usize,
    pub wrappers_created: usize,
    pub markers_created: usize,
}

/// 包装容器的一段内容
enum Piece<'r> {
    Literal(String),
    Marker {
        /// 源词核小写，保留词内标点，还原时据此逐字恢复
        original: String,
        display: String,
        record: &'r TranslationRecord,
    },
}

/// 覆盖层应用器
pub struct OverlayApplier<'a> {
    document: &'a Document,
    index: &'a AnnotationIndex,
    options: ApplyOptions,
}

impl<'a> OverlayApplier<'a> {
    pub fn new(document: &'a Document, index: &'a AnnotationIndex, options: ApplyOptions) -> Self {
        Self {
            document,
            index,
            options,
        }
    }

    /// 处理内容根下所有合格叶子；先收集再替换，遍历过程中不修改树
    pub fn apply_all(&self, root: &Handle, produced: &mut Vec<Handle>) -> ApplyStats {
        let mut stats = ApplyStats::default();
        let mut visited = VisitedLeaves::new();
        let candidates: Vec<Handle> = leaves(root).collect();

        for leaf in candidates {
            if !visited.first_visit(&leaf) {
                continue;
            }
            stats.leaves_visited += 1;

            if let ApplyOutcome::Replaced { wrapper, markers } = self.apply_leaf(&leaf) {
                stats.wrappers_created += 1;
                stats.markers_created += markers;
                produced.push(wrapper);
            }
        }

        tracing::debug!(
            "覆盖层应用完成: 访问 {} 个叶子，生成 {} 个包装、{} 个标记",
            stats.leaves_visited,
            stats.wrappers_created,
            stats.markers_created
        );
        stats
    }

    /// 处理单个叶子
    pub fn apply_leaf(&self, leaf: &Handle) -> ApplyOutcome {
        let Some(text) = text_of(leaf) else {
            return ApplyOutcome::Untouched;
        };

        let pieces = self.plan(&text);
        let markers = pieces
            .iter()
            .filter(|p| matches!(p, Piece::Marker { .. }))
            .count();
        if markers == 0 {
            return ApplyOutcome::Untouched;
        }

        let wrapper = create_element(
            "span",
            &[("class", CLASS_WRAPPER), (ROLE_ATTR, ROLE_WRAPPER)],
        );
        {
            // 包装容器尚未挂载，直接组装子节点，不产生变更记录
            let mut children = wrapper.children.borrow_mut();
            for piece in &pieces {
                let node = match piece {
                    Piece::Literal(text) => create_text(text),
                    Piece::Marker {
                        original,
                        display,
                        record,
                    } => self.build_marker(original, display, record),
                };
                node.parent.set(Some(Rc::downgrade(&wrapper)));
                children.push(node);
            }
        }

        if !self.document.replace_node(leaf, wrapper.clone()) {
            tracing::debug!("叶子已脱离文档，跳过替换");
            return ApplyOutcome::Untouched;
        }

        ApplyOutcome::Replaced { wrapper, markers }
    }

    /// 把文本规划成字面量与标记的序列，相邻字面量合并
    fn plan(&self, text: &str) -> Vec<Piece<'a>> {
        let index: &'a AnnotationIndex = self.index;
        let mut pieces: Vec<Piece<'a>> = Vec::new();
        let mut literal = String::new();

        for token in tokenize(text) {
            if token.chars().all(char::is_whitespace) {
                literal.push_str(token);
                continue;
            }

            let parts = split_token(token);
            let key = lookup_key(parts.core);
            let record = if key.is_empty() {
                None
            } else {
                index.get(&key)
            };

            match record {
                Some(record) => {
                    literal.push_str(parts.prefix);
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    pieces.push(Piece::Marker {
                        original: parts.core.to_lowercase(),
                        display: display_translation(parts.core, &record.translated),
                        record,
                    });
                    literal.push_str(parts.suffix);
                }
                None => literal.push_str(token),
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        pieces
    }

    fn build_marker(&self, original: &str, display: &str, record: &TranslationRecord) -> Handle {
        let container = create_element(
            "span",
            &[
                ("class", CLASS_MARKER),
                (ROLE_ATTR, ROLE_MARKER),
                ("style", MARKER_STYLE),
            ],
        );

        let word = create_element(
            "span",
            &[
                ("class", CLASS_WORD),
                (ROLE_ATTR, ROLE_WORD),
                (ATTR_ORIGINAL, original),
                (ATTR_TRANSLATION, &record.translated),
                (ATTR_MEANING, &record.meaning),
                (ATTR_PRONUNCIATION, &record.pronunciation),
                ("style", WORD_STYLE),
            ],
        );
        attach(&word, create_text(display));
        attach(&container, word);

        if self.options.show_playback {
            let speaker = create_element(
                "span",
                &[
                    ("class", CLASS_SPEAKER),
                    (ROLE_ATTR, ROLE_SPEAKER),
                    ("role", "button"),
                    ("style", SPEAKER_STYLE),
                ],
            );
            attach(&speaker, create_text(SPEAKER_ICON));
            attach(&container, speaker);
        }

        container
    }
}

/// 组装未挂载的子树
fn attach(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}
