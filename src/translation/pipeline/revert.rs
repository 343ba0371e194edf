//! 还原引擎
//!
//! 两种触发方式：关闭翻译时对整个内容根做完整还原；复制时只在选区的副本上还原，
//! 从不修改实时文档。

use std::rc::Rc;
use std::sync::OnceLock;

use markup5ever_rcdom::Handle;
use regex::Regex;

use crate::parsers::html::classify::{classify, collect_outermost, NodeKind};
use crate::parsers::html::dom::{
    child_index, create_element, create_text, get_node_attr, get_parent_node, text_content,
    text_of,
};
use crate::parsers::html::utils::ATTR_ORIGINAL;
use crate::parsers::html::{Document, SelectionRange};

use super::applier::{capitalize_first, starts_uppercase};

/// 按显示文本的大小写恢复原词
pub fn restore_case(original: &str, displayed: &str) -> String {
    if starts_uppercase(displayed) {
        capitalize_first(original)
    } else {
        original.to_string()
    }
}

/// 译文元素对应的原词；缺少元数据时返回 `None`
pub fn word_original(word: &Handle) -> Option<String> {
    let original = get_node_attr(word, ATTR_ORIGINAL).filter(|o| !o.is_empty())?;
    Some(restore_case(&original, &text_content(word)))
}

/// 标记容器对应的原词
pub fn marker_original(marker: &Handle) -> Option<String> {
    collect_outermost(marker, NodeKind::MarkerWord)
        .first()
        .and_then(word_original)
}

/// 节点的“有效文本”：标记还原为原词，发音按钮不计入
fn effective_text(node: &Handle) -> String {
    match classify(node) {
        NodeKind::ContentLeaf => text_of(node).unwrap_or_default(),
        NodeKind::PlaybackButton | NodeKind::Other => String::new(),
        NodeKind::MarkerWord => word_original(node).unwrap_or_else(|| text_content(node)),
        NodeKind::OverlayMarker => marker_original(node).unwrap_or_else(|| {
            tracing::debug!("标记缺少原词元数据，保留显示文本");
            children_effective_text(node)
        }),
        _ => children_effective_text(node),
    }
}

fn children_effective_text(node: &Handle) -> String {
    node.children.borrow().iter().map(effective_text).collect()
}

/// 完整还原统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RevertStats {
    pub wrappers_reverted: usize,
    pub markers_reverted: usize,
    /// 缺少元数据而跳过的标记
    pub markers_skipped: usize,
}

/// 还原内容根下的全部引擎输出
pub fn full_revert(document: &Document, root: &Handle) -> RevertStats {
    let mut stats = RevertStats::default();

    for wrapper in collect_outermost(root, NodeKind::ProcessedWrapper) {
        let text = children_effective_text(&wrapper);
        if document.replace_node(&wrapper, create_text(&text)) {
            stats.wrappers_reverted += 1;
        }
    }

    // 脱离包装容器单独存在的标记
    for marker in collect_outermost(root, NodeKind::OverlayMarker) {
        match marker_original(&marker) {
            Some(original) => {
                if document.replace_node(&marker, create_text(&original)) {
                    stats.markers_reverted += 1;
                }
            }
            None => {
                tracing::debug!("跳过缺少原词元数据的标记");
                stats.markers_skipped += 1;
            }
        }
    }

    tracing::info!(
        "完整还原: {} 个包装容器，{} 个独立标记，跳过 {} 个",
        stats.wrappers_reverted,
        stats.markers_reverted,
        stats.markers_skipped
    );
    stats
}

/// 覆盖后的剪贴板内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub plain: String,
    pub html: String,
}

/// 复制事件的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    /// 选区不含译词，使用浏览器默认复制
    Native,
    /// 阻止默认复制，用还原后的文本覆盖剪贴板
    Override(ClipboardPayload),
}

/// 复制时的选择性还原，只操作选区副本
pub fn revert_selection(range: &SelectionRange) -> CopyOutcome {
    let container = create_element("div", &[]);
    for node in range.clone_contents() {
        node.parent.set(Some(Rc::downgrade(&container)));
        container.children.borrow_mut().push(node);
    }

    let words = collect_outermost(&container, NodeKind::MarkerWord);
    if words.is_empty() && collect_outermost(&container, NodeKind::OverlayMarker).is_empty() {
        return CopyOutcome::Native;
    }

    for button in collect_outermost(&container, NodeKind::PlaybackButton) {
        detach(&button);
    }
    for word in words {
        if let Some(original) = word_original(&word) {
            swap(&word, create_text(&original));
        }
    }

    let text = normalize_whitespace(&text_content(&container));
    tracing::debug!("复制内容已还原为原文: {:?}", text);
    CopyOutcome::Override(ClipboardPayload {
        plain: text.clone(),
        html: text,
    })
}

/// 连续空白合并为单个空格并去除首尾空白
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE: OnceLock<Option<Regex>> = OnceLock::new();
    match WHITESPACE.get_or_init(|| Regex::new(r"\s+").ok()) {
        Some(re) => re.replace_all(text, " ").trim().to_string(),
        None => text.split_whitespace().collect::<Vec<_>>().join(" "),
    }
}

fn detach(node: &Handle) {
    if let Some(parent) = get_parent_node(node) {
        if let Some(index) = child_index(&parent, node) {
            parent.children.borrow_mut().remove(index);
        }
    }
    node.parent.set(None);
}

fn swap(old: &Handle, replacement: Handle) {
    let Some(parent) = get_parent_node(old) else {
        return;
    };
    let Some(index) = child_index(&parent, old) else {
        return;
    };
    replacement.parent.set(Some(Rc::downgrade(&parent)));
    parent.children.borrow_mut()[index] = replacement;
    old.parent.set(None);
}
