/// 引擎输出节点的角色属性
pub const ROLE_ATTR: &str = "data-lexov-role";

pub const ROLE_WRAPPER: &str = "wrapper";
pub const ROLE_MARKER: &str = "marker";
pub const ROLE_WORD: &str = "word";
pub const ROLE_SPEAKER: &str = "speaker";
pub const ROLE_TOOLTIP: &str = "tooltip";

/// 样式类名
pub const CLASS_WRAPPER: &str = "lexov-translated";
pub const CLASS_MARKER: &str = "lexov-word-container";
pub const CLASS_WORD: &str = "lexov-word";
pub const CLASS_SPEAKER: &str = "lexov-speaker-btn";

pub const TOOLTIP_ID: &str = "lexov-tooltip";

/// 标记词上的元数据属性
pub const ATTR_ORIGINAL: &str = "data-original";
pub const ATTR_TRANSLATION: &str = "data-translation";
pub const ATTR_MEANING: &str = "data-meaning";
pub const ATTR_PRONUNCIATION: &str = "data-pronunciation";
/// 发音按钮的当前视觉状态
pub const ATTR_PLAYBACK_STATE: &str = "data-lexov-state";

/// 不承载可见正文的容器
pub const NON_CONTENT_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "svg", "canvas", "textarea", "head",
];

/// 检查元素名是否属于非正文容器
pub fn is_non_content_element(name: &str) -> bool {
    NON_CONTENT_ELEMENTS.contains(&name.to_ascii_lowercase().as_str())
}
