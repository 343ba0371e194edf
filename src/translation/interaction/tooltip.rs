//! 悬停提示框
//!
//! 提示框是引擎界面的一部分，只创建一次并挂在 body 下；悬停时改写内容和位置，
//! 离开时通过 display/opacity 隐藏而不是移除节点。

use std::rc::Rc;

use markup5ever_rcdom::Handle;

use crate::parsers::html::dom::{
    create_element, create_text, find_nodes, get_node_attr, set_node_attr,
};
use crate::parsers::html::utils::{
    ATTR_MEANING, ATTR_ORIGINAL, ATTR_PRONUNCIATION, ATTR_TRANSLATION, ROLE_ATTR, ROLE_TOOLTIP,
    TOOLTIP_ID,
};
use crate::parsers::html::Document;

const BASE_STYLE: &str = "position: absolute; background: #333; color: white; padding: 8px 12px; \
     border-radius: 6px; font-size: 14px; max-width: 250px; pointer-events: none; \
     box-shadow: 0 4px 12px rgba(0,0,0,0.3); z-index: 10000";
const TITLE_STYLE: &str = "font-weight: bold; margin-bottom: 4px; color: #fff;";
const LINE_STYLE: &str = "margin-bottom: 2px; color: #fff;";

/// 元素的视口边界框
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// 页面滚动偏移
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

/// 一次渲染出的提示框内容
#[derive(Debug, Clone, PartialEq)]
pub struct TooltipView {
    pub original: String,
    pub translated: String,
    pub meaning: String,
    pub pronunciation: String,
    pub left: f64,
    pub top: f64,
}

impl TooltipView {
    /// 从译文元素的元数据构建；缺少原词时返回 `None`
    pub fn from_word(word: &Handle, anchor: Rect, scroll: ScrollOffset, offset: f64) -> Option<Self> {
        let original = get_node_attr(word, ATTR_ORIGINAL).filter(|o| !o.is_empty())?;
        Some(Self {
            original,
            translated: get_node_attr(word, ATTR_TRANSLATION).unwrap_or_default(),
            meaning: get_node_attr(word, ATTR_MEANING).unwrap_or_default(),
            pronunciation: get_node_attr(word, ATTR_PRONUNCIATION).unwrap_or_default(),
            left: anchor.left + scroll.x,
            top: anchor.bottom() + scroll.y + offset,
        })
    }

    pub fn title(&self) -> String {
        format!("{} \u{2192} {}", self.original, self.translated)
    }
}

/// 提示框节点的持有者
#[derive(Debug, Default)]
pub struct Tooltip {
    node: Option<Handle>,
    visible: bool,
}

impl Tooltip {
    pub fn new() -> Self {
        Self::default()
    }

    /// 安装提示框；文档中已有同 id 节点时直接复用
    pub fn install(&mut self, document: &Document) -> Handle {
        if let Some(node) = &self.node {
            return node.clone();
        }

        let existing = find_nodes(&document.root(), &["html", "body", "div"])
            .into_iter()
            .find(|n| get_node_attr(n, "id").as_deref() == Some(TOOLTIP_ID));

        let node = match existing {
            Some(node) => node,
            None => {
                let node = create_element(
                    "div",
                    &[
                        ("id", TOOLTIP_ID),
                        (ROLE_ATTR, ROLE_TOOLTIP),
                        ("style", &hidden_style()),
                    ],
                );
                document.append_child(&document.content_root(), node.clone());
                tracing::debug!("提示框已安装");
                node
            }
        };

        self.node = Some(node.clone());
        node
    }

    pub fn node(&self) -> Option<&Handle> {
        self.node.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// 在标记下方显示提示框
    pub fn show(&mut self, document: &Document, view: &TooltipView) {
        let node = self.install(document);

        let lines = vec![
            line(TITLE_STYLE, &view.title()),
            line(LINE_STYLE, &format!("Meaning: {}", view.meaning)),
            line("color: #fff;", &format!("Pronunciation: {}", view.pronunciation)),
        ];
        document.replace_children(&node, lines);

        let style = format!(
            "{}; left: {}px; top: {}px; opacity: 1; display: block",
            BASE_STYLE, view.left, view.top
        );
        set_node_attr(&node, "style", Some(&style));
        self.visible = true;
    }

    /// 隐藏但保留节点
    pub fn hide(&mut self) {
        if let Some(node) = &self.node {
            set_node_attr(node, "style", Some(&hidden_style()));
        }
        self.visible = false;
    }
}

fn hidden_style() -> String {
    format!("{}; opacity: 0; display: none", BASE_STYLE)
}

fn line(style: &str, text: &str) -> Handle {
    let div = create_element("div", &[("style", style)]);
    let text = create_text(text);
    text.parent.set(Some(Rc::downgrade(&div)));
    div.children.borrow_mut().push(text);
    div
}
