//! 节点分类
//!
//! 把 rcdom 节点映射成一个带类型的视图。提取器、监视器和还原引擎都只通过
//! [`classify`] 判断节点身份，不直接比较标签名或类名。

use markup5ever_rcdom::{Handle, NodeData};

use super::dom::{get_node_attr, get_node_name, get_parent_node};
use super::utils::{
    is_non_content_element, ROLE_ATTR, ROLE_MARKER, ROLE_SPEAKER, ROLE_TOOLTIP, ROLE_WORD,
    ROLE_WRAPPER,
};

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// 文档根
    Document,
    /// 正文文本节点
    ContentLeaf,
    /// 覆盖标记容器（一个译词）
    OverlayMarker,
    /// 标记内显示译文的元素，携带原词元数据
    MarkerWord,
    /// 发音按钮
    PlaybackButton,
    /// 已处理文本的包装容器
    ProcessedWrapper,
    /// 引擎内部界面（提示框）
    EngineUi,
    /// script/style 等非正文容器
    NonContent,
    /// 普通作者元素
    Element,
    /// 注释、doctype、处理指令
    Other,
}

impl NodeKind {
    /// 是否为引擎生成的节点
    pub fn is_engine_output(self) -> bool {
        matches!(
            self,
            NodeKind::OverlayMarker
                | NodeKind::MarkerWord
                | NodeKind::PlaybackButton
                | NodeKind::ProcessedWrapper
                | NodeKind::EngineUi
        )
    }

    /// 提取器是否必须跳过整棵子树
    pub fn blocks_extraction(self) -> bool {
        self.is_engine_output() || self == NodeKind::NonContent
    }
}

/// 计算节点类型
pub fn classify(node: &Handle) -> NodeKind {
    match &node.data {
        NodeData::Document => NodeKind::Document,
        NodeData::Text { .. } => NodeKind::ContentLeaf,
        NodeData::Element { .. } => classify_element(node),
        _ => NodeKind::Other,
    }
}

fn classify_element(node: &Handle) -> NodeKind {
    if let Some(role) = get_node_attr(node, ROLE_ATTR) {
        match role.as_str() {
            ROLE_WRAPPER => return NodeKind::ProcessedWrapper,
            ROLE_MARKER => return NodeKind::OverlayMarker,
            ROLE_WORD => return NodeKind::MarkerWord,
            ROLE_SPEAKER => return NodeKind::PlaybackButton,
            ROLE_TOOLTIP => return NodeKind::EngineUi,
            other => tracing::debug!("未知的引擎角色 {:?}，按普通元素处理", other),
        }
    }

    match get_node_name(node) {
        Some(name) if is_non_content_element(name) => NodeKind::NonContent,
        _ => NodeKind::Element,
    }
}

/// 祖先链（不含自身）中是否存在引擎输出
pub fn has_engine_ancestor(node: &Handle) -> bool {
    let mut current = get_parent_node(node);
    while let Some(parent) = current {
        if classify(&parent).is_engine_output() {
            return true;
        }
        current = get_parent_node(&parent);
    }
    false
}

/// 自身及后代中是否存在引擎输出
pub fn contains_engine_output(node: &Handle) -> bool {
    if classify(node).is_engine_output() {
        return true;
    }
    node.children.borrow().iter().any(contains_engine_output)
}

/// 从自身向上查找第一个指定类型的节点
pub fn closest(node: &Handle, kind: NodeKind) -> Option<Handle> {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if classify(&candidate) == kind {
            return Some(candidate);
        }
        current = get_parent_node(&candidate);
    }
    None
}

/// 按文档顺序收集子树中指定类型的节点；命中后不再深入该节点
pub fn collect_outermost(root: &Handle, kind: NodeKind) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if classify(&node) == kind {
            found.push(node);
            continue;
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }
    found
}
