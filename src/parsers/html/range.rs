//! 选区与片段克隆
//!
//! 语义与 DOM Range 一致：文本边界的偏移量是字符数，元素边界的偏移量是子节点下标。
//! [`SelectionRange::clone_contents`] 只复制，不触碰原文档。

use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, Node, NodeData};

use super::dom::{child_index, create_text, get_parent_node, shallow_clone, text_of};

/// 选区边界
#[derive(Debug, Clone)]
pub struct Boundary {
    pub node: Handle,
    pub offset: usize,
}

impl Boundary {
    pub fn new(node: &Handle, offset: usize) -> Self {
        Self {
            node: node.clone(),
            offset,
        }
    }
}

/// 一段连续选区
#[derive(Debug, Clone)]
pub struct SelectionRange {
    pub start: Boundary,
    pub end: Boundary,
}

/// 文档顺序上的一个点：(先序编号, 文本内字符偏移)
type Point = (usize, usize);

/// 每个节点的先序编号区间 [open, close)
struct Numbering {
    spans: HashMap<*const Node, (usize, usize)>,
}

impl Numbering {
    fn build(root: &Handle) -> Self {
        let mut spans = HashMap::new();
        let mut counter = 0;
        Self::visit(root, &mut counter, &mut spans);
        Self { spans }
    }

    fn visit(node: &Handle, counter: &mut usize, spans: &mut HashMap<*const Node, (usize, usize)>) {
        let open = *counter;
        *counter += 1;
        for child in node.children.borrow().iter() {
            Self::visit(child, counter, spans);
        }
        spans.insert(Rc::as_ptr(node), (open, *counter));
    }

    fn span(&self, node: &Handle) -> Option<(usize, usize)> {
        self.spans.get(&Rc::as_ptr(node)).copied()
    }

    fn point(&self, boundary: &Boundary) -> Option<Point> {
        let (open, close) = self.span(&boundary.node)?;
        if matches!(boundary.node.data, NodeData::Text { .. }) {
            return Some((open, boundary.offset));
        }
        let children = boundary.node.children.borrow();
        match children.get(boundary.offset) {
            Some(child) => self.span(child).map(|(child_open, _)| (child_open, 0)),
            None => Some((close, 0)),
        }
    }
}

impl SelectionRange {
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// 选中节点的全部内容
    pub fn select_node_contents(node: &Handle) -> Self {
        let end_offset = match text_of(node) {
            Some(text) => text.chars().count(),
            None => node.children.borrow().len(),
        };
        Self::new(Boundary::new(node, 0), Boundary::new(node, end_offset))
    }

    /// 选中节点本身；节点没有父节点时退化为选中其内容
    pub fn select_node(node: &Handle) -> Self {
        match get_parent_node(node).and_then(|p| child_index(&p, node).map(|i| (p, i))) {
            Some((parent, index)) => Self::new(
                Boundary::new(&parent, index),
                Boundary::new(&parent, index + 1),
            ),
            None => Self::select_node_contents(node),
        }
    }

    /// 两个边界的最近公共祖先
    pub fn common_ancestor(&self) -> Option<Handle> {
        let start_chain = ancestors_inclusive(&self.start.node);
        let end_chain = ancestors_inclusive(&self.end.node);
        end_chain
            .into_iter()
            .find(|candidate| start_chain.iter().any(|s| Rc::ptr_eq(s, candidate)))
    }

    /// 复制选区内容为一组脱离文档的节点
    pub fn clone_contents(&self) -> Vec<Handle> {
        let Some(root) = self.common_ancestor() else {
            return Vec::new();
        };
        let numbering = Numbering::build(&root);
        let (Some(start), Some(end)) = (numbering.point(&self.start), numbering.point(&self.end))
        else {
            return Vec::new();
        };
        if start >= end {
            return Vec::new();
        }

        if matches!(root.data, NodeData::Text { .. }) {
            return clip_text(&root, &numbering, start, end).into_iter().collect();
        }

        let nodes: Vec<Handle> = root
            .children
            .borrow()
            .iter()
            .filter_map(|child| clip(child, &numbering, start, end))
            .collect();
        nodes
    }

    /// 选区的纯文本
    pub fn to_text(&self) -> String {
        self.clone_contents()
            .iter()
            .map(super::dom::text_content)
            .collect()
    }
}

fn ancestors_inclusive(node: &Handle) -> Vec<Handle> {
    let mut chain = vec![node.clone()];
    let mut current = get_parent_node(node);
    while let Some(parent) = current {
        current = get_parent_node(&parent);
        chain.push(parent);
    }
    chain
}

fn clip(node: &Handle, numbering: &Numbering, start: Point, end: Point) -> Option<Handle> {
    if matches!(node.data, NodeData::Text { .. }) {
        return clip_text(node, numbering, start, end);
    }

    let (open, close) = numbering.span(node)?;
    if end <= (open, 0) || start >= (close, 0) {
        return None;
    }

    let copy = shallow_clone(node);
    for child in node.children.borrow().iter() {
        if let Some(child_copy) = clip(child, numbering, start, end) {
            child_copy.parent.set(Some(Rc::downgrade(&copy)));
            copy.children.borrow_mut().push(child_copy);
        }
    }
    Some(copy)
}

fn clip_text(node: &Handle, numbering: &Numbering, start: Point, end: Point) -> Option<Handle> {
    let (open, _) = numbering.span(node)?;
    let text = text_of(node)?;
    let len = text.chars().count();

    if end <= (open, 0) || start >= (open, len) {
        return None;
    }

    let from = if start.0 == open { start.1.min(len) } else { 0 };
    let to = if end.0 == open { end.1.min(len) } else { len };
    if from >= to {
        return None;
    }

    let slice: String = text.chars().skip(from).take(to - from).collect();
    Some(create_text(&slice))
}
