//! 文本叶子提取器
//!
//! 按文档顺序惰性遍历内容根，产出可以注释的文本节点。非正文容器、
//! 引擎生成的包装/标记以及引擎界面（提示框）整棵子树都会被跳过。

use std::collections::HashSet;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, Node};

use crate::parsers::html::classify::{classify, has_engine_ancestor, NodeKind};
use crate::parsers::html::dom::text_of;

/// 惰性叶子遍历器；克隆后可从当前位置独立继续，调用 [`leaves`] 可重新开始
#[derive(Debug, Clone)]
pub struct LeafWalker {
    stack: Vec<Handle>,
}

impl LeafWalker {
    pub fn new(root: &Handle) -> Self {
        // 根节点本身位于引擎输出内部时，不产出任何叶子
        let stack = if has_engine_ancestor(root) || classify(root).blocks_extraction() {
            Vec::new()
        } else {
            vec![root.clone()]
        };
        Self { stack }
    }
}

impl Iterator for LeafWalker {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        while let Some(node) = self.stack.pop() {
            match classify(&node) {
                NodeKind::ContentLeaf => {
                    let has_text = text_of(&node)
                        .map(|t| !t.trim().is_empty())
                        .unwrap_or(false);
                    if has_text {
                        return Some(node);
                    }
                }
                kind if kind.blocks_extraction() => {
                    tracing::trace!("跳过子树: {:?}", kind);
                }
                NodeKind::Other => {}
                _ => {
                    for child in node.children.borrow().iter().rev() {
                        self.stack.push(child.clone());
                    }
                }
            }
        }
        None
    }
}

/// 从内容根开始遍历叶子
pub fn leaves(root: &Handle) -> LeafWalker {
    LeafWalker::new(root)
}

/// 单次管道运行内的去重：同一叶子不会被交出两次
#[derive(Debug, Default)]
pub struct VisitedLeaves {
    seen: HashSet<*const Node>,
    // 持有句柄，保证指针在本次运行期间不会被复用
    held: Vec<Handle>,
}

impl VisitedLeaves {
    pub fn new() -> Self {
        Self::default()
    }

    /// 首次见到返回 `true`
    pub fn first_visit(&mut self, leaf: &Handle) -> bool {
        if self.seen.insert(Rc::as_ptr(leaf)) {
            self.held.push(leaf.clone());
            true
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }
}

/// 组装发送给翻译服务的页面文本：各叶子去除首尾空白后按行拼接
pub fn extract_page_text(root: &Handle) -> String {
    leaves(root)
        .filter_map(|leaf| text_of(&leaf))
        .map(|text| text.trim().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
