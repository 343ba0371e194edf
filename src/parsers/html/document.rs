//! 带变更日志的文档
//!
//! 所有结构性修改都通过 [`Document`] 完成，并记录为 [`MutationRecord`]，
//! 供变更监视器按批次读取（相当于浏览器中的 MutationObserver 记录队列）。

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::serialize::{serialize, SerializeOpts};
use markup5ever_rcdom::{Handle, RcDom, SerializableHandle};

use super::dom::{child_index, find_nodes, get_parent_node, html_to_dom, text_content};

/// 一次结构变更
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// 子节点列表发生变化的父节点
    pub target: Handle,
    /// 新增的节点
    pub added: Vec<Handle>,
    /// 移除的节点
    pub removed: Vec<Handle>,
}

/// 可变文档及其变更日志
pub struct Document {
    dom: RcDom,
    journal: RefCell<Vec<MutationRecord>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("pending_records", &self.journal.borrow().len())
            .finish()
    }
}

impl Document {
    /// 解析 UTF-8 HTML 文本
    pub fn parse(html: &str) -> Self {
        Self::from_dom(html_to_dom(html.as_bytes(), "utf-8"))
    }

    /// 按指定字符集解析 HTML 字节
    pub fn parse_bytes(data: &[u8], encoding: &str) -> Self {
        Self::from_dom(html_to_dom(data, encoding))
    }

    pub fn from_dom(dom: RcDom) -> Self {
        Self {
            dom,
            journal: RefCell::new(Vec::new()),
        }
    }

    /// 文档根节点
    pub fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    /// `<body>` 元素；html5ever 总会补全它，但解析片段等情况下仍可能缺失
    pub fn body(&self) -> Option<Handle> {
        find_nodes(&self.dom.document, &["html", "body"])
            .into_iter()
            .next()
    }

    /// 注释内容根：优先 body，否则整个文档
    pub fn content_root(&self) -> Handle {
        self.body().unwrap_or_else(|| self.root())
    }

    /// 节点是否仍挂在本文档树上
    pub fn contains(&self, node: &Handle) -> bool {
        let mut current = node.clone();
        while let Some(parent) = get_parent_node(&current) {
            current = parent;
        }
        Rc::ptr_eq(&current, &self.dom.document)
    }

    pub fn text_content(&self, node: &Handle) -> String {
        text_content(node)
    }

    /// 追加子节点
    pub fn append_child(&self, parent: &Handle, child: Handle) {
        self.detach_silently(&child);
        child.parent.set(Some(Rc::downgrade(parent)));
        parent.children.borrow_mut().push(child.clone());
        self.record(parent, vec![child], Vec::new());
    }

    /// 在 `reference` 之前插入节点；`reference` 不是 `parent` 的子节点时追加到末尾
    pub fn insert_before(&self, parent: &Handle, child: Handle, reference: &Handle) {
        self.detach_silently(&child);
        let Some(index) = child_index(parent, reference) else {
            self.append_child(parent, child);
            return;
        };
        child.parent.set(Some(Rc::downgrade(parent)));
        parent.children.borrow_mut().insert(index, child.clone());
        self.record(parent, vec![child], Vec::new());
    }

    /// 用 `replacement` 替换 `old`，一次结构编辑。`old` 没有父节点时返回 `false`
    pub fn replace_node(&self, old: &Handle, replacement: Handle) -> bool {
        let Some(parent) = get_parent_node(old) else {
            return false;
        };
        self.detach_silently(&replacement);
        let Some(index) = child_index(&parent, old) else {
            return false;
        };

        replacement.parent.set(Some(Rc::downgrade(&parent)));
        parent.children.borrow_mut()[index] = replacement.clone();
        old.parent.set(None);

        self.record(&parent, vec![replacement], vec![old.clone()]);
        true
    }

    /// 从父节点中移除
    pub fn remove_node(&self, node: &Handle) -> bool {
        let Some(parent) = get_parent_node(node) else {
            return false;
        };
        let Some(index) = child_index(&parent, node) else {
            return false;
        };
        parent.children.borrow_mut().remove(index);
        node.parent.set(None);

        self.record(&parent, Vec::new(), vec![node.clone()]);
        true
    }

    /// 整体替换子节点列表
    pub fn replace_children(&self, parent: &Handle, children: Vec<Handle>) {
        for child in &children {
            self.detach_silently(child);
            child.parent.set(Some(Rc::downgrade(parent)));
        }
        let removed = std::mem::replace(&mut *parent.children.borrow_mut(), children.clone());
        for old in &removed {
            old.parent.set(None);
        }
        self.record(parent, children, removed);
    }

    /// 取出并清空尚未处理的变更记录
    pub fn take_records(&self) -> Vec<MutationRecord> {
        std::mem::take(&mut *self.journal.borrow_mut())
    }

    pub fn has_pending_records(&self) -> bool {
        !self.journal.borrow().is_empty()
    }

    /// 序列化整个文档
    pub fn to_html(&self) -> String {
        let serializable: SerializableHandle = self.dom.document.clone().into();
        let mut buf: Vec<u8> = Vec::new();
        if let Err(e) = serialize(&mut buf, &serializable, SerializeOpts::default()) {
            tracing::warn!("序列化文档失败: {}", e);
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn record(&self, target: &Handle, added: Vec<Handle>, removed: Vec<Handle>) {
        self.journal.borrow_mut().push(MutationRecord {
            target: target.clone(),
            added,
            removed,
        });
    }

    /// 节点若已挂在别处，先摘下来（不单独记录）
    fn detach_silently(&self, node: &Handle) {
        if let Some(parent) = get_parent_node(node) {
            if let Some(index) = child_index(&parent, node) {
                parent.children.borrow_mut().remove(index);
            }
            node.parent.set(None);
        }
    }
}
