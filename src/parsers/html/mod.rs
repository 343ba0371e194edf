//! HTML文档模块
//!
//! 围绕 rcdom 的文档操作，拆分为以下子模块：
//!
//! - `utils`: 常量和标记约定
//! - `dom`: 基础DOM操作
//! - `document`: 带变更日志的可变文档
//! - `classify`: 节点分类
//! - `range`: 选区和片段克隆

pub mod classify;
pub mod document;
pub mod dom;
pub mod range;
pub mod utils;

// 重新导出主要的公共 API
pub use classify::{classify, NodeKind};
pub use document::{Document, MutationRecord};
pub use dom::{
    create_element, create_text, find_nodes, get_node_attr, get_node_name, get_parent_node,
    html_to_dom, set_node_attr, text_content,
};
pub use range::{Boundary, SelectionRange};
