//! # 解析器模块
//!
//! 文档解析与 DOM 操作。
//!
//! # 模块组织
//!
//! - `html` - HTML文档解析、DOM操作、节点分类、选区

pub mod html;

// Re-export commonly used items for convenience
pub use html::{classify, Document, MutationRecord, NodeKind, SelectionRange};
