//! # Lexical Overlay
//!
//! 在已渲染的网页上覆盖目标语言词汇，支持悬停查看释义、点击发音，
//! 复制时自动还原为原文。
//!
//! ## 模块组织
//!
//! - `env` - 类型化的环境变量
//! - `parsers` - HTML 文档模型、节点分类与选区
//! - `translation` - 注释引擎

pub mod env;
pub mod parsers;
pub mod translation;

pub use parsers::{Document, NodeKind, SelectionRange};
pub use translation::{LifecycleController, TranslationError, TranslationResult};
