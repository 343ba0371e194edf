//! 注释管道模块
//!
//! 提取 → 索引 → 应用 → 监视 → 还原，按数据流顺序组织

pub mod applier;
pub mod extractor;
pub mod index;
pub mod revert;
pub mod watcher;

// 重新导出主要类型
pub use applier::{ApplyOptions, ApplyOutcome, ApplyStats, OverlayApplier};
pub use extractor::{extract_page_text, leaves, LeafWalker, VisitedLeaves};
pub use index::{AnnotationIndex, TranslationRecord};
pub use revert::{full_revert, revert_selection, ClipboardPayload, CopyOutcome, RevertStats};
pub use watcher::{ChangeWatcher, Debouncer, ScheduledTask};
