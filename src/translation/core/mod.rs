//! 引擎核心模块
//!
//! 生命周期控制器与它收发的消息。控制器是唯一持有会话状态的对象，
//! 宿主通过它转发设置消息、文档事件、变更批次和时间推进。
//!
//! ## 模块依赖关系
//!
//! ```text
//! LifecycleController (controller.rs)
//!     ├── LeafWalker / OverlayApplier (pipeline/)
//!     ├── ChangeWatcher (pipeline/watcher.rs)
//!     ├── full_revert / revert_selection (pipeline/revert.rs)
//!     ├── Tooltip / PlaybackController (interaction/)
//!     └── SettingsStore (storage/settings.rs)
//! ```

pub mod controller;
pub mod messages;

pub use controller::{
    Capabilities, LifecycleController, PipelinePhase, PipelineState, RunOutcome, RunTicket,
};
pub use messages::{DocumentEvent, EventResponse, InboundMessage, OutboundMessage};
