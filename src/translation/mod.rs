//! 注释引擎
//!
//! 把译词覆盖到已渲染的文档上，并随文档变化增量维护：
//! - **core**: 生命周期控制器与消息
//! - **pipeline**: 提取、索引、应用、监视、还原
//! - **interaction**: 悬停提示与发音
//! - **client**: 远程翻译服务与使用通知
//! - **storage**: 学习者设置
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use lexical_overlay::parsers::Document;
//! use lexical_overlay::translation::{
//!     Capabilities, EngineConfig, HttpTranslationClient, LifecycleController, MemoryStore,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::default();
//! let backend = HttpTranslationClient::new(&config)?;
//! let document = Document::parse("<p>Hello world</p>");
//!
//! let mut controller = LifecycleController::new(
//!     document,
//!     config,
//!     Box::new(MemoryStore::new()),
//!     Capabilities::default(),
//! );
//! if let Some(ticket) = controller.start() {
//!     controller.execute(ticket, &backend).await;
//! }
//! # Ok(())
//! # }
//! ```

/// 配置管理模块
pub mod config;

/// 生命周期控制器与跨组件消息
pub mod core;

/// 错误处理模块
pub mod error;

/// 远程翻译服务客户端
pub mod client;

/// 悬停提示与发音播放
pub mod interaction;

/// 注释管道：提取 → 索引 → 应用 → 监视 → 还原
pub mod pipeline;

/// 学习者设置存储
pub mod storage;

pub use client::{
    HttpTranslationClient, HttpUsageBeacon, NoopUsageSink, StaticBackend, TranslateRequest,
    TranslationBackend, UsageSink,
};
pub use config::{constants, ConfigManager, EngineConfig};
pub use core::{
    Capabilities, DocumentEvent, EventResponse, InboundMessage, LifecycleController,
    OutboundMessage, PipelinePhase, RunOutcome, RunTicket,
};
pub use error::{ErrorCategory, ErrorSeverity, PlaybackFailure, TranslationError, TranslationResult};
pub use interaction::{Rect, ScrollOffset, SpeechSynthesizer, UnavailableSynthesizer, Utterance, Voice};
pub use pipeline::{AnnotationIndex, ClipboardPayload, CopyOutcome, TranslationRecord};
pub use storage::{JsonFileStore, MemoryStore, Settings, SettingsStore};
