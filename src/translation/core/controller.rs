//! 生命周期控制器
//!
//! 持有启用状态、学习者设置和整个会话的可变状态，是唯一可以启动或停止管道
//! 与监视器的组件。状态机：`Idle`、`Fetching`、`Applying`、`Disabled`。
//!
//! 获取翻译是唯一的挂起点，因此一次运行被拆成 [`LifecycleController::begin_run`]
//! 和 [`LifecycleController::complete_run`] 两段；宿主在两者之间完成网络请求。
//! [`LifecycleController::run_pipeline`] 把两段与一个 [`TranslationBackend`] 串起来。

use std::rc::Rc;
use std::time::Instant;

use markup5ever_rcdom::Handle;

use crate::parsers::html::classify::{closest, collect_outermost, NodeKind};
use crate::parsers::html::dom::{get_node_attr, text_content};
use crate::parsers::html::utils::ATTR_TRANSLATION;
use crate::parsers::html::{Document, SelectionRange};
use crate::translation::client::{NoopUsageSink, TranslateRequest, TranslationBackend, UsageSink};
use crate::translation::config::EngineConfig;
use crate::translation::error::{ErrorSeverity, TranslationError, TranslationResult};
use crate::translation::interaction::{
    HoverTracker, PlaybackController, Rect, ScrollOffset, SpeechSynthesizer, Tooltip, TooltipView,
    UnavailableSynthesizer,
};
use crate::translation::pipeline::{
    extract_page_text, full_revert, revert_selection, AnnotationIndex, ApplyOptions, ApplyStats,
    ChangeWatcher, CopyOutcome, OverlayApplier, RevertStats, TranslationRecord,
};
use crate::translation::storage::settings::record_words_translated;
use crate::translation::storage::{Settings, SettingsStore};

use super::messages::{DocumentEvent, EventResponse, InboundMessage, OutboundMessage};

/// 管道阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    Fetching,
    Applying,
    Disabled,
}

/// 平台能力
#[derive(Clone)]
pub struct Capabilities {
    pub speech: Rc<dyn SpeechSynthesizer>,
    pub usage: Rc<dyn UsageSink>,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            speech: Rc::new(UnavailableSynthesizer),
            usage: Rc::new(NoopUsageSink),
        }
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("speech_available", &self.speech.is_available())
            .finish()
    }
}

/// 管道状态；只由控制器持有
#[derive(Debug)]
pub struct PipelineState {
    pub phase: PipelinePhase,
    pub settings: Settings,
    /// 变更监视器，内含待触发的防抖任务
    pub watcher: ChangeWatcher,
    /// 运行期间设置发生变化，完成后需要重新运行
    pub rerun_pending: bool,
}

impl PipelineState {
    pub fn is_processing(&self) -> bool {
        matches!(self.phase, PipelinePhase::Fetching | PipelinePhase::Applying)
    }
}

/// 一次已开始的运行，在获取完成前由宿主持有
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTicket {
    pub id: u64,
    pub request: TranslateRequest,
}

/// 运行结果
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// 被禁用、正在运行或页面没有文本，没有发起请求
    NotStarted,
    /// 响应到达时状态已改变，结果被丢弃
    Discarded,
    /// 获取失败，按零条翻译处理
    Failed(TranslationError),
    /// 服务返回零条翻译
    Empty,
    Applied(ApplyStats),
}

/// 生命周期控制器
pub struct LifecycleController {
    document: Document,
    config: EngineConfig,
    store: Box<dyn SettingsStore>,
    capabilities: Capabilities,

    state: PipelineState,
    index: AnnotationIndex,
    /// 本会话生成、尚未还原的包装容器
    processed: Vec<Handle>,
    current_run: Option<u64>,
    next_run_id: u64,

    tooltip: Tooltip,
    hovers: HoverTracker,
    playback: PlaybackController,
    outbound: Vec<OutboundMessage>,
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("phase", &self.state.phase)
            .field("settings", &self.state.settings)
            .field("index_len", &self.index.len())
            .finish()
    }
}

impl LifecycleController {
    pub fn new(
        document: Document,
        config: EngineConfig,
        store: Box<dyn SettingsStore>,
        capabilities: Capabilities,
    ) -> Self {
        let watcher = ChangeWatcher::new(config.debounce());
        let playback = PlaybackController::new(config.playback_feedback(), config.speech_rate);
        Self {
            document,
            config,
            store,
            capabilities,
            state: PipelineState {
                phase: PipelinePhase::Disabled,
                settings: Settings::default(),
                watcher,
                rerun_pending: false,
            },
            index: AnnotationIndex::new(),
            processed: Vec::new(),
            current_run: None,
            next_run_id: 0,
            tooltip: Tooltip::new(),
            hovers: HoverTracker::new(),
            playback,
            outbound: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // 访问器
    // ------------------------------------------------------------------

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn phase(&self) -> PipelinePhase {
        self.state.phase
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.state.settings
    }

    pub fn index(&self) -> &AnnotationIndex {
        &self.index
    }

    pub fn is_processing(&self) -> bool {
        self.state.is_processing()
    }

    /// 已生成的包装容器
    pub fn processed(&self) -> &[Handle] {
        &self.processed
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    pub fn store(&self) -> &dyn SettingsStore {
        self.store.as_ref()
    }

    /// 取出待发送的消息
    pub fn drain_outbound(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.outbound)
    }

    // ------------------------------------------------------------------
    // 生命周期
    // ------------------------------------------------------------------

    /// 初始化：读取设置、安装提示框；已启用时开始第一次运行
    pub fn start(&mut self) -> Option<RunTicket> {
        if let Err(e) = Settings::install_defaults(self.store.as_mut()) {
            tracing::warn!("写入默认设置失败: {}", e);
        }
        self.state.settings = Settings::load(self.store.as_ref());
        tracing::info!(
            "引擎启动: target={}, level={}, enabled={}",
            self.state.settings.target_language,
            self.state.settings.learning_level,
            self.state.settings.translation_enabled
        );

        self.tooltip.install(&self.document);
        self.document.take_records();

        if self.state.settings.translation_enabled {
            self.activate();
            self.begin_run()
        } else {
            self.state.phase = PipelinePhase::Disabled;
            None
        }
    }

    /// 处理来自设置界面的消息
    pub fn handle_message(&mut self, message: InboundMessage) -> Option<RunTicket> {
        match message {
            InboundMessage::TranslationToggled { enabled } => {
                let mut settings = self.state.settings.clone();
                settings.translation_enabled = enabled;
                self.apply_settings(settings, false)
            }
            InboundMessage::SettingsUpdated { settings } => self.apply_settings(settings, true),
        }
    }

    fn apply_settings(&mut self, settings: Settings, from_settings_surface: bool) -> Option<RunTicket> {
        let changes_translations = self.state.settings.changes_translations(&settings);
        self.state.settings = settings;
        self.persist_settings();

        if !self.state.settings.translation_enabled {
            self.disable();
            return None;
        }

        if self.state.phase == PipelinePhase::Disabled {
            self.activate();
        } else if from_settings_surface && changes_translations {
            if self.state.is_processing() {
                tracing::debug!("运行中设置已变化，完成后重新运行");
                self.state.rerun_pending = true;
                return None;
            }
            self.revert_all();
        }
        self.begin_run()
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.state.settings.save(self.store.as_mut()) {
            tracing::warn!("保存设置失败: {}", e);
        }
    }

    fn activate(&mut self) {
        self.state.phase = PipelinePhase::Idle;
        // 启用前的页面变更不会触发重新处理
        self.document.take_records();
        self.state.watcher.start();
    }

    /// 关闭翻译：完整还原并停止后续触发；正在进行的获取结果将被丢弃
    pub fn disable(&mut self) -> RevertStats {
        self.state.settings.translation_enabled = false;
        self.state.phase = PipelinePhase::Disabled;
        self.state.watcher.stop();
        self.state.rerun_pending = false;
        self.current_run = None;

        let stats = self.revert_all();
        self.tooltip.hide();
        tracing::info!("翻译已关闭");
        stats
    }

    fn revert_all(&mut self) -> RevertStats {
        let root = self.document.content_root();
        let stats = full_revert(&self.document, &root);
        self.index.clear();
        self.processed.clear();
        // 还原自身产生的变更不会触发重新处理
        self.document.take_records();
        stats
    }

    // ------------------------------------------------------------------
    // 管道运行
    // ------------------------------------------------------------------

    /// 开始一次运行：清空索引、提取页面文本并进入 `Fetching`
    ///
    /// 已在运行中时直接丢弃本次触发，不排队。
    pub fn begin_run(&mut self) -> Option<RunTicket> {
        if self.state.phase == PipelinePhase::Disabled || !self.state.settings.translation_enabled {
            tracing::debug!("翻译未启用，忽略运行请求");
            return None;
        }
        if self.state.is_processing() {
            tracing::debug!("已有运行进行中，丢弃本次触发");
            return None;
        }

        self.index.clear();

        let root = self.document.content_root();
        let text = extract_page_text(&root);
        if text.trim().is_empty() {
            tracing::info!("页面没有可翻译的文本");
            return None;
        }

        self.next_run_id += 1;
        let id = self.next_run_id;
        self.current_run = Some(id);
        self.state.phase = PipelinePhase::Fetching;

        tracing::info!("开始第 {} 次运行，文本 {} 字符", id, text.chars().count());
        Some(RunTicket {
            id,
            request: TranslateRequest::new(
                text,
                &self.state.settings.learning_level,
                &self.state.settings.target_language,
            ),
        })
    }

    /// 获取完成后的处理；响应到达时先检查当前状态
    pub fn complete_run(
        &mut self,
        ticket: RunTicket,
        result: TranslationResult<Vec<TranslationRecord>>,
    ) -> RunOutcome {
        if self.current_run != Some(ticket.id) || self.state.phase != PipelinePhase::Fetching {
            tracing::debug!("运行 #{} 的响应已过期，丢弃", ticket.id);
            return RunOutcome::Discarded;
        }
        self.current_run = None;
        self.prune_detached();

        if self.state.rerun_pending {
            self.state.phase = PipelinePhase::Idle;
            tracing::debug!("运行 #{} 使用了旧设置，丢弃结果", ticket.id);
            return RunOutcome::Discarded;
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                match e.severity() {
                    ErrorSeverity::Critical => tracing::error!("获取翻译失败，按零条处理: {}", e),
                    _ => tracing::warn!(
                        "获取翻译失败 ({:?}, 可重试: {})，按零条处理: {}",
                        e.category(),
                        e.is_retryable(),
                        e
                    ),
                }
                self.state.phase = PipelinePhase::Idle;
                return RunOutcome::Failed(e);
            }
        };
        if records.is_empty() {
            tracing::info!("服务没有返回翻译");
            self.state.phase = PipelinePhase::Idle;
            return RunOutcome::Empty;
        }

        self.state.phase = PipelinePhase::Applying;
        self.index.replace(records);

        let root = self.document.content_root();
        let options = ApplyOptions {
            show_playback: self.config.show_playback,
        };
        let stats = OverlayApplier::new(&self.document, &self.index, options)
            .apply_all(&root, &mut self.processed);

        self.state.phase = PipelinePhase::Idle;
        self.update_stats();

        tracing::info!(
            "运行 #{} 完成: {} 条翻译，替换 {} 个文本节点",
            ticket.id,
            self.index.len(),
            stats.wrappers_created
        );
        RunOutcome::Applied(stats)
    }

    /// 页面替换内容后，旧包装容器已不在文档中，不再跟踪
    fn prune_detached(&mut self) {
        let before = self.processed.len();
        let document = &self.document;
        self.processed.retain(|wrapper| document.contains(wrapper));
        let dropped = before - self.processed.len();
        if dropped > 0 {
            tracing::debug!("清理 {} 个已脱离文档的包装容器", dropped);
        }
    }

    /// 开始运行并通过给定服务完成它
    pub async fn run_pipeline<B: TranslationBackend>(&mut self, backend: &B) -> RunOutcome {
        match self.begin_run() {
            Some(ticket) => self.execute(ticket, backend).await,
            None => RunOutcome::NotStarted,
        }
    }

    /// 为已开始的运行执行获取
    pub async fn execute<B: TranslationBackend>(&mut self, ticket: RunTicket, backend: &B) -> RunOutcome {
        let result = backend.translate(&ticket.request).await;
        self.complete_run(ticket, result)
    }

    fn update_stats(&mut self) {
        let count = self.index.len();
        if let Err(e) = record_words_translated(self.store.as_mut(), count) {
            tracing::warn!("更新统计失败: {}", e);
        }
        self.outbound.push(OutboundMessage::UpdateStats { count });
    }

    // ------------------------------------------------------------------
    // 变更与时间
    // ------------------------------------------------------------------

    /// 读取文档变更批次；批次合格时重置防抖计时并返回 `true`
    pub fn observe_mutations(&mut self, now: Instant) -> bool {
        let records = self.document.take_records();
        if self.state.phase == PipelinePhase::Disabled {
            return false;
        }
        self.state.watcher.observe(&records, now)
    }

    /// 推进时间：清除到期的按钮状态，触发到期的防抖任务
    pub fn tick(&mut self, now: Instant) -> Option<RunTicket> {
        self.playback.expire(now);

        if self.state.rerun_pending && !self.state.is_processing() {
            self.state.rerun_pending = false;
            if self.state.phase != PipelinePhase::Disabled {
                self.revert_all();
                return self.begin_run();
            }
        }

        if self.state.watcher.poll(now) {
            return self.begin_run();
        }
        None
    }

    /// 下一个防抖任务的截止时间
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.watcher.debouncer().pending().map(|task| task.deadline)
    }

    // ------------------------------------------------------------------
    // 文档事件
    // ------------------------------------------------------------------

    pub fn dispatch(&mut self, event: DocumentEvent, now: Instant) -> EventResponse {
        match event {
            DocumentEvent::PointerEnter {
                target,
                rect,
                scroll,
            } => self.on_pointer_enter(&target, rect, scroll),
            DocumentEvent::PointerLeave { target } => self.on_pointer_leave(&target),
            DocumentEvent::Click { target } => self.on_click(&target, now),
            DocumentEvent::Copy { selection } => self.on_copy(selection.as_ref()),
        }
    }

    /// 悬停在译词上：显示提示框，首次悬停时发送使用通知
    pub fn on_pointer_enter(&mut self, target: &Handle, rect: Rect, scroll: ScrollOffset) -> EventResponse {
        let Some(word) = closest(target, NodeKind::MarkerWord) else {
            return EventResponse::Ignored;
        };
        let Some(view) = TooltipView::from_word(&word, rect, scroll, self.config.tooltip_offset_px)
        else {
            tracing::debug!("译词缺少元数据，不显示提示框");
            return EventResponse::Ignored;
        };

        self.tooltip.show(&self.document, &view);
        if self.hovers.first_hover(&view.original) {
            self.capabilities.usage.notify(&view.original);
        }
        EventResponse::TooltipShown(view)
    }

    pub fn on_pointer_leave(&mut self, target: &Handle) -> EventResponse {
        if closest(target, NodeKind::MarkerWord).is_none() {
            return EventResponse::Ignored;
        }
        self.tooltip.hide();
        EventResponse::TooltipHidden
    }

    /// 点击发音按钮：朗读译文
    pub fn on_click(&mut self, target: &Handle, now: Instant) -> EventResponse {
        let Some(button) = closest(target, NodeKind::PlaybackButton) else {
            return EventResponse::Ignored;
        };
        let Some(marker) = closest(&button, NodeKind::OverlayMarker) else {
            return EventResponse::Ignored;
        };
        let Some(word) = collect_outermost(&marker, NodeKind::MarkerWord).into_iter().next() else {
            return EventResponse::Ignored;
        };

        let text = get_node_attr(&word, ATTR_TRANSLATION)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| text_content(&word));
        let state = self.playback.play(
            self.capabilities.speech.as_ref(),
            &button,
            &text,
            &self.state.settings.target_language,
            now,
        );
        EventResponse::Playback(state)
    }

    /// 复制：选区含译词时用原文覆盖剪贴板
    pub fn on_copy(&mut self, selection: Option<&SelectionRange>) -> EventResponse {
        match selection {
            Some(range) => EventResponse::Copy(revert_selection(range)),
            None => EventResponse::Copy(CopyOutcome::Native),
        }
    }
}
