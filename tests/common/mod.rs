// 集成测试公共模块
//
// 提供文档构建、测试用翻译服务和能力替身

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use markup5ever_rcdom::Handle;
use serde_json::json;

use lexical_overlay::parsers::html::classify::{collect_outermost, NodeKind};
use lexical_overlay::parsers::html::dom::{find_nodes, text_content};
use lexical_overlay::parsers::Document;
use lexical_overlay::translation::storage::settings::{
    KEY_LEARNING_LEVEL, KEY_TARGET_LANGUAGE, KEY_TRANSLATION_ENABLED,
};
use lexical_overlay::translation::{
    Capabilities, EngineConfig, LifecycleController, MemoryStore, PlaybackFailure,
    SpeechSynthesizer, TranslateRequest, TranslationBackend, TranslationError, TranslationRecord,
    TranslationResult, UsageSink, Utterance, Voice,
};

/// 常用翻译记录
pub fn sample_records() -> Vec<TranslationRecord> {
    vec![
        TranslationRecord::new("hello", "bonjour", "a greeting", "bohn-ZHOOR"),
        TranslationRecord::new("cat", "chat", "a small feline", "shah"),
    ]
}

/// 记录调用次数的翻译服务
#[derive(Debug, Default)]
pub struct CountingBackend {
    records: Vec<TranslationRecord>,
    calls: Cell<usize>,
    requests: RefCell<Vec<TranslateRequest>>,
}

impl CountingBackend {
    pub fn new(records: Vec<TranslationRecord>) -> Self {
        Self {
            records,
            calls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_request(&self) -> Option<TranslateRequest> {
        self.requests.borrow().last().cloned()
    }
}

impl TranslationBackend for CountingBackend {
    async fn translate(&self, request: &TranslateRequest) -> TranslationResult<Vec<TranslationRecord>> {
        self.calls.set(self.calls.get() + 1);
        self.requests.borrow_mut().push(request.clone());
        Ok(self.records.clone())
    }
}

/// 总是失败的翻译服务
#[derive(Debug, Default)]
pub struct FailingBackend;

impl TranslationBackend for FailingBackend {
    async fn translate(&self, _request: &TranslateRequest) -> TranslationResult<Vec<TranslationRecord>> {
        Err(TranslationError::HttpStatus(503))
    }
}

/// 记录朗读请求的语音合成
#[derive(Debug, Default)]
pub struct RecordingSynth {
    pub voices: Vec<Voice>,
    pub fail_with: Option<String>,
    pub spoken: RefCell<Vec<Utterance>>,
}

impl RecordingSynth {
    pub fn with_voices(voices: Vec<Voice>) -> Self {
        Self {
            voices,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl SpeechSynthesizer for RecordingSynth {
    fn is_available(&self) -> bool {
        true
    }

    fn voices(&self) -> Vec<Voice> {
        self.voices.clone()
    }

    fn speak(&self, utterance: Utterance) -> Result<(), PlaybackFailure> {
        if let Some(message) = &self.fail_with {
            return Err(PlaybackFailure::Synthesis(message.clone()));
        }
        self.spoken.borrow_mut().push(utterance);
        Ok(())
    }
}

/// 记录使用通知
#[derive(Debug, Default)]
pub struct RecordingUsage {
    pub words: RefCell<Vec<String>>,
}

impl UsageSink for RecordingUsage {
    fn notify(&self, original: &str) {
        self.words.borrow_mut().push(original.to_string());
    }
}

/// 已启用翻译的设置存储
pub fn enabled_store(target_language: &str) -> MemoryStore {
    MemoryStore::new()
        .with(KEY_TARGET_LANGUAGE, json!(target_language))
        .with(KEY_LEARNING_LEVEL, json!("beginner"))
        .with(KEY_TRANSLATION_ENABLED, json!(true))
}

/// 控制器及其能力替身
pub struct Harness {
    pub controller: LifecycleController,
    pub synth: Rc<RecordingSynth>,
    pub usage: Rc<RecordingUsage>,
}

impl Harness {
    pub fn new(html: &str, store: MemoryStore) -> Self {
        Self::with_synth(html, store, RecordingSynth::with_voices(vec![Voice::new("Thomas", "fr-FR")]))
    }

    pub fn with_synth(html: &str, store: MemoryStore, synth: RecordingSynth) -> Self {
        let synth = Rc::new(synth);
        let usage = Rc::new(RecordingUsage::default());
        let capabilities = Capabilities {
            speech: synth.clone(),
            usage: usage.clone(),
        };
        let controller = LifecycleController::new(
            Document::parse(html),
            EngineConfig::default(),
            Box::new(store),
            capabilities,
        );
        Self {
            controller,
            synth,
            usage,
        }
    }

    pub fn document(&self) -> &Document {
        self.controller.document()
    }

    pub fn root(&self) -> Handle {
        self.controller.document().content_root()
    }
}

/// 文档中所有 `<p>` 的文本
pub fn paragraph_texts(document: &Document) -> Vec<String> {
    find_nodes(&document.root(), &["html", "body", "p"])
        .iter()
        .map(text_content)
        .collect()
}

/// 子树中指定类型的节点
pub fn nodes_of(root: &Handle, kind: NodeKind) -> Vec<Handle> {
    collect_outermost(root, kind)
}

/// 显示出来的译词文本
pub fn marker_words(root: &Handle) -> Vec<String> {
    nodes_of(root, NodeKind::MarkerWord)
        .iter()
        .map(text_content)
        .collect()
}
