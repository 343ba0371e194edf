//! 生命周期控制器集成测试
//!
//! 覆盖运行互斥、开关、防抖触发与设置变化后的重新运行

use std::time::{Duration, Instant};

use lexical_overlay::parsers::html::dom::{create_element, create_text};
use lexical_overlay::parsers::Document;
use lexical_overlay::translation::storage::settings::{words_translated, KEY_TRANSLATION_ENABLED};
use lexical_overlay::translation::{
    InboundMessage, MemoryStore, OutboundMessage, PipelinePhase, RunOutcome, Settings,
};
use serde_json::json;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{
    enabled_store, marker_words, paragraph_texts, sample_records, CountingBackend, FailingBackend,
    Harness,
};

fn append_paragraph(document: &Document, text: &str) {
    let paragraph = create_element("p", &[]);
    document.append_child(&paragraph, create_text(text));
    document.append_child(&document.content_root(), paragraph);
}

fn settings(target_language: &str, learning_level: &str, enabled: bool) -> Settings {
    Settings {
        target_language: target_language.to_string(),
        learning_level: learning_level.to_string(),
        translation_enabled: enabled,
    }
}

#[test]
fn start_runs_when_enabled() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));

    let ticket = harness.controller.start().expect("first run");
    assert_eq!(harness.controller.phase(), PipelinePhase::Fetching);
    assert_eq!(ticket.request.text, "Hello world");
    assert_eq!(ticket.request.target_language, "fr");
    assert_eq!(ticket.request.level, "beginner");

    let outcome = harness.controller.complete_run(ticket, Ok(sample_records()));
    assert!(matches!(outcome, RunOutcome::Applied(stats) if stats.markers_created == 1));
    assert_eq!(harness.controller.phase(), PipelinePhase::Idle);
    assert_eq!(harness.controller.processed().len(), 1);
    assert_eq!(marker_words(&harness.root()), vec!["Bonjour"]);
}

#[test]
fn start_while_disabled_does_nothing() {
    let store = MemoryStore::new().with(KEY_TRANSLATION_ENABLED, json!(false));
    let mut harness = Harness::new("<p>Hello world</p>", store);

    assert!(harness.controller.start().is_none());
    assert_eq!(harness.controller.phase(), PipelinePhase::Disabled);

    append_paragraph(harness.document(), "hello again");
    assert!(!harness.controller.observe_mutations(Instant::now()));
    assert!(harness.controller.next_deadline().is_none());
}

#[test]
fn start_installs_missing_defaults() {
    let mut harness = Harness::new("<p>Hello</p>", MemoryStore::new());

    assert!(harness.controller.start().is_none());
    let stored = Settings::load(harness.controller.store());
    assert_eq!(stored, Settings::default());
    assert_eq!(words_translated(harness.controller.store()), 0);
}

#[test]
fn empty_page_makes_no_request() {
    let mut harness = Harness::new("<p>   </p><script>var x = 1;</script>", enabled_store("fr"));

    assert!(harness.controller.start().is_none());
    assert_eq!(harness.controller.phase(), PipelinePhase::Idle);
    assert!(!harness.controller.is_processing());
}

#[tokio::test]
async fn overlapping_triggers_are_dropped() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let backend = CountingBackend::new(sample_records());

    let ticket = harness.controller.start().expect("first run");
    assert!(harness.controller.begin_run().is_none());
    assert!(harness
        .controller
        .handle_message(InboundMessage::TranslationToggled { enabled: true })
        .is_none());

    let outcome = harness.controller.execute(ticket, &backend).await;
    assert!(matches!(outcome, RunOutcome::Applied(_)));
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn run_pipeline_only_sends_unprocessed_text() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let backend = CountingBackend::new(sample_records());

    let ticket = harness.controller.start().expect("first run");
    harness.controller.execute(ticket, &backend).await;

    append_paragraph(harness.document(), "a cat");
    let outcome = harness.controller.run_pipeline(&backend).await;
    assert!(matches!(outcome, RunOutcome::Applied(stats) if stats.wrappers_created == 1));
    assert_eq!(backend.calls(), 2);
    assert_eq!(backend.last_request().map(|r| r.text).as_deref(), Some("a cat"));
    assert_eq!(marker_words(&harness.root()), vec!["Bonjour", "chat"]);
}

#[test]
fn disabling_during_fetch_discards_the_response() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));

    let ticket = harness.controller.start().expect("first run");
    assert!(harness
        .controller
        .handle_message(InboundMessage::TranslationToggled { enabled: false })
        .is_none());
    assert_eq!(harness.controller.phase(), PipelinePhase::Disabled);

    let outcome = harness.controller.complete_run(ticket, Ok(sample_records()));
    assert!(matches!(outcome, RunOutcome::Discarded));
    assert!(marker_words(&harness.root()).is_empty());
    assert_eq!(paragraph_texts(harness.document()), vec!["Hello world"]);
}

#[test]
fn toggling_off_reverts_and_stops_watching() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));

    harness
        .controller
        .handle_message(InboundMessage::TranslationToggled { enabled: false });
    assert_eq!(harness.controller.phase(), PipelinePhase::Disabled);
    assert!(harness.controller.index().is_empty());
    assert!(harness.controller.processed().is_empty());
    assert_eq!(paragraph_texts(harness.document()), vec!["Hello world"]);
    assert!(!Settings::load(harness.controller.store()).translation_enabled);

    append_paragraph(harness.document(), "hello again");
    assert!(!harness.controller.observe_mutations(Instant::now()));
    assert!(harness.controller.tick(Instant::now() + Duration::from_secs(5)).is_none());
}

#[test]
fn replaced_content_is_no_longer_tracked() {
    let mut harness = Harness::new("<p>Hello world</p><p>My cat</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));
    assert_eq!(harness.controller.processed().len(), 2);

    // 单页应用导航：正文整体换成新内容
    let root = harness.document().content_root();
    let paragraph = create_element("p", &[]);
    harness.document().append_child(&paragraph, create_text("a cat"));
    harness.document().replace_children(&root, vec![paragraph]);

    let ticket = harness.controller.begin_run().expect("run for new content");
    assert_eq!(ticket.request.text, "a cat");
    harness.controller.complete_run(ticket, Ok(sample_records()));

    let processed = harness.controller.processed();
    assert_eq!(processed.len(), 1);
    assert!(harness.document().contains(&processed[0]));
    assert_eq!(marker_words(&harness.root()), vec!["chat"]);
}

#[test]
fn toggling_back_on_starts_a_run() {
    let store = MemoryStore::new().with(KEY_TRANSLATION_ENABLED, json!(false));
    let mut harness = Harness::new("<p>Hello world</p>", store);
    assert!(harness.controller.start().is_none());

    let ticket = harness
        .controller
        .handle_message(InboundMessage::TranslationToggled { enabled: true })
        .expect("run after enabling");
    assert_eq!(ticket.request.text, "Hello world");
    assert!(Settings::load(harness.controller.store()).translation_enabled);
}

#[test]
fn page_changes_are_debounced_into_one_run() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));
    assert!(!harness.controller.observe_mutations(Instant::now()));

    let t0 = Instant::now();
    for i in 0..5u64 {
        append_paragraph(harness.document(), &format!("cat number {}", i));
        let now = t0 + Duration::from_millis(50 * i);
        assert!(harness.controller.observe_mutations(now));
    }

    let last = t0 + Duration::from_millis(200);
    assert_eq!(
        harness.controller.next_deadline(),
        Some(last + Duration::from_millis(1000))
    );
    assert!(harness.controller.tick(last + Duration::from_millis(999)).is_none());

    let ticket = harness
        .controller
        .tick(last + Duration::from_millis(1000))
        .expect("debounced run");
    assert_eq!(ticket.request.text.lines().count(), 5);
    assert!(harness.controller.tick(last + Duration::from_millis(2000)).is_none());
}

#[test]
fn engine_output_does_not_retrigger() {
    let mut harness = Harness::new("<p>Hello world</p><p>a cat</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));

    assert!(harness.document().has_pending_records());
    assert!(!harness.controller.observe_mutations(Instant::now()));
    assert!(harness.controller.next_deadline().is_none());
}

#[tokio::test]
async fn failed_fetch_leaves_index_empty_and_page_intact() {
    let mut harness = Harness::new("<p>Hello world</p><p>plain text</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));
    assert_eq!(harness.controller.index().len(), 2);

    let ticket = harness.controller.begin_run().expect("second run");
    assert_eq!(ticket.request.text, "plain text");
    let outcome = harness.controller.execute(ticket, &FailingBackend).await;
    assert!(matches!(outcome, RunOutcome::Failed(_)));

    assert!(harness.controller.index().is_empty());
    assert_eq!(harness.controller.phase(), PipelinePhase::Idle);
    assert_eq!(marker_words(&harness.root()), vec!["Bonjour"]);
}

#[test]
fn empty_response_applies_nothing() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");

    let outcome = harness.controller.complete_run(ticket, Ok(Vec::new()));
    assert!(matches!(outcome, RunOutcome::Empty));
    assert_eq!(harness.controller.phase(), PipelinePhase::Idle);
    assert!(harness.controller.drain_outbound().is_empty());
}

#[test]
fn applied_run_reports_stats() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));

    assert_eq!(
        harness.controller.drain_outbound(),
        vec![OutboundMessage::UpdateStats { count: 2 }]
    );
    assert!(harness.controller.drain_outbound().is_empty());
    assert_eq!(words_translated(harness.controller.store()), 2);
}

#[test]
fn language_change_reverts_then_reruns() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));

    let ticket = harness
        .controller
        .handle_message(InboundMessage::SettingsUpdated {
            settings: settings("es", "beginner", true),
        })
        .expect("rerun");
    assert_eq!(ticket.request.target_language, "es");
    assert_eq!(ticket.request.text, "Hello world");
    assert!(marker_words(&harness.root()).is_empty());
    assert_eq!(Settings::load(harness.controller.store()).target_language, "es");
}

#[test]
fn unchanged_settings_do_not_revert() {
    let mut harness = Harness::new("<p>Hello world</p><p>plain</p>", enabled_store("fr"));
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));

    let ticket = harness
        .controller
        .handle_message(InboundMessage::SettingsUpdated {
            settings: settings("fr", "beginner", true),
        })
        .expect("run");
    assert_eq!(ticket.request.text, "plain");
    assert_eq!(marker_words(&harness.root()), vec!["Bonjour"]);
}

#[test]
fn settings_change_during_fetch_reruns_afterwards() {
    let mut harness = Harness::new("<p>Hello world</p>", enabled_store("fr"));
    let stale = harness.controller.start().expect("first run");

    assert!(harness
        .controller
        .handle_message(InboundMessage::SettingsUpdated {
            settings: settings("de", "advanced", true),
        })
        .is_none());
    assert!(harness.controller.state().rerun_pending);

    let outcome = harness.controller.complete_run(stale, Ok(sample_records()));
    assert!(matches!(outcome, RunOutcome::Discarded));
    assert!(marker_words(&harness.root()).is_empty());

    let ticket = harness.controller.tick(Instant::now()).expect("rerun");
    assert_eq!(ticket.request.target_language, "de");
    assert_eq!(ticket.request.level, "advanced");
    assert!(!harness.controller.state().rerun_pending);
}
