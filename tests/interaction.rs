//! 悬停提示与发音集成测试

use std::rc::Rc;
use std::time::{Duration, Instant};

use lexical_overlay::parsers::html::classify::NodeKind;
use lexical_overlay::parsers::html::dom::{find_nodes, get_node_attr, text_content};
use lexical_overlay::parsers::html::utils::ATTR_PLAYBACK_STATE;
use lexical_overlay::parsers::Document;
use lexical_overlay::translation::interaction::{PlaybackState, TooltipView};
use lexical_overlay::translation::{
    Capabilities, DocumentEvent, EngineConfig, EventResponse, LifecycleController, NoopUsageSink,
    Rect, ScrollOffset, UnavailableSynthesizer, Voice,
};
use markup5ever_rcdom::Handle;

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{enabled_store, nodes_of, sample_records, Harness, RecordingSynth};

const PAGE: &str = "<p>Hello there, my cat</p><p>plain</p>";

fn annotate(harness: &mut Harness) {
    let ticket = harness.controller.start().expect("first run");
    harness.controller.complete_run(ticket, Ok(sample_records()));
    harness.document().take_records();
}

fn first_of(harness: &Harness, kind: NodeKind) -> Handle {
    nodes_of(&harness.root(), kind)
        .into_iter()
        .next()
        .expect("node of kind")
}

fn hover(harness: &mut Harness, target: Handle) -> EventResponse {
    harness.controller.dispatch(
        DocumentEvent::PointerEnter {
            target,
            rect: Rect::new(10.0, 20.0, 40.0, 16.0),
            scroll: ScrollOffset { x: 0.0, y: 100.0 },
        },
        Instant::now(),
    )
}

#[test]
fn hovering_a_word_shows_its_metadata() {
    let mut harness = Harness::new(PAGE, enabled_store("fr"));
    annotate(&mut harness);
    let word = first_of(&harness, NodeKind::MarkerWord);

    let response = hover(&mut harness, word);
    assert_eq!(
        response,
        EventResponse::TooltipShown(TooltipView {
            original: "hello".to_string(),
            translated: "bonjour".to_string(),
            meaning: "a greeting".to_string(),
            pronunciation: "bohn-ZHOOR".to_string(),
            left: 10.0,
            top: 141.0,
        })
    );

    let tooltip = harness.controller.tooltip();
    assert!(tooltip.is_visible());
    let text = text_content(tooltip.node().expect("tooltip node"));
    assert!(text.contains("hello \u{2192} bonjour"));
    assert!(text.contains("Meaning: a greeting"));
    assert!(text.contains("Pronunciation: bohn-ZHOOR"));
}

#[test]
fn usage_is_reported_once_per_word() {
    let mut harness = Harness::new(PAGE, enabled_store("fr"));
    annotate(&mut harness);
    let words = nodes_of(&harness.root(), NodeKind::MarkerWord);
    assert_eq!(words.len(), 2);

    hover(&mut harness, words[0].clone());
    hover(&mut harness, words[0].clone());
    hover(&mut harness, words[1].clone());
    hover(&mut harness, words[0].clone());

    assert_eq!(*harness.usage.words.borrow(), vec!["hello", "cat"]);
}

#[test]
fn leaving_hides_but_keeps_the_tooltip() {
    let mut harness = Harness::new(PAGE, enabled_store("fr"));
    annotate(&mut harness);
    let word = first_of(&harness, NodeKind::MarkerWord);

    hover(&mut harness, word.clone());
    let response = harness
        .controller
        .dispatch(DocumentEvent::PointerLeave { target: word }, Instant::now());
    assert_eq!(response, EventResponse::TooltipHidden);

    let tooltip = harness.controller.tooltip();
    assert!(!tooltip.is_visible());
    let node = tooltip.node().expect("tooltip node");
    let style = get_node_attr(node, "style").expect("style");
    assert!(style.contains("display: none"));
    assert_eq!(nodes_of(&harness.root(), NodeKind::EngineUi).len(), 1);
}

#[test]
fn events_outside_markers_are_ignored() {
    let mut harness = Harness::new(PAGE, enabled_store("fr"));
    annotate(&mut harness);
    let paragraphs = find_nodes(&harness.document().root(), &["html", "body", "p"]);
    let plain = paragraphs[1].clone();

    assert_eq!(hover(&mut harness, plain.clone()), EventResponse::Ignored);
    assert_eq!(
        harness
            .controller
            .dispatch(DocumentEvent::Click { target: plain }, Instant::now()),
        EventResponse::Ignored
    );
    assert!(harness.usage.words.borrow().is_empty());
}

#[test]
fn tooltip_updates_do_not_schedule_a_run() {
    let mut harness = Harness::new(PAGE, enabled_store("fr"));
    annotate(&mut harness);
    let word = first_of(&harness, NodeKind::MarkerWord);

    hover(&mut harness, word);
    assert!(harness.document().has_pending_records());
    assert!(!harness.controller.observe_mutations(Instant::now()));
    assert!(harness.controller.next_deadline().is_none());
}

#[test]
fn clicking_the_speaker_plays_the_translation() {
    let mut harness = Harness::new(PAGE, enabled_store("fr"));
    annotate(&mut harness);
    let button = first_of(&harness, NodeKind::PlaybackButton);
    let icon = button.children.borrow()[0].clone();

    let now = Instant::now();
    let response = harness
        .controller
        .dispatch(DocumentEvent::Click { target: icon }, now);
    assert_eq!(response, EventResponse::Playback(PlaybackState::Playing));
    assert_eq!(
        get_node_attr(&button, ATTR_PLAYBACK_STATE).as_deref(),
        Some("playing")
    );

    {
        let spoken = harness.synth.spoken.borrow();
        assert_eq!(spoken.len(), 1);
        assert_eq!(spoken[0].text, "bonjour");
        assert_eq!(spoken[0].lang, "fr-FR");
        assert_eq!(spoken[0].voice, Some(Voice::new("Thomas", "fr-FR")));
        assert!((spoken[0].rate - 0.8).abs() < f32::EPSILON);
    }

    assert!(harness.controller.tick(now + Duration::from_millis(1999)).is_none());
    assert!(get_node_attr(&button, ATTR_PLAYBACK_STATE).is_some());
    harness.controller.tick(now + Duration::from_secs(2));
    assert!(get_node_attr(&button, ATTR_PLAYBACK_STATE).is_none());
}

#[test]
fn synthesis_failure_marks_the_button() {
    let mut harness = Harness::with_synth(
        PAGE,
        enabled_store("fr"),
        RecordingSynth::failing("interrupted"),
    );
    annotate(&mut harness);
    let button = first_of(&harness, NodeKind::PlaybackButton);

    let response = harness
        .controller
        .dispatch(DocumentEvent::Click { target: button.clone() }, Instant::now());
    assert_eq!(response, EventResponse::Playback(PlaybackState::Error));
    assert_eq!(
        get_node_attr(&button, ATTR_PLAYBACK_STATE).as_deref(),
        Some("error")
    );
    assert!(harness.synth.spoken.borrow().is_empty());
}

#[test]
fn missing_speech_support_reports_an_error() {
    let capabilities = Capabilities {
        speech: Rc::new(UnavailableSynthesizer),
        usage: Rc::new(NoopUsageSink),
    };
    let mut controller = LifecycleController::new(
        Document::parse(PAGE),
        EngineConfig::default(),
        Box::new(enabled_store("fr")),
        capabilities,
    );
    let ticket = controller.start().expect("first run");
    controller.complete_run(ticket, Ok(sample_records()));

    let button = nodes_of(&controller.document().content_root(), NodeKind::PlaybackButton)
        .into_iter()
        .next()
        .expect("button");
    let response = controller.dispatch(DocumentEvent::Click { target: button }, Instant::now());
    assert_eq!(response, EventResponse::Playback(PlaybackState::Error));
}
