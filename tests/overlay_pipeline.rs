//! 注释管道集成测试
//!
//! 提取、应用与完整还原的端到端行为

use lexical_overlay::parsers::html::classify::NodeKind;
use lexical_overlay::parsers::html::dom::{get_node_attr, text_content};
use lexical_overlay::parsers::html::utils::ATTR_ORIGINAL;
use lexical_overlay::parsers::Document;
use lexical_overlay::translation::pipeline::{
    extract_page_text, full_revert, AnnotationIndex, ApplyOptions, ApplyStats, OverlayApplier,
    TranslationRecord,
};

#[allow(dead_code)]
mod common {
    include!("common/mod.rs");
}

use common::{marker_words, nodes_of, paragraph_texts, sample_records};

fn apply(document: &Document, index: &AnnotationIndex) -> ApplyStats {
    let mut produced = Vec::new();
    OverlayApplier::new(document, index, ApplyOptions::default())
        .apply_all(&document.content_root(), &mut produced)
}

#[test]
fn hello_world_round_trip() {
    let document = Document::parse("<p>Hello world</p>");
    let index = AnnotationIndex::from_records([TranslationRecord::new("hello", "Bonjour", "", "")]);

    let stats = apply(&document, &index);
    assert_eq!(stats.wrappers_created, 1);
    assert_eq!(stats.markers_created, 1);
    assert_eq!(marker_words(&document.content_root()), vec!["Bonjour"]);

    full_revert(&document, &document.content_root());
    assert_eq!(paragraph_texts(&document), vec!["Hello world"]);
    assert!(nodes_of(&document.content_root(), NodeKind::OverlayMarker).is_empty());
}

#[test]
fn capitalization_is_symmetric() {
    let document = Document::parse("<p>Hello there, hello again</p>");
    let index = AnnotationIndex::from_records([TranslationRecord::new("hello", "bonjour", "", "")]);

    apply(&document, &index);
    assert_eq!(marker_words(&document.content_root()), vec!["Bonjour", "bonjour"]);

    full_revert(&document, &document.content_root());
    assert_eq!(paragraph_texts(&document), vec!["Hello there, hello again"]);
}

#[test]
fn punctuation_stays_outside_markers() {
    let document = Document::parse("<p>(Hello), cat!</p>");
    let index = AnnotationIndex::from_records(sample_records());

    apply(&document, &index);

    let root = document.content_root();
    let words = nodes_of(&root, NodeKind::MarkerWord);
    let originals: Vec<_> = words
        .iter()
        .filter_map(|w| get_node_attr(w, ATTR_ORIGINAL))
        .collect();
    assert_eq!(originals, vec!["hello", "cat"]);
    assert_eq!(marker_words(&root), vec!["Bonjour", "chat"]);

    let wrapper = nodes_of(&root, NodeKind::ProcessedWrapper)
        .into_iter()
        .next()
        .expect("wrapper");
    let first = wrapper.children.borrow()[0].clone();
    assert_eq!(text_content(&first), "(");

    full_revert(&document, &root);
    assert_eq!(paragraph_texts(&document), vec!["(Hello), cat!"]);
}

#[test]
fn inner_punctuation_survives_revert() {
    let document = Document::parse("<p>Don't stop</p><p>a well-known cat</p>");
    let index = AnnotationIndex::from_records([
        TranslationRecord::new("don't", "ne", "", ""),
        TranslationRecord::new("wellknown", "connu", "", ""),
    ]);

    let stats = apply(&document, &index);
    assert_eq!(stats.markers_created, 2);
    let root = document.content_root();
    assert_eq!(marker_words(&root), vec!["Ne", "connu"]);
    let originals: Vec<_> = nodes_of(&root, NodeKind::MarkerWord)
        .iter()
        .filter_map(|w| get_node_attr(w, ATTR_ORIGINAL))
        .collect();
    assert_eq!(originals, vec!["don't", "well-known"]);

    full_revert(&document, &root);
    assert_eq!(paragraph_texts(&document), vec!["Don't stop", "a well-known cat"]);
}

#[test]
fn leaves_without_matches_are_untouched() {
    let document = Document::parse("<p>Nothing to see</p><p>A cat here</p>");
    let index = AnnotationIndex::from_records(sample_records());

    let stats = apply(&document, &index);
    assert_eq!(stats.leaves_visited, 2);
    assert_eq!(stats.wrappers_created, 1);

    let records = document.take_records();
    assert_eq!(records.len(), 1, "one structural edit per replaced leaf");
    assert_eq!(paragraph_texts(&document)[0], "Nothing to see");
}

#[test]
fn second_pass_is_idempotent() {
    let document = Document::parse("<div><p>Hello cat</p><p>hello</p></div>");
    let index = AnnotationIndex::from_records(sample_records());

    let first = apply(&document, &index);
    assert_eq!(first.wrappers_created, 2);
    document.take_records();
    let html = document.to_html();

    let second = apply(&document, &index);
    assert_eq!(second.wrappers_created, 0);
    assert!(document.take_records().is_empty());
    assert_eq!(document.to_html(), html);
}

#[test]
fn non_content_is_never_annotated() {
    let document = Document::parse(
        "<p>hello</p>\
         <script>var hello = 'cat';</script>\
         <style>.cat { color: red }</style>\
         <noscript>hello</noscript>\
         <textarea>hello cat</textarea>",
    );
    let index = AnnotationIndex::from_records(sample_records());

    let stats = apply(&document, &index);
    assert_eq!(stats.wrappers_created, 1);
    assert_eq!(extract_page_text(&document.content_root()), "");
}

#[test]
fn page_text_skips_engine_output() {
    let document = Document::parse("<h1>Title</h1><p>Hello world</p>");
    let index = AnnotationIndex::from_records(sample_records());
    assert_eq!(extract_page_text(&document.content_root()), "Title\nHello world");

    apply(&document, &index);
    assert_eq!(extract_page_text(&document.content_root()), "Title");
}

#[test]
fn without_playback_no_speaker_is_rendered() {
    let document = Document::parse("<p>cat</p>");
    let index = AnnotationIndex::from_records(sample_records());
    let mut produced = Vec::new();
    OverlayApplier::new(&document, &index, ApplyOptions { show_playback: false })
        .apply_all(&document.content_root(), &mut produced);

    assert_eq!(produced.len(), 1);
    assert!(nodes_of(&document.content_root(), NodeKind::PlaybackButton).is_empty());
    assert_eq!(paragraph_texts(&document), vec!["chat"]);
}
