use page_anchor::anchor::{serialize, SearchResolver, StructuralResolver};
use page_anchor::config::RenderConfig;
use page_anchor::dom::{BlockLayout, LayoutMetrics, NodeId};
use page_anchor::highlight::HighlightStore;
use page_anchor::search::SearchTier;
use page_anchor::text::normalize_text;
use page_anchor::{
    BoundaryPoint, Capabilities, Document, HighlightColor, HighlightId, HighlightRecord, Range,
    RangeSerializer, ResolveTier, TextSearchEngine,
};

fn store_for(doc: &Document) -> HighlightStore {
    HighlightStore::new(doc.capabilities(), &RenderConfig::default())
}

fn mark_store() -> HighlightStore {
    let caps = Capabilities {
        native_find: true,
        native_highlights: false,
    };
    HighlightStore::new(caps, &RenderConfig::default())
}

fn first_text(doc: &Document) -> NodeId {
    doc.searchable_text_nodes()[0]
}

fn span(node: NodeId, start: usize, end: usize) -> Range {
    Range::new(BoundaryPoint::new(node, start), BoundaryPoint::new(node, end))
}

fn record(id: &str, text: &str, path: &str, start: usize, end: usize) -> HighlightRecord {
    HighlightRecord {
        id: id.to_string(),
        text: text.to_string(),
        color: HighlightColor::Yellow,
        start_path: path.to_string(),
        start_offset: start,
        end_path: path.to_string(),
        end_offset: end,
    }
}

#[test]
fn test_wrapped_paragraph_restores_via_search() {
    let mut original = Document::parse_html("<body><p>hello world</p></body>");
    let mut store = store_for(&original);
    let node = first_text(&original);
    store
        .create(&mut original, &span(node, 0, 11), HighlightColor::Yellow)
        .unwrap();
    let saved = store.snapshot();
    assert_eq!(saved[0].start_path, "p[0]/text[0]");

    let mut changed = Document::parse_html("<body><div><p>hello world</p></div></body>");
    let mut restored = store_for(&changed);
    let report = restored.restore_all(&mut changed, saved);
    assert_eq!(report.restored, 1);
    assert_eq!(report.via_search, 1);

    let id = restored.ids()[0];
    let range = restored.range(&changed, id).unwrap();
    assert_eq!(changed.range_text(&range), "hello world");
}

#[test]
fn test_decomposed_text_restores_after_rewrap() {
    let mut original = Document::parse_html("<body><p>un cafe\u{301} noir</p></body>");
    let mut store = store_for(&original);
    let node = first_text(&original);
    store
        .create(&mut original, &span(node, 3, 8), HighlightColor::Yellow)
        .unwrap();
    let saved = store.snapshot();
    assert_eq!(saved[0].text, "cafe\u{301}");

    let mut changed = Document::parse_html("<body><div><p>un cafe\u{301} noir</p></div></body>");
    let mut restored = store_for(&changed);
    let report = restored.restore_all(&mut changed, saved);
    assert_eq!(report.restored, 1);
    assert_eq!(report.via_search, 1);

    let range = restored.range(&changed, restored.ids()[0]).unwrap();
    assert_eq!(changed.range_text(&range), "cafe\u{301}");
}

#[test]
fn test_composed_record_finds_decomposed_page() {
    let caps = Capabilities {
        native_find: false,
        native_highlights: true,
    };
    let mut doc = Document::parse_html_with("<body><div><p>un cafe\u{301} noir</p></div></body>", caps);
    let mut store = store_for(&doc);
    let report = store.restore_all(&mut doc, vec![record("h1", "caf\u{e9}", "p[0]/text[0]", 3, 7)]);
    assert_eq!(report.restored, 1);

    let range = store.range(&doc, HighlightId::new(1).unwrap()).unwrap();
    assert_eq!(doc.range_text(&range), "cafe\u{301}");
}

#[test]
fn test_malformed_record_is_skipped() {
    let mut doc = Document::parse_html("<body><p>kept text here</p></body>");
    let mut store = store_for(&doc);
    let records = vec![
        record("h1", "text", "p[0]/text[0]", 5, 9),
        record("h2", "nowhere to be found", "div[x]", 0, 3),
    ];

    let report = store.restore_all(&mut doc, records);
    assert_eq!(report.restored, 1);
    assert_eq!(report.unrestored, 1);
    assert_eq!(report.via_search, 0);
    assert_eq!(store.quotes(), vec![(HighlightId::new(1).unwrap(), "text")]);
}

#[test]
fn test_find_at_point_inside_mark() {
    let mut doc = Document::parse_html("<body><p>the quick brown fox</p></body>");
    let mut store = mark_store();
    let node = first_text(&doc);
    let id = store
        .create(&mut doc, &span(node, 10, 15), HighlightColor::Pink)
        .unwrap();

    let mark = doc
        .descendants(doc.body())
        .into_iter()
        .find(|&n| doc.tag(n) == Some("mark"))
        .unwrap();
    assert_eq!(doc.attribute(mark, "data-highlight-id"), Some("h1"));
    let inside = doc.children(mark)[0];

    let layout = BlockLayout::compute(&doc, LayoutMetrics::default());
    let (x, y) = layout.glyph_center(inside, 2).unwrap();
    assert_eq!(store.find_at_point(&doc, &layout, x, y), Some(id));

    let before = first_text(&doc);
    assert_eq!(doc.text(before), Some("the quick "));
    let (x, y) = layout.glyph_center(before, 1).unwrap();
    assert_eq!(store.find_at_point(&doc, &layout, x, y), None);
}

#[test]
fn test_ids_unique_and_removal_idempotent() {
    let mut doc = Document::parse_html("<body><p>one two three four</p></body>");
    let mut store = mark_store();

    let node = first_text(&doc);
    let a = store.create(&mut doc, &span(node, 0, 3), HighlightColor::Yellow).unwrap();
    // " two three four" after the first mark
    let rest = doc.searchable_text_nodes()[1];
    let b = store.create(&mut doc, &span(rest, 1, 4), HighlightColor::Green).unwrap();
    assert_ne!(a, b);

    assert!(store.remove(&mut doc, b));
    assert!(!store.remove(&mut doc, b));
    assert_eq!(doc.text_content(doc.body()), "one two three four");

    let rest = doc.searchable_text_nodes()[1];
    assert_eq!(doc.text(rest), Some(" two three four"));
    let c = store.create(&mut doc, &span(rest, 5, 10), HighlightColor::Blue).unwrap();
    assert_eq!(c, HighlightId::new(3).unwrap());
    assert_eq!(store.quotes().into_iter().map(|q| q.1).collect::<Vec<_>>(), vec!["one", "three"]);
}

#[test]
fn test_saved_offsets_ignore_rendered_marks() {
    let html = "<body><p>the cat the cat</p></body>";
    let mut doc = Document::parse_html(html);
    let mut store = mark_store();

    let node = first_text(&doc);
    let cat = store.create(&mut doc, &span(node, 4, 7), HighlightColor::Yellow).unwrap();
    // " the cat" after the first mark
    let rest = doc.searchable_text_nodes()[2];
    assert_eq!(doc.text(rest), Some(" the cat"));
    store.create(&mut doc, &span(rest, 1, 4), HighlightColor::Green).unwrap();
    assert!(store.remove(&mut doc, cat));

    let saved = store.snapshot();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].start_path, "p[0]/text[0]");
    assert_eq!((saved[0].start_offset, saved[0].end_offset), (8, 11));

    let mut fresh = Document::parse_html(html);
    let mut restored = mark_store();
    let report = restored.restore_all(&mut fresh, saved);
    assert_eq!(report.restored, 1);
    assert_eq!(report.via_search, 0);

    let mark = fresh
        .descendants(fresh.body())
        .into_iter()
        .find(|&n| fresh.tag(n) == Some("mark"))
        .unwrap();
    let before = fresh.searchable_text_nodes()[0];
    assert_eq!(fresh.text(before), Some("the cat "));
    assert_eq!(fresh.text_content(mark), "the");
}

#[test]
fn test_restored_ids_are_not_reissued() {
    let mut doc = Document::parse_html("<body><p>saved words</p></body>");
    let mut store = store_for(&doc);
    store.restore_all(&mut doc, vec![record("h7", "saved", "p[0]/text[0]", 0, 5)]);

    let node = first_text(&doc);
    let id = store
        .create(&mut doc, &span(node, 6, 11), HighlightColor::Yellow)
        .unwrap();
    assert_eq!(id.to_string(), "h8");
}

#[test]
fn test_structural_and_search_agree() {
    let html = "<body><p>alpha bravo charlie delta</p><p>echo foxtrot golf hotel</p></body>";
    let structural = RangeSerializer::with_resolvers(vec![Box::new(StructuralResolver)]);
    let searching = RangeSerializer::with_resolvers(vec![Box::new(SearchResolver::new(
        TextSearchEngine::new(),
    ))]);

    let mut doc = Document::parse_html(html);
    for node in doc.searchable_text_nodes() {
        let data = doc.text(node).unwrap().to_string();
        let bounds: Vec<(usize, usize)> = data
            .split(' ')
            .scan(0, |pos, word| {
                let start = *pos;
                *pos += word.len() + 1;
                Some((start, start + word.len()))
            })
            .collect();

        for (i, &(start, _)) in bounds.iter().enumerate() {
            for &(_, end) in &bounds[i..] {
                let range = span(node, start, end);
                let anchor = serialize(&doc, &range).unwrap();
                let text = normalize_text(&doc.range_text(&range));
                let id = HighlightId::new(1).unwrap();
                let rec = HighlightRecord::new(id, text.clone(), HighlightColor::Yellow, anchor);

                let (fast, tier) = structural.deserialize(&mut doc, &rec).unwrap();
                assert_eq!(tier, ResolveTier::Structural);
                let (slow, tier) = searching.deserialize(&mut doc, &rec).unwrap();
                assert!(matches!(tier, ResolveTier::TextSearch(_)));

                assert_eq!(doc.range_text(&fast), text);
                assert_eq!(doc.range_text(&slow), text);
            }
        }
    }
}

#[test]
fn test_search_without_native_find() {
    let caps = Capabilities {
        native_find: false,
        native_highlights: false,
    };
    let mut doc = Document::parse_html_with("<body><p>Some   spaced\n text</p></body>", caps);
    let engine = TextSearchEngine::new();

    let (range, tier) = engine.search(&mut doc, "spaced text").unwrap();
    assert_eq!(tier, SearchTier::FuzzyWalk);
    assert_eq!(normalize_text(&doc.range_text(&range)), "spaced text");
}
