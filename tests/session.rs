use page_anchor::storage::{HighlightStorage, JsonFileStorage};
use page_anchor::timer::ManualClock;
use page_anchor::{Document, HighlightColor, HighlighterConfig, PageSession, TextSearchEngine};

const ARTICLE: &str = "<body><article><h1>Notes</h1><p>The first claim is here.</p>\
                       <p>A second, longer claim follows it.</p></article></body>";

fn open(html: &str, storage: JsonFileStorage, url: &str) -> PageSession<JsonFileStorage> {
    PageSession::new(url, Document::parse_html(html), storage, HighlighterConfig::default()).unwrap()
}

async fn highlight(session: &mut PageSession<JsonFileStorage>, text: &str, color: HighlightColor) {
    let (range, _) = TextSearchEngine::new()
        .search(session.document_mut(), text)
        .unwrap();
    session.highlight_range(&range, color).await.unwrap();
}

#[tokio::test]
async fn test_file_backed_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("store.json");

    let mut first = open(ARTICLE, JsonFileStorage::new(&file), "https://blog.example/post?ref=home");
    highlight(&mut first, "first claim", HighlightColor::Yellow).await;
    highlight(&mut first, "longer claim", HighlightColor::Green).await;
    assert_eq!(first.key(), "highlights:https://blog.example/post");

    // Same page reached through a different tracking link, with new markup
    let changed = "<body><main><article><h1>Notes</h1><div><p>The first claim is here.</p>\
                   <p>A second, longer claim follows it.</p></div></article></main></body>";
    let mut second = open(
        changed,
        JsonFileStorage::new(&file),
        "https://blog.example/post/?utm_source=mail#comments",
    );
    let clock = ManualClock::new();
    let summary = second.restore(&clock).await.unwrap();

    assert_eq!(summary.restored, 2);
    assert_eq!(summary.unrestored, 0);
    assert_eq!(summary.via_search, 2);
    let quotes: Vec<_> = second.store().quotes().into_iter().map(|q| q.1).collect();
    assert_eq!(quotes, vec!["first claim", "longer claim"]);

    let id = second.store().ids()[0];
    assert!(second.remove(id).await.unwrap());
    let stored = second.storage().load(second.key()).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].text, "longer claim");
}

#[tokio::test]
async fn test_pages_do_not_share_entries() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("store.json");

    let mut a = open(ARTICLE, JsonFileStorage::new(&file), "https://blog.example/a");
    highlight(&mut a, "first claim", HighlightColor::Blue).await;

    let mut b = open(ARTICLE, JsonFileStorage::new(&file), "https://blog.example/b");
    let summary = b.restore(&ManualClock::new()).await.unwrap();
    assert_eq!(summary.restored, 0);
    assert!(b.store().is_empty());

    a.clear().await.unwrap();
    let storage = JsonFileStorage::new(&file);
    assert!(storage.load(a.key()).await.unwrap().is_empty());
}
