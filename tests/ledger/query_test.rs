// Query Tests
// History paging bounds

use quizwallet::ledger::{HistoryQuery, Page};

#[test]
fn test_defaults() {
    let query = HistoryQuery::new();
    assert_eq!(query.normalized(), (1, 20));
}

#[test]
fn test_limits_clamped() {
    assert_eq!(HistoryQuery::new().with_page(0).with_limit(0).normalized(), (1, 1));
    assert_eq!(HistoryQuery::new().with_limit(10_000).normalized(), (1, 100));
}

#[test]
fn test_page_past_end_is_empty() {
    let query = HistoryQuery::new().with_page(5).with_limit(10);
    let page = Page::from_items((0..12).collect::<Vec<u32>>(), &query);

    assert!(page.items.is_empty());
    assert_eq!(page.pages, 2);
    assert_eq!(page.total, 12);
    assert_eq!(page.current, 5);
}

#[test]
fn test_empty_history() {
    let page = Page::from_items(Vec::<u32>::new(), &HistoryQuery::new());
    assert_eq!(page.pages, 0);
    assert_eq!(page.total, 0);
}

#[test]
fn test_huge_page_is_empty() {
    let query = HistoryQuery::new().with_page(usize::MAX).with_limit(20);
    let page = Page::from_items(vec![1, 2, 3], &query);

    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
    assert_eq!(page.pages, 1);
    assert_eq!(page.current, usize::MAX);
}
