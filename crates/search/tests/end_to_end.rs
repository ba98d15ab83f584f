#![forbid(unsafe_code)]

use sift_core::{ContentType, DiscoveryState, EngineConfig, Filters, Item, ItemKind, SortStrategy, Tab};
use sift_search::{discover, TabCount};

fn post(id: &str, title: &str, likes: u64) -> Item {
    Item::post(id, title, "author", 1_700_000_000, likes)
}

fn pool() -> Vec<Item> {
    vec![
        post("p1", "Getting started with React", 12),
        post("p2", "Rust ownership explained", 90),
        post("p3", "React server components", 48),
        post("p4", "CSS grid in practice", 7).with_body("works well with react layouts"),
        post("p5", "Vue vs Svelte", 33),
        post("p6", "Testing react hooks", 48),
        post("p7", "Kubernetes for humans", 51),
        post("p8", "Preact and signals", 5),
        Item::user("u1", "Dana Reactor", "dana", 300, true),
        Item::user("u2", "Sam", "sam", 1_000, false).with_body("backend, go, postgres"),
        Item::topic("t1", "react", 120, 64),
        Item::topic("t2", "rust", 80, 70),
    ]
}

#[test]
fn react_search_by_popularity_groups_into_tabs() {
    let pool = pool();
    let state = DiscoveryState::default()
        .with_query("react")
        .with_filters(Filters {
            content_type: ContentType::All,
            sort_by: SortStrategy::Popularity,
            ..Filters::default()
        });
    let cfg = EngineConfig { page_size: 20, ..EngineConfig::default() };
    let d = discover(&pool, &state, &cfg);

    let ids: Vec<&str> = d.items.iter().map(|r| r.item.id()).collect();
    // u1 300 followers, t1 64, p3 and p6 tie at 48 and keep pool order, then p1 12, p4 7, p8 5
    assert_eq!(ids, ["u1", "t1", "p3", "p6", "p1", "p4", "p8"]);

    for r in &d.items {
        assert!(r.item.text_fields().iter().any(|f| f.to_lowercase().contains("react")));
    }
    let pops: Vec<u64> = d.items.iter().map(|r| r.item.popularity()).collect();
    assert!(pops.windows(2).all(|w| w[0] >= w[1]));

    assert_eq!(d.tabs, vec![
        TabCount { tab: Tab::All, count: 7 },
        TabCount { tab: Tab::Post, count: 5 },
        TabCount { tab: Tab::User, count: 1 },
        TabCount { tab: Tab::Topic, count: 1 },
    ]);
    assert!(d.window.is_empty(), "a single page needs no page window");
}

#[test]
fn switching_tabs_keeps_bucket_order() {
    let pool = pool();
    let base = DiscoveryState::default()
        .with_query("react")
        .with_filters(Filters { sort_by: SortStrategy::Popularity, ..Filters::default() });
    let cfg = EngineConfig::default();
    let posts = discover(&pool, &base.with_tab(Tab::Post), &cfg);
    let ids: Vec<&str> = posts.items.iter().map(|r| r.item.id()).collect();
    assert_eq!(ids, ["p3", "p6", "p1", "p4", "p8"]);
    assert!(posts.items.iter().all(|r| r.item.kind() == ItemKind::Post));
}

#[test]
fn verified_and_author_filters_compose() {
    let pool = pool();
    let state = DiscoveryState::default().with_filters(Filters {
        verified: true,
        author: Some("nobody".into()),
        ..Filters::default()
    });
    let d = discover(&pool, &state, &EngineConfig::default());
    // posts fail the author filter, only the verified user survives
    let ids: Vec<&str> = d.items.iter().map(|r| r.item.id()).collect();
    assert_eq!(ids, ["u1"]);
    assert_eq!(d.debug.matcher.after_author, 4);
    assert_eq!(d.debug.matcher.after_verified, 1);
}

#[test]
fn personalized_relevance_prefers_interest_tags() {
    let pool = vec![
        Item::post("a", "intro", "x", 0, 0).with_tags(["go"]),
        Item::post("b", "intro", "x", 0, 0).with_tags(["rust", "rust-async"]),
        Item::post("c", "intro", "x", 0, 0).with_tags(["rust"]),
        Item::post("d", "intro", "x", 0, 0).with_similarity(0.95),
    ];
    let state = DiscoveryState::default()
        .with_filters(Filters { sort_by: SortStrategy::Relevance, ..Filters::default() })
        .with_interests(["Rust"]);
    let d = discover(&pool, &state, &EngineConfig::default());
    let ids: Vec<&str> = d.items.iter().map(|r| r.item.id()).collect();
    // d 0.95, b 0.7, c 0.6, a 0.5
    assert_eq!(ids, ["d", "b", "c", "a"]);
    let scores: Vec<f32> = d.items.iter().filter_map(|r| r.score).collect();
    assert!(scores.windows(2).all(|w| w[0] >= w[1]));
}

#[test]
fn discovery_serializes_for_clients() {
    let pool = pool();
    let d = discover(&pool, &DiscoveryState::default().with_query("rust"), &EngineConfig::default());
    let v = serde_json::to_value(&d).unwrap();
    assert_eq!(v["tab"], "all");
    assert_eq!(v["total"], 2);
    assert_eq!(v["items"][0]["item"]["kind"], "post");
    assert_eq!(v["debug"]["after_text"], 2);
}
