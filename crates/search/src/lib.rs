//! Sift search: match, score, sort, group and page one pool snapshot.
//!
//! Each stage is a pure function of its inputs; [`discover`] composes them for
//! one [`DiscoveryState`]. Nothing is cached between calls.

#![forbid(unsafe_code)]

use serde::Serialize;
use sift_core::{DiscoveryState, EngineConfig, Item, SortStrategy, Tab};
use tracing::debug;

pub mod grouper;
pub mod matcher;
pub mod paginator;
pub mod scorer;
pub mod sorter;

pub use grouper::{group, Groups, TabCount};
pub use matcher::{admit, matches, MatchDebugInfo, Matcher};
pub use paginator::{clamp_page, compute_window, nav, navigate, page_slice, total_pages, PageNav, PageWindow};
pub use scorer::{score, Scorer};
pub use sorter::{compare, sort, Ranked};

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryDebugInfo {
    #[serde(flatten)]
    pub matcher: MatchDebugInfo,
    pub strategy: SortStrategy,
    pub eval_us: u64,
}

/// One page of results plus everything a tabbed, paged result list needs to render.
#[derive(Debug, Clone, Serialize)]
pub struct Discovery<'a> {
    /// Active tab; falls back to `all` when the requested tab is empty.
    pub tab: Tab,
    pub tabs: Vec<TabCount>,
    /// Items in the active tab across all pages.
    pub total: usize,
    pub total_pages: u32,
    /// Clamped into `[1, total_pages]`.
    pub page: u32,
    pub window: PageWindow,
    pub nav: PageNav,
    pub items: Vec<Ranked<'a>>,
    pub debug: DiscoveryDebugInfo,
}

/// Run the whole pipeline for `state` over `pool`.
pub fn discover<'a>(pool: &'a [Item], state: &DiscoveryState, config: &EngineConfig) -> Discovery<'a> {
    let started = std::time::Instant::now();
    let filters = &state.filters;

    let (admitted, match_dbg) = admit(pool, &state.query, filters);
    metrics::histogram!("discovery_matched", admitted.len() as f64);

    let mut scorer = Scorer::from_config(&state.interests, config);
    let ordered = sort(admitted, filters.sort_by, &mut scorer);
    let groups = group(ordered);

    let tab = if groups.is_visible(state.tab) { state.tab } else { Tab::All };
    let bucket = groups.bucket(tab);
    let total = bucket.len();
    let pages = total_pages(total, state.page_size);
    let page = clamp_page(state.page, pages);
    let items = page_slice(bucket, page, state.page_size).to_vec();

    let elapsed = started.elapsed();
    metrics::histogram!("discovery_eval_ms", elapsed.as_secs_f64() * 1_000.0);
    debug!(
        query = %state.query,
        strategy = ?filters.sort_by,
        total = match_dbg.total,
        matched = match_dbg.after_verified,
        tab = ?tab,
        page,
        pages,
        "discovery evaluated"
    );

    Discovery {
        tab,
        tabs: groups.tabs(),
        total,
        total_pages: pages,
        page,
        window: compute_window(page, pages, state.max_visible_pages),
        nav: nav(page, pages),
        items,
        debug: DiscoveryDebugInfo {
            matcher: match_dbg,
            strategy: filters.sort_by,
            eval_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{ContentType, Filters, Privacy};

    fn pool() -> Vec<Item> {
        let mut items: Vec<Item> = (0..25)
            .map(|i| Item::post(format!("p{i}"), format!("post {i}"), "dana", i, i as u64))
            .collect();
        items.push(Item::user("u1", "Dana", "dana", 5, false));
        items.push(Item::group("g1", "Rust group", 9, Privacy::Public));
        items
    }

    #[test]
    fn empty_pool_yields_single_empty_page() {
        let d = discover(&[], &DiscoveryState::default(), &EngineConfig::default());
        assert_eq!(d.total, 0);
        assert_eq!(d.total_pages, 1);
        assert_eq!(d.page, 1);
        assert!(d.items.is_empty());
        assert!(d.window.is_empty());
        assert_eq!(d.tabs, vec![TabCount { tab: Tab::All, count: 0 }]);
    }

    #[test]
    fn pages_through_the_active_bucket() {
        let pool = pool();
        let state = DiscoveryState::default()
            .with_filters(Filters { sort_by: SortStrategy::Popularity, ..Filters::default() })
            .with_tab(Tab::Post)
            .with_page(3);
        let d = discover(&pool, &state, &EngineConfig::default());
        assert_eq!(d.tab, Tab::Post);
        assert_eq!(d.total, 25);
        assert_eq!(d.total_pages, 3);
        assert_eq!(d.page, 3);
        let ids: Vec<&str> = d.items.iter().map(|r| r.item.id()).collect();
        assert_eq!(ids, ["p4", "p3", "p2", "p1", "p0"]);
        assert_eq!(d.window.pages, vec![1, 2, 3]);
        assert_eq!(d.nav, PageNav { prev: true, next: false });
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let pool = pool();
        let d = discover(&pool, &DiscoveryState::default().with_page(99), &EngineConfig::default());
        assert_eq!(d.total, 27);
        assert_eq!(d.page, 3);
        assert_eq!(d.items.len(), 7);
    }

    #[test]
    fn hidden_tab_falls_back_to_all() {
        let pool = pool();
        let state = DiscoveryState::default().with_tab(Tab::Topic);
        let d = discover(&pool, &state, &EngineConfig::default());
        assert_eq!(d.tab, Tab::All);
        assert_eq!(d.total, 27);
    }

    #[test]
    fn relevance_scores_are_attached_only_for_relevance() {
        let pool = pool();
        let rel = DiscoveryState::default()
            .with_filters(Filters { sort_by: SortStrategy::Relevance, ..Filters::default() });
        let d = discover(&pool, &rel, &EngineConfig::default());
        assert!(d.items.iter().all(|r| r.score.is_some()));
        let d = discover(&pool, &DiscoveryState::default(), &EngineConfig::default());
        assert!(d.items.iter().all(|r| r.score.is_none()));
    }

    #[test]
    fn content_type_filter_narrows_tabs() {
        let pool = pool();
        let state = DiscoveryState::default()
            .with_filters(Filters { content_type: ContentType::Group, ..Filters::default() });
        let d = discover(&pool, &state, &EngineConfig::default());
        assert_eq!(d.tabs, vec![
            TabCount { tab: Tab::All, count: 1 },
            TabCount { tab: Tab::Group, count: 1 },
        ]);
        assert_eq!(d.debug.matcher.after_type, 1);
    }
}
