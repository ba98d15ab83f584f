//! Total ordering of the admitted set.
//!
//! Every strategy uses a stable sort: items with equal keys keep the order they
//! had in the pool, which is the only tie-break.

use std::cmp::Ordering;

use serde::Serialize;
use sift_core::{Item, SortStrategy};

use crate::scorer::Scorer;

/// An item in result order. `score` is only set for relevance ordering and is
/// meaningless outside the discovery that produced it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Ranked<'a> {
    pub item: &'a Item,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
}

impl<'a> Ranked<'a> {
    pub fn unscored(item: &'a Item) -> Self {
        Self { item, score: None }
    }
}

/// Ordering of two ranked items under `strategy`. `Equal` means "keep input order".
pub fn compare(a: &Ranked<'_>, b: &Ranked<'_>, strategy: SortStrategy) -> Ordering {
    match strategy {
        SortStrategy::Relevance => {
            let sa = a.score.unwrap_or(0.0);
            let sb = b.score.unwrap_or(0.0);
            sb.total_cmp(&sa)
        }
        SortStrategy::Date => b.item.timestamp().cmp(&a.item.timestamp()),
        SortStrategy::Popularity => b.item.popularity().cmp(&a.item.popularity()),
        SortStrategy::Alphabetical => a.item.title().cmp(b.item.title()),
        SortStrategy::Pool => Ordering::Equal,
    }
}

/// Order `items` by `strategy`. The scorer is only consulted for relevance.
pub fn sort<'a>(items: Vec<&'a Item>, strategy: SortStrategy, scorer: &mut Scorer) -> Vec<Ranked<'a>> {
    let mut ranked: Vec<Ranked<'a>> = match strategy {
        SortStrategy::Relevance => items
            .into_iter()
            .map(|item| Ranked { item, score: Some(scorer.score(item)) })
            .collect(),
        _ => items.into_iter().map(Ranked::unscored).collect(),
    };
    if strategy != SortStrategy::Pool {
        // slice::sort_by is stable
        ranked.sort_by(|a, b| compare(a, b, strategy));
    }
    ranked
}
