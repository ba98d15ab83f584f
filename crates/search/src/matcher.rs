//! Admit/reject decision per item from a free-text query and structured filters.

use serde::Serialize;
use sift_core::{ContentType, Filters, Item};

/// Per-predicate survivor counts from one [`admit`] pass, in evaluation order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchDebugInfo {
    pub total: usize,
    pub after_type: usize,
    pub after_text: usize,
    pub after_author: usize,
    pub after_tags: usize,
    pub after_verified: usize,
}

/// Query and filters with their strings lowercased once, reusable across a whole pool.
#[derive(Debug, Clone)]
pub struct Matcher {
    query: Option<String>,
    content_type: ContentType,
    author: Option<String>,
    tags: Vec<String>,
    verified: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Type,
    Text,
    Author,
    Tags,
    Verified,
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

impl Matcher {
    pub fn new(query: &str, filters: &Filters) -> Self {
        let query = query.trim();
        let author = filters.author.as_deref().map(str::trim).filter(|a| !a.is_empty());
        Self {
            query: (!query.is_empty()).then(|| query.to_lowercase()),
            content_type: filters.content_type,
            author: author.map(str::to_lowercase),
            tags: filters
                .tags
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
            verified: filters.verified,
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        self.first_rejection(item).is_none()
    }

    /// Predicates run cheapest first and stop at the first failure.
    fn first_rejection(&self, item: &Item) -> Option<Stage> {
        if !self.content_type.admits(item.kind()) {
            return Some(Stage::Type);
        }
        if let Some(q) = &self.query {
            if !item.text_fields().iter().any(|f| contains_ci(f, q)) {
                return Some(Stage::Text);
            }
        }
        if let (Some(want), Some(author)) = (&self.author, item.author()) {
            if !contains_ci(&author.username, want) {
                return Some(Stage::Author);
            }
        }
        if !self.tags.is_empty() {
            let hit = item
                .tags()
                .iter()
                .any(|t| {
                    let t = t.to_lowercase();
                    self.tags.iter().any(|f| t.contains(f.as_str()))
                });
            if !hit {
                return Some(Stage::Tags);
            }
        }
        if self.verified && !item.is_verified() {
            return Some(Stage::Verified);
        }
        None
    }
}

/// One-shot form of [`Matcher::matches`].
pub fn matches(item: &Item, query: &str, filters: &Filters) -> bool {
    Matcher::new(query, filters).matches(item)
}

/// Admitted subset of `pool`, in pool order, with stage counts.
pub fn admit<'a>(pool: &'a [Item], query: &str, filters: &Filters) -> (Vec<&'a Item>, MatchDebugInfo) {
    if query.trim().is_empty() && filters.is_unconstrained() {
        let n = pool.len();
        let dbg = MatchDebugInfo { total: n, after_type: n, after_text: n, after_author: n, after_tags: n, after_verified: n };
        return (pool.iter().collect(), dbg);
    }
    let matcher = Matcher::new(query, filters);
    let mut dbg = MatchDebugInfo { total: pool.len(), ..MatchDebugInfo::default() };
    let mut out = Vec::with_capacity(pool.len());
    for item in pool {
        let rejected = matcher.first_rejection(item);
        // An item rejected at stage N survived every stage before it.
        let passed = |stage: Stage| rejected.map_or(true, |r| stage_rank(r) > stage_rank(stage));
        dbg.after_type += passed(Stage::Type) as usize;
        dbg.after_text += passed(Stage::Text) as usize;
        dbg.after_author += passed(Stage::Author) as usize;
        dbg.after_tags += passed(Stage::Tags) as usize;
        dbg.after_verified += passed(Stage::Verified) as usize;
        if rejected.is_none() {
            out.push(item);
        }
    }
    (out, dbg)
}

fn stage_rank(stage: Stage) -> u8 {
    match stage {
        Stage::Type => 0,
        Stage::Text => 1,
        Stage::Author => 2,
        Stage::Tags => 3,
        Stage::Verified => 4,
    }
}
