//! Query, filter and caller-held discovery state.
//!
//! The caller owns exactly one [`DiscoveryState`] and replaces it on every
//! interaction; the pipeline is re-run as a pure function of the new value.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ItemKind, SiftError};

/// Restricts results to one kind, or admits all of them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    All,
    Post,
    User,
    Topic,
    Group,
}

impl ContentType {
    pub fn kind(self) -> Option<ItemKind> {
        match self {
            ContentType::All => None,
            ContentType::Post => Some(ItemKind::Post),
            ContentType::User => Some(ItemKind::User),
            ContentType::Topic => Some(ItemKind::Topic),
            ContentType::Group => Some(ItemKind::Group),
        }
    }

    pub fn admits(self, kind: ItemKind) -> bool {
        self.kind().map_or(true, |k| k == kind)
    }
}

impl From<ItemKind> for ContentType {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Post => ContentType::Post,
            ItemKind::User => ContentType::User,
            ItemKind::Topic => ContentType::Topic,
            ItemKind::Group => ContentType::Group,
        }
    }
}

fn parse_kind_word(s: &str) -> Option<Option<ItemKind>> {
    match s.trim().to_ascii_lowercase().as_str() {
        "all" | "" => Some(None),
        "post" | "posts" => Some(Some(ItemKind::Post)),
        "user" | "users" | "people" => Some(Some(ItemKind::User)),
        "topic" | "topics" => Some(Some(ItemKind::Topic)),
        "group" | "groups" => Some(Some(ItemKind::Group)),
        _ => None,
    }
}

impl FromStr for ContentType {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_kind_word(s) {
            Some(None) => Ok(ContentType::All),
            Some(Some(kind)) => Ok(kind.into()),
            None => Err(SiftError::Validation(format!("unknown content type: {s}"))),
        }
    }
}

/// Ordering applied to the admitted set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum SortStrategy {
    /// Score descending; the only strategy that invokes the scorer.
    Relevance,
    /// Most relevant timestamp, newest first.
    Date,
    /// Like, follower or member count, highest first.
    Popularity,
    /// Title ascending, case-sensitive.
    Alphabetical,
    /// Leave the pool order untouched. Unknown strategy names land here.
    #[default]
    Pool,
}

impl From<String> for SortStrategy {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(strategy) => strategy,
            Err(never) => match never {},
        }
    }
}

impl FromStr for SortStrategy {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "relevance" | "personalized" => SortStrategy::Relevance,
            "date" | "recent" | "recency" => SortStrategy::Date,
            "popularity" | "popular" => SortStrategy::Popularity,
            "alphabetical" | "alpha" | "name" => SortStrategy::Alphabetical,
            _ => SortStrategy::Pool,
        })
    }
}

/// Structured filters. The default value imposes no constraint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    pub content_type: ContentType,
    /// Case-insensitive substring of a post author's username. Ignored for other kinds.
    pub author: Option<String>,
    /// Any-of: an item passes when one of its tags contains one of these.
    pub tags: Vec<String>,
    pub verified: bool,
    pub sort_by: SortStrategy,
}

impl Filters {
    pub fn is_unconstrained(&self) -> bool {
        self.content_type == ContentType::All
            && self.author.as_deref().map_or(true, |a| a.trim().is_empty())
            && self.tags.is_empty()
            && !self.verified
    }
}

/// Result tab: the synthetic `all` bucket or one per kind.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    Post,
    User,
    Topic,
    Group,
}

impl Tab {
    pub const ORDER: [Tab; 5] = [Tab::All, Tab::Post, Tab::User, Tab::Topic, Tab::Group];

    pub fn kind(self) -> Option<ItemKind> {
        ContentType::from(self).kind()
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Post => "posts",
            Tab::User => "users",
            Tab::Topic => "topics",
            Tab::Group => "groups",
        }
    }
}

impl From<Tab> for ContentType {
    fn from(tab: Tab) -> Self {
        match tab {
            Tab::All => ContentType::All,
            Tab::Post => ContentType::Post,
            Tab::User => ContentType::User,
            Tab::Topic => ContentType::Topic,
            Tab::Group => ContentType::Group,
        }
    }
}

impl From<ItemKind> for Tab {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Post => Tab::Post,
            ItemKind::User => Tab::User,
            ItemKind::Topic => Tab::Topic,
            ItemKind::Group => Tab::Group,
        }
    }
}

impl FromStr for Tab {
    type Err = SiftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_kind_word(s) {
            Some(None) => Ok(Tab::All),
            Some(Some(kind)) => Ok(kind.into()),
            None => Err(SiftError::Validation(format!("unknown tab: {s}"))),
        }
    }
}

/// Everything the caller tracks between discovery runs, as one immutable value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscoveryState {
    pub query: String,
    pub filters: Filters,
    /// Personalization tags used by relevance scoring.
    pub interests: Vec<String>,
    /// 1-based; clamped by the pipeline.
    pub page: u32,
    pub page_size: usize,
    pub max_visible_pages: usize,
    pub tab: Tab,
}

impl Default for DiscoveryState {
    fn default() -> Self {
        Self {
            query: String::new(),
            filters: Filters::default(),
            interests: Vec::new(),
            page: 1,
            page_size: crate::config::DEFAULT_PAGE_SIZE,
            max_visible_pages: crate::config::DEFAULT_MAX_VISIBLE_PAGES,
            tab: Tab::All,
        }
    }
}

impl DiscoveryState {
    pub fn new(config: &crate::EngineConfig) -> Self {
        Self { page_size: config.page_size, max_visible_pages: config.max_visible_pages, ..Self::default() }
    }

    /// New query; results change, so paging restarts.
    pub fn with_query(&self, query: impl Into<String>) -> Self {
        Self { query: query.into(), page: 1, ..self.clone() }
    }

    pub fn with_filters(&self, filters: Filters) -> Self {
        Self { filters, page: 1, ..self.clone() }
    }

    pub fn with_tab(&self, tab: Tab) -> Self {
        Self { tab, page: 1, ..self.clone() }
    }

    pub fn with_page(&self, page: u32) -> Self {
        Self { page, ..self.clone() }
    }

    pub fn with_interests<I, S>(&self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { interests: interests.into_iter().map(Into::into).collect(), ..self.clone() }
    }
}
