//! Sift core types: the content item model, pool snapshots and deltas.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

pub mod config;
pub mod state;

pub use config::{EngineConfig, Placeholder};
pub use state::{ContentType, DiscoveryState, Filters, SortStrategy, Tab};

pub type ItemId = String;

/// Tags are short and few; most items carry four or fewer.
pub type Tags = SmallVec<[String; 4]>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Post,
    User,
    Topic,
    Group,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [ItemKind::Post, ItemKind::User, ItemKind::Topic, ItemKind::Group];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemKind::Post => "post",
            ItemKind::User => "user",
            ItemKind::Topic => "topic",
            ItemKind::Group => "group",
        }
    }

    /// Position in [`ItemKind::ALL`]; used for fixed-size per-kind tables.
    pub fn ordinal(self) -> usize {
        match self {
            ItemKind::Post => 0,
            ItemKind::User => 1,
            ItemKind::Topic => 2,
            ItemKind::Group => 3,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an item across the whole pool: ids are only unique within a kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: ItemId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Author {
    pub username: String,
    #[serde(default)]
    pub verified: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    #[default]
    Public,
    Private,
}

/// Fields every item carries regardless of kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ItemHeader {
    pub id: ItemId,
    /// Post title, or the display name of a user, topic or group.
    #[serde(alias = "name")]
    pub title: String,
    /// Post body, user bio, or topic/group description.
    #[serde(default, alias = "bio", alias = "description")]
    pub body: String,
    #[serde(default)]
    pub tags: Tags,
    /// Precomputed by an external recommender, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_score: Option<f32>,
    /// Advisory only; never used for ranking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ItemPayload {
    #[serde(rename_all = "camelCase")]
    Post {
        author: Author,
        #[serde(default, with = "ts")]
        published_at: i64,
        #[serde(default)]
        like_count: u64,
        #[serde(default)]
        bookmark_count: u64,
        /// Minutes.
        #[serde(default)]
        read_time: u32,
    },
    #[serde(rename_all = "camelCase")]
    User {
        username: String,
        #[serde(default)]
        follower_count: u64,
        #[serde(default)]
        verified: bool,
        #[serde(default, with = "ts::opt", skip_serializing_if = "Option::is_none")]
        joined_at: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    Topic {
        #[serde(default)]
        post_count: u64,
        #[serde(default)]
        follower_count: u64,
        #[serde(default, with = "ts::opt", skip_serializing_if = "Option::is_none")]
        created_at: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    Group {
        #[serde(default)]
        member_count: u64,
        #[serde(default)]
        privacy: Privacy,
        #[serde(default, with = "ts::opt", skip_serializing_if = "Option::is_none")]
        created_at: Option<i64>,
    },
}

impl ItemPayload {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemPayload::Post { .. } => ItemKind::Post,
            ItemPayload::User { .. } => ItemKind::User,
            ItemPayload::Topic { .. } => ItemKind::Topic,
            ItemPayload::Group { .. } => ItemKind::Group,
        }
    }
}

/// One discoverable content unit: a shared header plus a kind-specific payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(flatten)]
    pub header: ItemHeader,
    #[serde(flatten)]
    pub payload: ItemPayload,
}

impl Item {
    pub fn new(id: impl Into<ItemId>, title: impl Into<String>, payload: ItemPayload) -> Self {
        Self {
            header: ItemHeader { id: id.into(), title: title.into(), ..ItemHeader::default() },
            payload,
        }
    }

    pub fn post(id: impl Into<ItemId>, title: impl Into<String>, author: &str, published_at: i64, like_count: u64) -> Self {
        Self::new(id, title, ItemPayload::Post {
            author: Author { username: author.to_string(), verified: false },
            published_at,
            like_count,
            bookmark_count: 0,
            read_time: 0,
        })
    }

    pub fn user(id: impl Into<ItemId>, name: impl Into<String>, username: &str, follower_count: u64, verified: bool) -> Self {
        Self::new(id, name, ItemPayload::User { username: username.to_string(), follower_count, verified, joined_at: None })
    }

    pub fn topic(id: impl Into<ItemId>, name: impl Into<String>, post_count: u64, follower_count: u64) -> Self {
        Self::new(id, name, ItemPayload::Topic { post_count, follower_count, created_at: None })
    }

    pub fn group(id: impl Into<ItemId>, name: impl Into<String>, member_count: u64, privacy: Privacy) -> Self {
        Self::new(id, name, ItemPayload::Group { member_count, privacy, created_at: None })
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.header.body = body.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_similarity(mut self, score: f32) -> Self {
        self.header.similarity_score = Some(score);
        self
    }

    pub fn id(&self) -> &str { &self.header.id }
    pub fn title(&self) -> &str { &self.header.title }
    pub fn tags(&self) -> &[String] { &self.header.tags }
    pub fn kind(&self) -> ItemKind { self.payload.kind() }

    pub fn key(&self) -> ItemKey {
        ItemKey { kind: self.kind(), id: self.header.id.clone() }
    }

    /// Free-text fields the query is matched against.
    pub fn text_fields(&self) -> SmallVec<[&str; 3]> {
        let mut out: SmallVec<[&str; 3]> = SmallVec::new();
        out.push(&self.header.title);
        if !self.header.body.is_empty() {
            out.push(&self.header.body);
        }
        if let ItemPayload::User { username, .. } = &self.payload {
            out.push(username);
        }
        out
    }

    pub fn author(&self) -> Option<&Author> {
        match &self.payload {
            ItemPayload::Post { author, .. } => Some(author),
            _ => None,
        }
    }

    /// Verified user, or a post by a verified author. Topics and groups never are.
    pub fn is_verified(&self) -> bool {
        match &self.payload {
            ItemPayload::Post { author, .. } => author.verified,
            ItemPayload::User { verified, .. } => *verified,
            ItemPayload::Topic { .. } | ItemPayload::Group { .. } => false,
        }
    }

    /// Most relevant timestamp in unix seconds; 0 when the kind has none recorded.
    pub fn timestamp(&self) -> i64 {
        match &self.payload {
            ItemPayload::Post { published_at, .. } => *published_at,
            ItemPayload::User { joined_at, .. } => joined_at.unwrap_or(0),
            ItemPayload::Topic { created_at, .. } | ItemPayload::Group { created_at, .. } => created_at.unwrap_or(0),
        }
    }

    /// First present of like count, follower count, member count.
    pub fn popularity(&self) -> u64 {
        match &self.payload {
            ItemPayload::Post { like_count, .. } => *like_count,
            ItemPayload::User { follower_count, .. } | ItemPayload::Topic { follower_count, .. } => *follower_count,
            ItemPayload::Group { member_count, .. } => *member_count,
        }
    }
}

/// One immutable view of the item pool, the unit every discovery runs over.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PoolSnapshot {
    pub epoch: u64,
    pub items: Vec<Item>,
}

impl PoolSnapshot {
    /// Decode a pool document: either a bare array of items or `{ "items": [...] }`.
    /// Items keep document order, which is the order `pool` sorting preserves.
    pub fn from_document(doc: serde_json::Value, epoch: u64) -> SiftResult<Self> {
        let list = match doc {
            serde_json::Value::Array(_) => doc,
            serde_json::Value::Object(mut map) => map
                .remove("items")
                .ok_or_else(|| SiftError::Parse("pool object has no `items` field".into()))?,
            other => return Err(SiftError::Parse(format!("pool must be an array or object, got {other}"))),
        };
        let items: Vec<Item> = serde_json::from_value(list).map_err(|e| SiftError::Parse(e.to_string()))?;
        Ok(Self { epoch, items })
    }
}

/// Change to the pool, keyed by [`ItemKey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "lowercase")]
pub enum Delta {
    Upsert(Item),
    Remove(ItemKey),
}

impl Delta {
    pub fn key(&self) -> ItemKey {
        match self {
            Delta::Upsert(item) => item.key(),
            Delta::Remove(key) => key.clone(),
        }
    }
}

/// Engine errors. Only configuration and decoding are fallible; discovery itself is total.
#[derive(Debug, thiserror::Error)]
pub enum SiftError {
    #[error("validation: {0}")]
    Validation(String),
    #[error("parse: {0}")]
    Parse(String),
}

pub type SiftResult<T> = Result<T, SiftError>;

pub mod prelude {
    pub use super::{
        Author, ContentType, Delta, DiscoveryState, EngineConfig, Filters, Item, ItemHeader, ItemId, ItemKey,
        ItemKind, ItemPayload, Placeholder, PoolSnapshot, Privacy, SiftError, SiftResult, SortStrategy, Tab, Tags,
    };
}

/// Timestamps as unix seconds, accepting either an integer or an RFC 3339 string on input.
pub mod ts {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(i64),
        Text(String),
    }

    pub fn parse(s: &str) -> Option<i64> {
        chrono::DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp())
    }

    fn resolve<E: de::Error>(raw: Raw) -> Result<i64, E> {
        match raw {
            Raw::Secs(v) => Ok(v),
            Raw::Text(s) => parse(&s).ok_or_else(|| E::custom(format!("invalid RFC 3339 timestamp: {s}"))),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
        resolve(Raw::deserialize(d)?)
    }

    pub fn serialize<S: Serializer>(v: &i64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(*v)
    }

    pub mod opt {
        use super::{resolve, Raw};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
            Option::<Raw>::deserialize(d)?.map(resolve).transpose()
        }

        pub fn serialize<S: Serializer>(v: &Option<i64>, s: S) -> Result<S::Ok, S::Error> {
            match v {
                Some(secs) => s.serialize_some(secs),
                None => s.serialize_none(),
            }
        }
    }
}
