//! Relevance score: an intrinsic base signal plus a personalization boost.
//!
//! The score is a ranking key, not a probability. It is unbounded above and only
//! comparable within one discovery.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sift_core::config::{DEFAULT_PLACEHOLDER_SCORE, DEFAULT_TAG_BOOST};
use sift_core::{EngineConfig, Item, Placeholder};

enum Base {
    Fixed(f32),
    Draw(StdRng),
}

pub struct Scorer {
    interests: Vec<String>,
    boost_per_tag: f32,
    base: Base,
}

impl Scorer {
    pub fn new(interests: &[String], placeholder: Placeholder, boost_per_tag: f32) -> Self {
        let base = match placeholder {
            Placeholder::Fixed(v) => Base::Fixed(v),
            Placeholder::Random => Base::Draw(StdRng::from_rng(&mut rand::rng())),
            Placeholder::Seeded(seed) => Base::Draw(StdRng::seed_from_u64(seed)),
        };
        Self {
            interests: interests
                .iter()
                .map(|i| i.trim().to_lowercase())
                .filter(|i| !i.is_empty())
                .collect(),
            boost_per_tag,
            base,
        }
    }

    pub fn from_config(interests: &[String], config: &EngineConfig) -> Self {
        Self::new(interests, config.placeholder, config.boost_per_tag)
    }

    /// Number of item tags containing at least one interest, case-insensitively.
    pub fn matching_tags(&self, item: &Item) -> usize {
        if self.interests.is_empty() {
            return 0;
        }
        item.tags()
            .iter()
            .filter(|tag| {
                let tag = tag.to_lowercase();
                self.interests.iter().any(|i| tag.contains(i.as_str()))
            })
            .count()
    }

    pub fn score(&mut self, item: &Item) -> f32 {
        let base = match (item.header.similarity_score, &mut self.base) {
            (Some(s), _) => s,
            (None, Base::Fixed(v)) => *v,
            (None, Base::Draw(rng)) => rng.random::<f32>(),
        };
        base + self.boost_per_tag * self.matching_tags(item) as f32
    }
}

/// Score with the deterministic defaults: base 0.5 when no similarity is present, +0.1 per matching tag.
pub fn score(item: &Item, interests: &[String]) -> f32 {
    Scorer::new(interests, Placeholder::Fixed(DEFAULT_PLACEHOLDER_SCORE), DEFAULT_TAG_BOOST).score(item)
}
