//! Engine configuration: defaults plus `SIFT_*` environment overrides.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::SiftError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_MAX_VISIBLE_PAGES: usize = 5;
pub const DEFAULT_PLACEHOLDER_SCORE: f32 = 0.5;
pub const DEFAULT_TAG_BOOST: f32 = 0.1;

/// Base score used for items without a recommender similarity score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "mode", content = "value")]
pub enum Placeholder {
    /// Constant base; reproducible.
    Fixed(f32),
    /// Uniform in `[0, 1)` from the thread RNG. Non-deterministic: repeated
    /// discoveries over the same pool may tie-break differently.
    Random,
    /// Uniform in `[0, 1)` from an RNG seeded per discovery; reproducible.
    Seeded(u64),
}

impl Default for Placeholder {
    fn default() -> Self { Placeholder::Fixed(DEFAULT_PLACEHOLDER_SCORE) }
}

impl FromStr for Placeholder {
    type Err = SiftError;

    /// `fixed`, `fixed:<f32>`, `random`, `seeded:<u64>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (mode, arg) = match s.split_once(':') {
            Some((m, a)) => (m, Some(a.trim())),
            None => (s, None),
        };
        match (mode.to_ascii_lowercase().as_str(), arg) {
            ("fixed", None) => Ok(Placeholder::default()),
            ("fixed", Some(v)) => v
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Placeholder::Fixed)
                .ok_or_else(|| SiftError::Validation(format!("invalid fixed placeholder value: {v}"))),
            ("random", None) => Ok(Placeholder::Random),
            ("seeded", Some(v)) => v
                .parse::<u64>()
                .map(Placeholder::Seeded)
                .map_err(|_| SiftError::Validation(format!("invalid placeholder seed: {v}"))),
            _ => Err(SiftError::Validation(format!("unknown placeholder mode: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub page_size: usize,
    pub max_visible_pages: usize,
    pub placeholder: Placeholder,
    /// Added once per item tag that matches an interest.
    pub boost_per_tag: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_visible_pages: DEFAULT_MAX_VISIBLE_PAGES,
            placeholder: Placeholder::default(),
            boost_per_tag: DEFAULT_TAG_BOOST,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `SIFT_PAGE_SIZE`, `SIFT_MAX_VISIBLE_PAGES`,
    /// `SIFT_SCORE_PLACEHOLDER` and `SIFT_TAG_BOOST`. Invalid values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EngineConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(v) = lookup("SIFT_PAGE_SIZE") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.page_size = n,
                _ => warn!(value = %v, "invalid SIFT_PAGE_SIZE; expected a positive integer"),
            }
        }
        if let Some(v) = lookup("SIFT_MAX_VISIBLE_PAGES") {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.max_visible_pages = n,
                _ => warn!(value = %v, "invalid SIFT_MAX_VISIBLE_PAGES; expected a positive integer"),
            }
        }
        if let Some(v) = lookup("SIFT_SCORE_PLACEHOLDER") {
            match v.parse::<Placeholder>() {
                Ok(p) => cfg.placeholder = p,
                Err(e) => warn!(error = %e, "invalid SIFT_SCORE_PLACEHOLDER"),
            }
        }
        if let Some(v) = lookup("SIFT_TAG_BOOST") {
            match v.trim().parse::<f32>() {
                Ok(b) if b.is_finite() => cfg.boost_per_tag = b,
                _ => warn!(value = %v, "invalid SIFT_TAG_BOOST; expected a number"),
            }
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn placeholder_modes_parse() {
        assert_eq!("fixed".parse::<Placeholder>().unwrap(), Placeholder::Fixed(0.5));
        assert_eq!("fixed:0.25".parse::<Placeholder>().unwrap(), Placeholder::Fixed(0.25));
        assert_eq!("Random".parse::<Placeholder>().unwrap(), Placeholder::Random);
        assert_eq!("seeded:42".parse::<Placeholder>().unwrap(), Placeholder::Seeded(42));
        assert!("seeded".parse::<Placeholder>().is_err());
        assert!("fixed:NaN".parse::<Placeholder>().is_err());
        assert!("loud".parse::<Placeholder>().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            ("SIFT_PAGE_SIZE", "25"),
            ("SIFT_MAX_VISIBLE_PAGES", "7"),
            ("SIFT_SCORE_PLACEHOLDER", "seeded:9"),
            ("SIFT_TAG_BOOST", "0.2"),
        ]));
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.max_visible_pages, 7);
        assert_eq!(cfg.placeholder, Placeholder::Seeded(9));
        assert_eq!(cfg.boost_per_tag, 0.2);
    }

    #[test]
    fn invalid_env_values_keep_defaults() {
        let cfg = EngineConfig::from_lookup(lookup(&[
            ("SIFT_PAGE_SIZE", "0"),
            ("SIFT_MAX_VISIBLE_PAGES", "many"),
            ("SIFT_SCORE_PLACEHOLDER", "dice"),
        ]));
        assert_eq!(cfg, EngineConfig::default());
    }
}
