//! Kind buckets for tabbed browsing. Grouping never re-orders.

use serde::Serialize;
use sift_core::{ItemKind, Tab};

use crate::sorter::Ranked;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabCount {
    pub tab: Tab,
    pub count: usize,
}

/// `all` plus one bucket per kind, each in the order of the input.
#[derive(Debug, Clone, Default)]
pub struct Groups<'a> {
    all: Vec<Ranked<'a>>,
    by_kind: [Vec<Ranked<'a>>; 4],
}

impl<'a> Groups<'a> {
    pub fn all(&self) -> &[Ranked<'a>] {
        &self.all
    }

    pub fn kind(&self, kind: ItemKind) -> &[Ranked<'a>] {
        &self.by_kind[kind.ordinal()]
    }

    pub fn bucket(&self, tab: Tab) -> &[Ranked<'a>] {
        match tab.kind() {
            Some(kind) => self.kind(kind),
            None => self.all(),
        }
    }

    pub fn count(&self, tab: Tab) -> usize {
        self.bucket(tab).len()
    }

    /// A tab is visible when it is `all` or its bucket is non-empty.
    pub fn is_visible(&self, tab: Tab) -> bool {
        tab == Tab::All || self.count(tab) > 0
    }

    /// Visible tabs with counts, in fixed order: all, posts, users, topics, groups.
    pub fn tabs(&self) -> Vec<TabCount> {
        Tab::ORDER
            .iter()
            .copied()
            .filter(|t| self.is_visible(*t))
            .map(|tab| TabCount { tab, count: self.count(tab) })
            .collect()
    }
}

pub fn group<'a>(items: Vec<Ranked<'a>>) -> Groups<'a> {
    let mut by_kind: [Vec<Ranked<'a>>; 4] = Default::default();
    for r in &items {
        by_kind[r.item.kind().ordinal()].push(*r);
    }
    Groups { all: items, by_kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::{Item, Privacy};

    #[test]
    fn buckets_preserve_order_and_hide_empty_tabs() {
        let pool = vec![
            Item::user("u1", "u1", "u1", 0, false),
            Item::post("p1", "p1", "a", 0, 0),
            Item::user("u2", "u2", "u2", 0, false),
            Item::post("p2", "p2", "a", 0, 0),
        ];
        let g = group(pool.iter().map(Ranked::unscored).collect());
        let ids = |rs: &[Ranked<'_>]| rs.iter().map(|r| r.item.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(g.all()), ["u1", "p1", "u2", "p2"]);
        assert_eq!(ids(g.bucket(Tab::Post)), ["p1", "p2"]);
        assert_eq!(ids(g.bucket(Tab::User)), ["u1", "u2"]);
        assert!(g.bucket(Tab::Group).is_empty());
        assert_eq!(g.tabs(), vec![
            TabCount { tab: Tab::All, count: 4 },
            TabCount { tab: Tab::Post, count: 2 },
            TabCount { tab: Tab::User, count: 2 },
        ]);
        assert!(!g.is_visible(Tab::Topic));
    }

    #[test]
    fn empty_input_keeps_the_all_tab() {
        let g = group(Vec::new());
        assert_eq!(g.tabs(), vec![TabCount { tab: Tab::All, count: 0 }]);
    }

    #[test]
    fn every_item_lands_in_exactly_one_kind_bucket() {
        let pool = vec![
            Item::group("g", "g", 1, Privacy::Private),
            Item::topic("t", "t", 1, 1),
            Item::post("p", "p", "a", 0, 0),
            Item::user("u", "u", "u", 0, true),
        ];
        let g = group(pool.iter().map(Ranked::unscored).collect());
        let total: usize = ItemKind::ALL.iter().map(|k| g.kind(*k).len()).sum();
        assert_eq!(total, g.all().len());
    }
}
