//! Bounded, ellipsis-aware page-number window.
//!
//! Independent of matching and sorting: everything here is a function of page
//! counts only. Pages are 1-based. Callers must clamp the current page into
//! `[1, total_pages]` (see [`clamp_page`]) before asking for a window.

use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub pages: Vec<u32>,
    pub show_leading_ellipsis: bool,
    pub show_trailing_ellipsis: bool,
    pub has_first: bool,
    pub has_last: bool,
}

impl PageWindow {
    /// No pagination UI is needed (a single page or none).
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Previous/next affordances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageNav {
    pub prev: bool,
    pub next: bool,
}

/// `ceil(total_items / page_size)`, never below 1. A zero page size counts as 1.
pub fn total_pages(total_items: usize, page_size: usize) -> u32 {
    let size = page_size.max(1);
    let pages = total_items.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

pub fn clamp_page(page: u32, total_pages: u32) -> u32 {
    page.clamp(1, total_pages.max(1))
}

/// Sliding window of `min(max_visible, total_pages)` pages around `current`.
pub fn compute_window(current: u32, total_pages: u32, max_visible: usize) -> PageWindow {
    if total_pages <= 1 {
        return PageWindow::default();
    }
    let max_visible = u32::try_from(max_visible.max(1)).unwrap_or(u32::MAX);
    let delta = max_visible / 2;
    let mut start = current.saturating_sub(delta).max(1);
    let end = start.saturating_add(max_visible - 1).min(total_pages);
    if end - start + 1 < max_visible {
        start = end.saturating_sub(max_visible - 1).max(1);
    }
    PageWindow {
        pages: (start..=end).collect(),
        show_leading_ellipsis: start > 2,
        show_trailing_ellipsis: end.saturating_add(1) < total_pages,
        has_first: start > 1,
        has_last: end < total_pages,
    }
}

pub fn nav(current: u32, total_pages: u32) -> PageNav {
    if total_pages <= 1 {
        return PageNav::default();
    }
    PageNav { prev: current > 1, next: current < total_pages }
}

/// Page to move to after a click on `target`; `None` when the click is a no-op.
pub fn navigate(current: u32, target: u32, total_pages: u32) -> Option<u32> {
    (target >= 1 && target <= total_pages && target != current).then_some(target)
}

/// Items shown on `page` (1-based) of `items` split into pages of `page_size`.
pub fn page_slice<T>(items: &[T], page: u32, page_size: usize) -> &[T] {
    let size = page_size.max(1);
    let start = (page.max(1) as usize - 1).saturating_mul(size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_page_needs_no_pagination() {
        let w = compute_window(1, 1, 5);
        assert!(w.is_empty());
        assert_eq!(w, PageWindow::default());
        assert_eq!(nav(1, 1), PageNav { prev: false, next: false });
    }

    #[test]
    fn window_centered_in_the_middle() {
        let w = compute_window(5, 20, 5);
        assert_eq!(w.pages, vec![3, 4, 5, 6, 7]);
        assert!(w.has_first && w.show_leading_ellipsis);
        assert!(w.has_last && w.show_trailing_ellipsis);
    }

    #[test]
    fn window_at_the_start() {
        let w = compute_window(1, 10, 5);
        assert_eq!(w.pages, vec![1, 2, 3, 4, 5]);
        assert!(!w.has_first && !w.show_leading_ellipsis);
        assert!(w.has_last && w.show_trailing_ellipsis);
    }

    #[test]
    fn window_shifts_left_at_the_end() {
        let w = compute_window(10, 10, 5);
        assert_eq!(w.pages, vec![6, 7, 8, 9, 10]);
        assert!(w.show_leading_ellipsis);
        assert!(!w.has_last && !w.show_trailing_ellipsis);
    }

    #[test]
    fn adjacent_edges_show_first_and_last_without_ellipsis() {
        // window 2..=6 of 7: page 1 and page 7 are each one step away
        let w = compute_window(4, 7, 5);
        assert_eq!(w.pages, vec![2, 3, 4, 5, 6]);
        assert!(w.has_first && !w.show_leading_ellipsis);
        assert!(w.has_last && !w.show_trailing_ellipsis);
    }

    #[test]
    fn window_never_wider_than_total() {
        let w = compute_window(2, 3, 5);
        assert_eq!(w.pages, vec![1, 2, 3]);
        assert!(!w.has_first && !w.has_last);
    }

    #[test]
    fn even_max_visible_and_zero_max_visible() {
        assert_eq!(compute_window(5, 20, 4).pages, vec![3, 4, 5, 6]);
        assert_eq!(compute_window(5, 20, 0).pages, vec![5]);
    }

    #[test]
    fn total_pages_rounds_up_and_never_drops_below_one() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);
    }

    #[test]
    fn clamp_and_navigate() {
        assert_eq!(clamp_page(0, 4), 1);
        assert_eq!(clamp_page(9, 4), 4);
        assert_eq!(clamp_page(3, 0), 1);
        assert_eq!(navigate(2, 3, 4), Some(3));
        assert_eq!(navigate(2, 2, 4), None);
        assert_eq!(navigate(2, 0, 4), None);
        assert_eq!(navigate(2, 5, 4), None);
        assert_eq!(nav(1, 4), PageNav { prev: false, next: true });
        assert_eq!(nav(4, 4), PageNav { prev: true, next: false });
    }

    #[test]
    fn page_slice_bounds() {
        let xs: Vec<u32> = (1..=23).collect();
        assert_eq!(page_slice(&xs, 1, 10), &xs[0..10]);
        assert_eq!(page_slice(&xs, 3, 10), &xs[20..23]);
        assert!(page_slice(&xs, 4, 10).is_empty());
        assert!(page_slice::<u32>(&[], 1, 10).is_empty());
    }
}
