//! Page link strip rendered under the record table.

use crate::domain::page::PageSnapshot;

/// 1-based page numbers to display around `current_page`, with `None`
/// marking a gap.
fn visible_pages(
    total_pages: usize,
    current_page: usize,
    left_edge: usize,
    left_current: usize,
    right_current: usize,
    right_edge: usize,
) -> Vec<Option<usize>> {
    let last_page = total_pages;

    if last_page == 0 {
        return vec![];
    }

    let mut pages = Vec::new();

    let left_end = (1 + left_edge).min(last_page + 1);
    pages.extend((1..left_end).map(Some));

    let mid_start = left_end.max(current_page.saturating_sub(left_current));
    let mid_end = (current_page + right_current + 1).min(last_page + 1);

    if mid_start > left_end {
        pages.push(None);
    }
    pages.extend((mid_start..mid_end).map(Some));

    let right_start = mid_end.max(last_page.saturating_sub(right_edge) + 1);

    if right_start > mid_end {
        pages.push(None);
    }
    pages.extend((right_start..=last_page).map(Some));

    pages
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLinks {
    pub pages: Vec<Option<usize>>,
    /// Current page, 1-based.
    pub current: usize,
    pub has_prev: bool,
    pub has_next: bool,
}

impl PageLinks {
    pub fn for_snapshot(page: &PageSnapshot) -> Self {
        let current = page.number + 1;
        Self {
            pages: visible_pages(page.total_pages, current, 2, 2, 2, 2),
            current,
            has_prev: page.has_prev(),
            has_next: page.has_next(),
        }
    }

    /// Renders e.g. `< 1 2 [3] 4 5 ... 9 10 >`. Arrows are dropped when the
    /// corresponding direction is disabled.
    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.pages.len() + 2);
        if self.has_prev {
            parts.push("<".to_string());
        }
        for page in &self.pages {
            parts.push(match page {
                Some(p) if *p == self.current => format!("[{p}]"),
                Some(p) => p.to_string(),
                None => "...".to_string(),
            });
        }
        if self.has_next {
            parts.push(">".to_string());
        }
        parts.join(" ")
    }
}
