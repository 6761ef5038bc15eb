use crate::models::Member;
use serde::{Deserialize, Serialize};

pub const PAGE_SIZE: usize = 8;

/// One page of the filtered member list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageView {
    pub items: Vec<Member>,
    pub total_pages: usize,
    pub current_page: usize,
    pub total_matches: usize,
}

/// Case-insensitive substring match on full name, national ID or email.
/// A blank term matches everything.
pub fn filter<'a>(members: &'a [Member], term: &str) -> Vec<&'a Member> {
    let needle = term.trim().to_lowercase();
    members
        .iter()
        .filter(|member| needle.is_empty() || member.matches(&needle))
        .collect()
}

pub fn page_count(matches: usize) -> usize {
    matches.div_ceil(PAGE_SIZE).max(1)
}

pub fn total_pages(members: &[Member], term: &str) -> usize {
    page_count(filter(members, term).len())
}

/// Derives a page from the member list. Pure: same inputs, same output.
///
/// `page` is not clamped here; callers clamp it to `1..=total_pages` first.
/// Out-of-range pages (including 0) produce an empty item list.
pub fn view(members: &[Member], term: &str, page: usize) -> PageView {
    let matches = filter(members, term);
    let total_matches = matches.len();
    let items = match page.checked_sub(1) {
        Some(index) => matches
            .into_iter()
            .skip(index.saturating_mul(PAGE_SIZE))
            .take(PAGE_SIZE)
            .cloned()
            .collect(),
        None => Vec::new(),
    };

    PageView {
        items,
        total_pages: page_count(total_matches),
        current_page: page,
        total_matches,
    }
}

/// Search term and page currently shown. Changing the term goes back to page 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    #[serde(default)]
    pub term: String,
    #[serde(default = "first_page")]
    pub page: usize,
}

fn first_page() -> usize {
    1
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            term: String::new(),
            page: first_page(),
        }
    }
}

impl QueryState {
    pub fn set_term(&mut self, term: impl Into<String>) {
        let term = term.into();
        if term != self.term {
            self.term = term;
            self.page = first_page();
        }
    }

    pub fn set_page(&mut self, page: usize, total_pages: usize) {
        self.page = page.clamp(1, total_pages.max(1));
    }

    /// Clamps the current page against the given members, then renders it.
    pub fn apply(&mut self, members: &[Member]) -> PageView {
        let total = total_pages(members, &self.term);
        self.set_page(self.page, total);
        view(members, &self.term, self.page)
    }
}
