use crate::domain::types::PageSize;

/// The page the user wants to look at.
///
/// Any change to a field invalidates the current snapshot and must be
/// followed by exactly one re-fetch.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct QueryIntent {
    pub page_index: usize,
    pub page_size: PageSize,
    pub search_term: String,
}

impl QueryIntent {
    pub fn new(page_size: PageSize) -> Self {
        Self {
            page_index: 0,
            page_size,
            search_term: String::new(),
        }
    }

    pub fn page(mut self, page_index: usize) -> Self {
        self.page_index = page_index;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search_term = term.into();
        self
    }

    /// The search term to send, or `None` when it is blank.
    pub fn search_filter(&self) -> Option<&str> {
        let term = self.search_term.trim();
        if term.is_empty() { None } else { Some(term) }
    }
}
