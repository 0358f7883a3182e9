use serde::{Deserialize, Serialize};

use crate::domain::record::Record;

/// One page of records plus pagination metadata, as returned by the list
/// endpoint. Replaced wholesale on every successful fetch.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    #[serde(default)]
    pub content: Vec<Record>,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub total_elements: u64,
    /// Current page index, 0-based.
    #[serde(default)]
    pub number: usize,
}

impl PageSnapshot {
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether `index` addresses a page that exists in this snapshot.
    pub fn contains_page(&self, index: usize) -> bool {
        index < self.total_pages
    }

    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.number > 0
    }
}
