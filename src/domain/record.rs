use serde::{Deserialize, Serialize};

use crate::domain::types::RecordId;

/// A customer record as exchanged with the backend.
///
/// `id` is absent until the backend persists the record for the first time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telephone: String,
}

impl Record {
    /// Builds an unsaved record, normalizing whitespace and email casing.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        address: impl Into<String>,
        email: impl Into<String>,
        telephone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into().trim().to_string(),
            address: address.into().trim().to_string(),
            email: email.into().trim().to_lowercase(),
            telephone: telephone.into().trim().to_string(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Returns `true` when the backend has not assigned an identifier yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }
}
