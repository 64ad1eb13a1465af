use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A past generation as stored in the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub image: String,
    pub prompt: String,
    pub timestamp: DateTime<Utc>,
}

impl GeneratedImage {
    pub fn new(image: impl Into<String>, prompt: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            image: image.into(),
            prompt: prompt.into(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Firestore `Direction` enum value.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASCENDING",
            SortDirection::Descending => "DESCENDING",
        }
    }
}

/// Ordering requested from a feed. History views use [`FeedOrder::newest_first`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedOrder {
    pub field: String,
    pub direction: SortDirection,
}

impl FeedOrder {
    pub fn newest_first() -> Self {
        Self {
            field: "timestamp".to_string(),
            direction: SortDirection::Descending,
        }
    }

    pub fn oldest_first() -> Self {
        Self {
            field: "timestamp".to_string(),
            direction: SortDirection::Ascending,
        }
    }
}

impl Default for FeedOrder {
    fn default() -> Self {
        Self::newest_first()
    }
}
