//! Learning path data structures
//!
//! Field names serialize in camelCase so persisted `paths` and `progress`
//! records stay compatible with the dashboard's browser storage layout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::duration;
use crate::error::{Error, Result};

/// A piece of watchable content fetched from the video search API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    /// Unique video id
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Duration in whole seconds
    #[serde(default)]
    pub duration_seconds: u64,

    /// Topics detected by the classifier (empty until classified)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
}

impl ContentItem {
    /// Create a new content item without topics
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        duration_seconds: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            duration_seconds,
            topics: Vec::new(),
        }
    }

    /// Create a content item from an API-style ISO-8601 duration (`PT12M30S`)
    pub fn with_iso_duration(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        iso_duration: &str,
    ) -> Result<Self> {
        let seconds = duration::parse_iso8601_duration(iso_duration)?;
        Ok(Self::new(id, title, description, seconds))
    }

    /// Return a copy annotated with classifier topics
    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    /// Get formatted duration string
    pub fn duration_formatted(&self) -> String {
        duration::format_duration(self.duration_seconds)
    }
}

/// Difficulty level of a learning path
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Beginner => "beginner",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" => Ok(Level::Beginner),
            "intermediate" => Ok(Level::Intermediate),
            "advanced" => Ok(Level::Advanced),
            other => Err(Error::InvalidPath(format!("unknown level '{}'", other))),
        }
    }
}

/// Conditions a path's progress must meet to count as completed.
///
/// Zero minimums and an empty topic set are vacuously satisfied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionCriteria {
    pub min_items_watched: u32,
    pub min_time_spent_seconds: u64,
    pub required_topics: BTreeSet<String>,
}

/// A named, ordered collection of content items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LearningPath {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub level: Level,

    /// Taxonomy strings, in display order
    #[serde(default)]
    pub topics: Vec<String>,

    /// Items in recommended viewing order
    #[serde(default)]
    pub items: Vec<ContentItem>,

    /// Ids of paths that must be completed before this one is recommended
    #[serde(default)]
    pub prerequisites: Vec<String>,

    #[serde(default)]
    pub completion_criteria: CompletionCriteria,

    /// Display color hint for the dashboard
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f32>,
}

impl LearningPath {
    /// Create a new empty learning path
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: Level) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            level,
            topics: Vec::new(),
            items: Vec::new(),
            prerequisites: Vec::new(),
            completion_criteria: CompletionCriteria::default(),
            color: None,
            estimated_hours: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_topics<I, T>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_prerequisites<I, T>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.prerequisites = prerequisites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_criteria(mut self, criteria: CompletionCriteria) -> Self {
        self.completion_criteria = criteria;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_estimated_hours(mut self, hours: f32) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_item(mut self, item: ContentItem) -> Self {
        self.items.push(item);
        self
    }

    /// Case-insensitive topic lookup, returning the path's own spelling
    pub fn find_topic(&self, topic: &str) -> Option<&str> {
        self.topics
            .iter()
            .find(|t| t.eq_ignore_ascii_case(topic))
            .map(String::as_str)
    }

    pub fn has_item(&self, item_id: &str) -> bool {
        self.items.iter().any(|item| item.id == item_id)
    }
}

/// Watch annotation for a single item inside a path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemWatch {
    pub time_spent_seconds: u64,
    pub last_watched_at: DateTime<Utc>,
    pub completed: bool,
    #[serde(default)]
    pub topics: BTreeSet<String>,
}

/// Aggregate watch state for one learning path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathProgress {
    pub path_id: String,
    pub completed_count: u32,
    pub total_count: u32,
    pub time_spent_seconds: u64,
    #[serde(default)]
    pub completed_topics: BTreeSet<String>,
    pub started_at: DateTime<Utc>,
    pub last_watched_at: DateTime<Utc>,

    /// Per-item annotations keyed by item id
    #[serde(default)]
    pub items: BTreeMap<String, ItemWatch>,

    /// Device-local dates with at least one watch event
    #[serde(default)]
    pub watch_days: BTreeSet<NaiveDate>,
}

impl PathProgress {
    /// Fresh progress record with zero counts
    pub fn new(path_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            path_id: path_id.into(),
            completed_count: 0,
            total_count: 0,
            time_spent_seconds: 0,
            completed_topics: BTreeSet::new(),
            started_at: now,
            last_watched_at: now,
            items: BTreeMap::new(),
            watch_days: BTreeSet::new(),
        }
    }
}

/// Outcome of classifying a content item against the known paths
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub path_id: String,
    /// Matched topics in first-seen order, using the paths' spelling
    pub topics: Vec<String>,
    pub required_watch_seconds: u64,
    /// Level inferred from textual cues, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
}

/// Metadata edit for an existing path; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct PathUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub level: Option<Level>,
    pub topics: Option<Vec<String>>,
    pub prerequisites: Option<Vec<String>>,
    pub completion_criteria: Option<CompletionCriteria>,
    pub color: Option<String>,
}

/// The two persisted records: `paths` and `progress`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub paths: Vec<LearningPath>,
    pub progress: BTreeMap<String, PathProgress>,
}
