//! Learning path engine
//!
//! Owns the learning paths and their progress for one session. All reads and
//! mutations go through here; persistence is handled outside by `Session`.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{
    ClassificationResult, ContentItem, LearningPath, Level, PathProgress, PathUpdate, PersistedState,
};
use crate::progress::{analytics, PathAnalytics, ProgressTracker, DEFAULT_MILESTONES};
use crate::recommender::{self, Recommendation, RecommenderWeights};

/// Where `assign_item` placed a content item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub path_id: String,
    /// `None` when the item went to the fallback path
    pub classification: Option<ClassificationResult>,
    /// False when the path already held an item with the same id
    pub added: bool,
}

/// Totals across all paths for the dashboard header
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_videos_watched: u64,
    pub total_seconds_watched: u64,
    pub active_paths: usize,
    pub completed_paths: usize,
}

#[derive(Debug, Clone)]
pub struct Engine {
    paths: Vec<LearningPath>,
    tracker: ProgressTracker,
    classifier: Classifier,
    weights: RecommenderWeights,
    milestones: Vec<u32>,
    fallback_path_id: Option<String>,
    max_recommendations: Option<usize>,
}

impl Engine {
    /// Create an engine over `paths` with no progress and default settings
    pub fn new(paths: Vec<LearningPath>) -> Self {
        Self::from_state(PersistedState {
            paths,
            progress: Default::default(),
        })
    }

    /// Rebuild an engine from persisted records.
    ///
    /// Duplicate path ids keep their first occurrence and progress entries
    /// without a path are dropped.
    pub fn from_state(state: PersistedState) -> Self {
        let mut paths: Vec<LearningPath> = Vec::with_capacity(state.paths.len());
        for path in state.paths {
            if paths.iter().any(|p| p.id == path.id) {
                warn!("Skipping duplicate learning path: {}", path.id);
                continue;
            }
            paths.push(path);
        }

        let mut tracker = ProgressTracker::from_map(state.progress);
        let orphans = tracker.retain_paths(&paths);
        if orphans > 0 {
            warn!("Dropped {} progress records without a learning path", orphans);
        }

        Self {
            paths,
            tracker,
            classifier: Classifier::new(),
            weights: RecommenderWeights::default(),
            milestones: DEFAULT_MILESTONES.to_vec(),
            fallback_path_id: None,
            max_recommendations: None,
        }
    }

    /// Rebuild an engine from persisted records using configured settings
    pub fn from_config(config: &Config, classifier: Classifier, state: PersistedState) -> Self {
        let fallback = config
            .classifier
            .create_fallback_path
            .then(|| config.classifier.fallback_path_id.clone());

        Self::from_state(state)
            .with_classifier(classifier)
            .with_weights(config.recommender.weights())
            .with_milestones(config.analytics.milestones.clone())
            .with_fallback_path(fallback)
            .with_max_recommendations(config.recommender.max_results)
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_weights(mut self, weights: RecommenderWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_milestones(mut self, milestones: Vec<u32>) -> Self {
        self.milestones = milestones;
        self
    }

    /// Path id that receives unclassified items in `assign_item`
    pub fn with_fallback_path(mut self, path_id: Option<String>) -> Self {
        self.fallback_path_id = path_id;
        self
    }

    pub fn with_max_recommendations(mut self, max: Option<usize>) -> Self {
        self.max_recommendations = max;
        self
    }

    pub fn paths(&self) -> &[LearningPath] {
        &self.paths
    }

    pub fn path(&self, path_id: &str) -> Option<&LearningPath> {
        self.paths.iter().find(|p| p.id == path_id)
    }

    pub fn progress(&self, path_id: &str) -> Option<&PathProgress> {
        self.tracker.get(path_id)
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Snapshot of the persisted records
    pub fn state(&self) -> PersistedState {
        PersistedState {
            paths: self.paths.clone(),
            progress: self.tracker.all().clone(),
        }
    }

    fn require_path(&self, path_id: &str) -> Result<&LearningPath> {
        self.path(path_id)
            .ok_or_else(|| Error::PathNotFound(path_id.to_string()))
    }

    fn require_path_mut(&mut self, path_id: &str) -> Result<&mut LearningPath> {
        self.paths
            .iter_mut()
            .find(|p| p.id == path_id)
            .ok_or_else(|| Error::PathNotFound(path_id.to_string()))
    }

    /// Classify an item against the current paths
    pub fn classify(&self, item: &ContentItem) -> Option<ClassificationResult> {
        self.classifier.classify(item, &self.paths)
    }

    /// Record a watch event now
    pub fn record_watch(&mut self, path_id: &str, item: &ContentItem, watched_seconds: u64) -> Result<PathProgress> {
        self.record_watch_at(path_id, item, watched_seconds, Utc::now())
    }

    /// Record a watch event at `now`.
    ///
    /// Progress is created on the first watch. An item passed without topics
    /// takes the topics of the path's own copy of that item.
    pub fn record_watch_at(
        &mut self,
        path_id: &str,
        item: &ContentItem,
        watched_seconds: u64,
        now: DateTime<Utc>,
    ) -> Result<PathProgress> {
        let path = self
            .paths
            .iter()
            .find(|p| p.id == path_id)
            .ok_or_else(|| Error::PathNotFound(path_id.to_string()))?;

        let stored = if item.topics.is_empty() {
            path.items.iter().find(|stored| stored.id == item.id)
        } else {
            None
        };

        let progress = self
            .tracker
            .record_watch(path, stored.unwrap_or(item), watched_seconds, now);

        info!(
            "📺 Watched {} on {} ({}s, {}/{} items)",
            item.id, path_id, watched_seconds, progress.completed_count, progress.total_count
        );
        Ok(progress)
    }

    pub fn is_path_completed(&self, path_id: &str) -> Result<bool> {
        let path = self.require_path(path_id)?;
        Ok(self.tracker.is_completed(path))
    }

    /// Analytics as of the current device-local date
    pub fn analytics(&self, path_id: &str) -> Result<PathAnalytics> {
        self.analytics_on(path_id, Local::now().date_naive())
    }

    pub fn analytics_on(&self, path_id: &str, today: NaiveDate) -> Result<PathAnalytics> {
        let path = self.require_path(path_id)?;
        Ok(analytics::compute(
            path,
            self.tracker.get(path_id),
            today,
            &self.milestones,
        ))
    }

    /// Ranked recommendations with their scores
    pub fn recommendations(&self) -> Vec<Recommendation<'_>> {
        let mut ranked = recommender::score_paths(&self.paths, self.tracker.all(), &self.weights);
        if let Some(max) = self.max_recommendations {
            ranked.truncate(max);
        }
        ranked
    }

    /// Recommended paths, best first
    pub fn recommend(&self) -> Vec<LearningPath> {
        self.recommendations()
            .into_iter()
            .map(|rec| rec.path.clone())
            .collect()
    }

    /// Add a new learning path
    pub fn add_path(&mut self, path: LearningPath) -> Result<()> {
        validate_path_fields(&path.id, &path.name)?;
        if path.prerequisites.iter().any(|p| p == &path.id) {
            return Err(Error::InvalidPath(format!("{} lists itself as a prerequisite", path.id)));
        }
        if self.path(&path.id).is_some() {
            return Err(Error::DuplicatePath(path.id));
        }

        info!("➕ Added learning path: {} ({})", path.id, path.level);
        self.paths.push(path);
        Ok(())
    }

    /// Edit path metadata; returns the updated path
    pub fn update_path(&mut self, path_id: &str, update: PathUpdate) -> Result<LearningPath> {
        let current = self.require_path(path_id)?;
        if let Some(name) = &update.name {
            validate_path_fields(&current.id, name)?;
        }
        if let Some(prerequisites) = &update.prerequisites {
            if prerequisites.iter().any(|p| p == path_id) {
                return Err(Error::InvalidPath(format!("{} lists itself as a prerequisite", path_id)));
            }
        }

        let path = self.require_path_mut(path_id)?;
        if let Some(name) = update.name {
            path.name = name;
        }
        if let Some(description) = update.description {
            path.description = description;
        }
        if let Some(level) = update.level {
            path.level = level;
        }
        if let Some(topics) = update.topics {
            path.topics = topics;
        }
        if let Some(prerequisites) = update.prerequisites {
            path.prerequisites = prerequisites;
        }
        if let Some(criteria) = update.completion_criteria {
            path.completion_criteria = criteria;
        }
        if let Some(color) = update.color {
            path.color = Some(color);
        }
        let updated = path.clone();

        self.tracker.restrict_topics(&updated);
        info!("✏️ Updated learning path: {}", path_id);
        Ok(updated)
    }

    /// Delete a path together with its progress
    pub fn delete_path(&mut self, path_id: &str) -> Result<LearningPath> {
        let index = self
            .paths
            .iter()
            .position(|p| p.id == path_id)
            .ok_or_else(|| Error::PathNotFound(path_id.to_string()))?;

        let removed = self.paths.remove(index);
        self.tracker.remove(path_id);

        let dependents: Vec<&str> = self
            .paths
            .iter()
            .filter(|p| p.prerequisites.iter().any(|pre| pre == path_id))
            .map(|p| p.id.as_str())
            .collect();
        if !dependents.is_empty() {
            warn!("Deleted path {} is still a prerequisite of {:?}", path_id, dependents);
        }

        info!("🗑️ Deleted learning path: {}", path_id);
        Ok(removed)
    }

    /// Append an item to a path; false if the path already holds that item id
    pub fn add_item(&mut self, path_id: &str, item: ContentItem) -> Result<bool> {
        let path = self.require_path_mut(path_id)?;
        if path.has_item(&item.id) {
            debug!("Item {} already in path {}", item.id, path_id);
            return Ok(false);
        }

        path.items.push(item);
        Ok(true)
    }

    /// Remove an item from a path; false if it was not there
    pub fn remove_item(&mut self, path_id: &str, item_id: &str) -> Result<bool> {
        let path = self.require_path_mut(path_id)?;
        let before = path.items.len();
        path.items.retain(|item| item.id != item_id);
        Ok(path.items.len() != before)
    }

    /// Classify an item and append it to the matching path.
    ///
    /// Unmatched items go to the fallback path when one is configured
    /// (created on demand); otherwise `None` is returned and nothing changes.
    pub fn assign_item(&mut self, item: ContentItem) -> Result<Option<Assignment>> {
        if let Some(classification) = self.classify(&item) {
            let path_id = classification.path_id.clone();
            let item = item.with_topics(classification.topics.clone());
            let added = self.add_item(&path_id, item)?;
            return Ok(Some(Assignment {
                path_id,
                classification: Some(classification),
                added,
            }));
        }

        let Some(fallback_id) = self.fallback_path_id.clone() else {
            debug!("Item {} matched no learning path", item.id);
            return Ok(None);
        };

        if self.path(&fallback_id).is_none() {
            self.add_path(
                LearningPath::new(fallback_id.clone(), "Uncategorized", Level::Beginner)
                    .with_description("Videos that matched no learning path"),
            )?;
        }

        let added = self.add_item(&fallback_id, item)?;
        Ok(Some(Assignment {
            path_id: fallback_id,
            classification: None,
            added,
        }))
    }

    /// Totals for the dashboard
    pub fn summary(&self) -> DashboardSummary {
        let progress = self.tracker.all();
        DashboardSummary {
            total_videos_watched: progress.values().map(|p| u64::from(p.completed_count)).sum(),
            total_seconds_watched: progress.values().map(|p| p.time_spent_seconds).sum(),
            active_paths: progress.len(),
            completed_paths: self
                .paths
                .iter()
                .filter(|path| self.tracker.is_completed(path))
                .count(),
        }
    }
}

fn validate_path_fields(id: &str, name: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(Error::InvalidPath("path id must not be empty".to_string()));
    }
    if name.trim().is_empty() {
        return Err(Error::InvalidPath(format!("path {} needs a name", id)));
    }
    Ok(())
}
