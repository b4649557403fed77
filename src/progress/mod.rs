//! Per-path watch progress
//!
//! `ProgressTracker::record_watch` is the single mutation point for progress
//! state. Repeated watches of the same item each count as a completed watch.

pub mod analytics;

pub use analytics::{Milestone, PathAnalytics, DEFAULT_MILESTONES};

use chrono::{DateTime, Local, Utc};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::models::{ContentItem, ItemWatch, LearningPath, PathProgress};

/// Owns the `PathProgress` aggregates, keyed by path id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressTracker {
    progress: BTreeMap<String, PathProgress>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tracker from persisted progress records
    pub fn from_map(progress: BTreeMap<String, PathProgress>) -> Self {
        Self { progress }
    }

    pub fn get(&self, path_id: &str) -> Option<&PathProgress> {
        self.progress.get(path_id)
    }

    pub fn all(&self) -> &BTreeMap<String, PathProgress> {
        &self.progress
    }

    pub fn len(&self) -> usize {
        self.progress.len()
    }

    pub fn is_empty(&self) -> bool {
        self.progress.is_empty()
    }

    /// Drop the progress of a deleted path
    pub fn remove(&mut self, path_id: &str) -> Option<PathProgress> {
        self.progress.remove(path_id)
    }

    /// Drop progress entries whose path no longer exists
    pub fn retain_paths(&mut self, paths: &[LearningPath]) -> usize {
        let before = self.progress.len();
        self.progress
            .retain(|path_id, _| paths.iter().any(|path| &path.id == path_id));
        before - self.progress.len()
    }

    /// Drop completed topics the path no longer lists
    pub fn restrict_topics(&mut self, path: &LearningPath) {
        if let Some(progress) = self.progress.get_mut(&path.id) {
            progress
                .completed_topics
                .retain(|topic| path.find_topic(topic).is_some());
            for watch in progress.items.values_mut() {
                watch.topics.retain(|topic| path.find_topic(topic).is_some());
            }
        }
    }

    /// Record a watch event for `item` on `path` and return the updated snapshot.
    ///
    /// Only topics that belong to the path are added to `completed_topics`.
    pub fn record_watch(
        &mut self,
        path: &LearningPath,
        item: &ContentItem,
        watched_seconds: u64,
        now: DateTime<Utc>,
    ) -> PathProgress {
        let progress = self
            .progress
            .entry(path.id.clone())
            .or_insert_with(|| {
                info!("🆕 Started progress for path: {}", path.id);
                PathProgress::new(path.id.clone(), now)
            });

        progress.completed_count = progress.completed_count.saturating_add(1);
        progress.total_count = progress.total_count.max(progress.completed_count);
        progress.time_spent_seconds = progress.time_spent_seconds.saturating_add(watched_seconds);
        progress.last_watched_at = now;
        progress.watch_days.insert(now.with_timezone(&Local).date_naive());

        let path_topics: Vec<String> = item
            .topics
            .iter()
            .filter_map(|topic| path.find_topic(topic))
            .map(str::to_string)
            .collect();

        progress.completed_topics.extend(path_topics.iter().cloned());

        let watch = progress
            .items
            .entry(item.id.clone())
            .or_insert_with(|| ItemWatch {
                time_spent_seconds: 0,
                last_watched_at: now,
                completed: true,
                topics: Default::default(),
            });
        watch.time_spent_seconds = watch.time_spent_seconds.saturating_add(watched_seconds);
        watch.last_watched_at = now;
        watch.completed = true;
        watch.topics.extend(path_topics);

        debug!(
            "📺 Recorded watch of {} on {}: {} completed, {}s total",
            item.id, path.id, progress.completed_count, progress.time_spent_seconds
        );

        progress.clone()
    }

    /// Whether `path` satisfies its completion criteria
    pub fn is_completed(&self, path: &LearningPath) -> bool {
        is_path_completed(path, self.progress.get(&path.id))
    }
}

/// Completion check for a path and its (possibly absent) progress.
///
/// A path that was never watched is not completed. Otherwise every criterion
/// must hold; zero minimums and an empty required topic set always hold.
pub fn is_path_completed(path: &LearningPath, progress: Option<&PathProgress>) -> bool {
    let Some(progress) = progress else {
        return false;
    };
    let criteria = &path.completion_criteria;

    progress.completed_count >= criteria.min_items_watched
        && progress.time_spent_seconds >= criteria.min_time_spent_seconds
        && criteria.required_topics.iter().all(|required| {
            progress
                .completed_topics
                .iter()
                .any(|done| done.eq_ignore_ascii_case(required))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompletionCriteria, Level};
    use chrono::TimeZone;

    fn python_path() -> LearningPath {
        LearningPath::new("p1", "Python", Level::Beginner)
            .with_topics(["python"])
            .with_criteria(CompletionCriteria {
                min_items_watched: 2,
                min_time_spent_seconds: 1000,
                required_topics: ["python".to_string()].into_iter().collect(),
            })
    }

    fn python_item() -> ContentItem {
        ContentItem::new("v1", "Python Basics Intro", "intro to basics", 600)
            .with_topics(vec!["python".to_string()])
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Local
            .with_ymd_and_hms(2024, 5, day, hour, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_repeated_watches_accumulate() {
        let mut tracker = ProgressTracker::new();
        let path = python_path();
        let item = python_item();

        tracker.record_watch(&path, &item, 600, at(10, 12));
        let progress = tracker.record_watch(&path, &item, 600, at(10, 13));

        assert_eq!(progress.completed_count, 2);
        assert_eq!(progress.total_count, 2);
        assert_eq!(progress.time_spent_seconds, 1200);
        assert_eq!(progress.started_at, at(10, 12));
        assert_eq!(progress.last_watched_at, at(10, 13));
        assert_eq!(progress.items["v1"].time_spent_seconds, 1200);
        assert!(tracker.is_completed(&path));
    }

    #[test]
    fn test_counts_are_monotonic_and_bounded() {
        let mut tracker = ProgressTracker::new();
        let path = python_path();
        let mut last = (0u32, 0u64);

        for (i, seconds) in [0u64, 30, 0, 600, 5].iter().enumerate() {
            let item = ContentItem::new(format!("v{}", i), "Python", "", 60);
            let progress = tracker.record_watch(&path, &item, *seconds, at(10, 12));

            assert!(progress.completed_count <= progress.total_count);
            assert!(progress.completed_count >= last.0);
            assert!(progress.time_spent_seconds >= last.1);
            last = (progress.completed_count, progress.time_spent_seconds);
        }
    }

    #[test]
    fn test_foreign_topics_are_not_recorded() {
        let mut tracker = ProgressTracker::new();
        let path = python_path();
        let item = ContentItem::new("v1", "Python", "", 60)
            .with_topics(vec!["PYTHON".to_string(), "pytorch".to_string()]);

        let progress = tracker.record_watch(&path, &item, 60, at(10, 12));

        assert_eq!(progress.completed_topics.len(), 1);
        assert!(progress.completed_topics.contains("python"));
    }

    #[test]
    fn test_unwatched_path_is_not_completed() {
        let path = LearningPath::new("p", "P", Level::Beginner);
        assert!(!is_path_completed(&path, None));
    }

    #[test]
    fn test_each_criterion_is_required() {
        let mut tracker = ProgressTracker::new();
        let path = python_path();

        tracker.record_watch(&path, &python_item(), 1500, at(10, 12));
        assert!(!tracker.is_completed(&path), "one item is below min_items_watched");

        let untagged = ContentItem::new("v2", "Something", "", 60);
        let mut other = ProgressTracker::new();
        other.record_watch(&path, &untagged, 600, at(10, 12));
        other.record_watch(&path, &untagged, 600, at(10, 12));
        assert!(!other.is_completed(&path), "python topic never watched");
    }

    #[test]
    fn test_vacuous_criteria() {
        let mut tracker = ProgressTracker::new();
        let path = LearningPath::new("p", "P", Level::Beginner);

        tracker.record_watch(&path, &ContentItem::new("v", "t", "", 0), 0, at(10, 12));
        assert!(tracker.is_completed(&path));
    }

    #[test]
    fn test_retain_paths_drops_orphans() {
        let mut tracker = ProgressTracker::new();
        let kept = python_path();
        let gone = LearningPath::new("gone", "Gone", Level::Advanced);

        tracker.record_watch(&kept, &python_item(), 10, at(10, 12));
        tracker.record_watch(&gone, &python_item(), 10, at(10, 12));

        assert_eq!(tracker.retain_paths(std::slice::from_ref(&kept)), 1);
        assert!(tracker.get("gone").is_none());
        assert_eq!(tracker.len(), 1);
    }
}
