use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{LearningPath, PathProgress};

/// Completion percentages a path moves through
pub const DEFAULT_MILESTONES: [u32; 4] = [25, 50, 75, 100];

/// Next completion threshold and where the path stands against it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub value: u32,
    pub progress: f64,
}

/// Derived analytics for one learning path
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PathAnalytics {
    pub path_id: String,
    /// Percentage in [0, 100]
    pub completion_rate: f64,
    pub time_spent_today: u64,
    pub streak_days: u32,
    pub next_milestone: Milestone,
    /// Per path topic, percentage of tagged path items already watched
    pub topics_progress: BTreeMap<String, f64>,
    /// Duration of path items not yet watched
    pub estimated_seconds_left: u64,
}

/// Compute analytics for `path` as seen on the device-local date `today`
pub fn compute(
    path: &LearningPath,
    progress: Option<&PathProgress>,
    today: NaiveDate,
    milestones: &[u32],
) -> PathAnalytics {
    let completion_rate = progress.map_or(0.0, completion_rate);

    PathAnalytics {
        path_id: path.id.clone(),
        completion_rate,
        time_spent_today: progress.map_or(0, |p| time_spent_on(p, today)),
        streak_days: progress.map_or(0, |p| streak_days(&p.watch_days, today)),
        next_milestone: next_milestone(completion_rate, milestones),
        topics_progress: topics_progress(path, progress),
        estimated_seconds_left: estimated_seconds_left(path, progress),
    }
}

/// `completed / max(total, 1) * 100`
pub fn completion_rate(progress: &PathProgress) -> f64 {
    let total = progress.total_count.max(1) as f64;
    (progress.completed_count as f64 / total * 100.0).min(100.0)
}

/// Seconds spent on items whose last watch fell on `today`
pub fn time_spent_on(progress: &PathProgress, today: NaiveDate) -> u64 {
    progress
        .items
        .values()
        .filter(|watch| watch.last_watched_at.with_timezone(&Local).date_naive() == today)
        .map(|watch| watch.time_spent_seconds)
        .sum()
}

/// Consecutive days with a watch, walking back from `today`
pub fn streak_days(watch_days: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = today;

    while watch_days.contains(&day) {
        streak += 1;
        match day.pred_opt() {
            Some(previous) => day = previous,
            None => break,
        }
    }

    streak
}

/// Smallest milestone strictly above `rate`, or 100 once all are passed
pub fn next_milestone(rate: f64, milestones: &[u32]) -> Milestone {
    let value = milestones
        .iter()
        .copied()
        .find(|m| f64::from(*m) > rate)
        .unwrap_or(100);

    Milestone {
        value,
        progress: rate,
    }
}

fn topics_progress(path: &LearningPath, progress: Option<&PathProgress>) -> BTreeMap<String, f64> {
    path.topics
        .iter()
        .map(|topic| {
            let tagged: Vec<&str> = path
                .items
                .iter()
                .filter(|item| item.topics.iter().any(|t| t.eq_ignore_ascii_case(topic)))
                .map(|item| item.id.as_str())
                .collect();

            let watched = tagged
                .iter()
                .filter(|id| {
                    progress
                        .and_then(|p| p.items.get(**id))
                        .map_or(false, |watch| watch.completed)
                })
                .count();

            let percent = if tagged.is_empty() {
                0.0
            } else {
                watched as f64 / tagged.len() as f64 * 100.0
            };

            (topic.clone(), percent)
        })
        .collect()
}

fn estimated_seconds_left(path: &LearningPath, progress: Option<&PathProgress>) -> u64 {
    path.items
        .iter()
        .filter(|item| {
            !progress
                .and_then(|p| p.items.get(&item.id))
                .map_or(false, |watch| watch.completed)
        })
        .map(|item| item.duration_seconds)
        .sum()
}
