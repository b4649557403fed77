//! Ranking of learning paths the user has not completed yet

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::models::{LearningPath, Level, PathProgress};
use crate::progress::is_path_completed;

/// Weights of the recommendation score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RecommenderWeights {
    /// Added when a path's level is the next step of the user's progression
    pub level_base_score: f64,
    /// Added per topic shared with any completed path
    pub shared_topic_weight: f64,
    /// Added per completed prerequisite
    pub prerequisite_weight: f64,
}

impl Default for RecommenderWeights {
    fn default() -> Self {
        Self {
            level_base_score: 1.0,
            shared_topic_weight: 0.5,
            prerequisite_weight: 1.0,
        }
    }
}

/// A recommended path with its score
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation<'a> {
    pub path: &'a LearningPath,
    pub score: f64,
}

/// Recommend paths with the default weights
pub fn recommend(paths: &[LearningPath], progress: &BTreeMap<String, PathProgress>) -> Vec<LearningPath> {
    score_paths(paths, progress, &RecommenderWeights::default())
        .into_iter()
        .map(|rec| rec.path.clone())
        .collect()
}

/// Score and rank every eligible path, best first.
///
/// Completed paths and paths with an uncompleted prerequisite are left out.
/// Equal scores keep the order of `paths`.
pub fn score_paths<'a>(
    paths: &'a [LearningPath],
    progress: &BTreeMap<String, PathProgress>,
    weights: &RecommenderWeights,
) -> Vec<Recommendation<'a>> {
    let completed: Vec<&LearningPath> = paths
        .iter()
        .filter(|path| is_path_completed(path, progress.get(&path.id)))
        .collect();
    let completed_ids: HashSet<&str> = completed.iter().map(|path| path.id.as_str()).collect();
    let completed_topics: HashSet<String> = completed
        .iter()
        .flat_map(|path| path.topics.iter().map(|t| t.to_lowercase()))
        .collect();

    let any_completed = !completed.is_empty();
    let beginner_done = completed.iter().any(|path| path.level == Level::Beginner);
    let intermediate_done = completed.iter().any(|path| path.level == Level::Intermediate);

    let mut ranked: Vec<Recommendation<'a>> = paths
        .iter()
        .filter(|path| !completed_ids.contains(path.id.as_str()))
        .filter(|path| {
            path.prerequisites
                .iter()
                .all(|prereq| completed_ids.contains(prereq.as_str()))
        })
        .map(|path| {
            let level_step = match path.level {
                Level::Beginner => !any_completed,
                Level::Intermediate => beginner_done,
                Level::Advanced => intermediate_done,
            };
            let base = if level_step { weights.level_base_score } else { 0.0 };

            let shared_topics = path
                .topics
                .iter()
                .filter(|topic| completed_topics.contains(&topic.to_lowercase()))
                .count();

            let prerequisites: HashSet<&str> =
                path.prerequisites.iter().map(String::as_str).collect();

            let score = base
                + shared_topics as f64 * weights.shared_topic_weight
                + prerequisites.len() as f64 * weights.prerequisite_weight;

            debug!("Recommendation score for {}: {:.2}", path.id, score);
            Recommendation { path, score }
        })
        .collect();

    // sort_by is stable, so ties keep input order
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
