//! Rule-based classification of content items into learning paths
//!
//! Topic detection is case-insensitive substring matching of every path topic
//! (plus configured aliases) against the item's title and description. The
//! inferred level narrows the candidates when one of them matches it.

pub mod rules;

pub use rules::{ClassifierRules, LevelRule, RuleStats};

use tracing::debug;

use crate::models::{ClassificationResult, ContentItem, LearningPath, Level};

/// Maps content items onto the best-fitting learning path
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    rules: ClassifierRules,
}

impl Classifier {
    /// Create a classifier with the default rule tables
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: ClassifierRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &ClassifierRules {
        &self.rules
    }

    /// Infer a difficulty level from the item's text
    pub fn infer_level(&self, item: &ContentItem) -> Option<Level> {
        self.rules.infer_level(&scan_text(item))
    }

    /// Topics from any candidate path that appear in the item's text.
    ///
    /// Returned in first-seen order across `paths`, using each path's own
    /// spelling, without case-insensitive duplicates.
    pub fn detect_topics(&self, item: &ContentItem, paths: &[LearningPath]) -> Vec<String> {
        self.detect_in_text(&scan_text(item), paths)
    }

    fn detect_in_text(&self, text: &str, paths: &[LearningPath]) -> Vec<String> {
        let aliased: Vec<&str> = self.rules.aliased_topics(text).collect();
        let mut detected: Vec<String> = Vec::new();

        for topic in paths.iter().flat_map(|path| path.topics.iter()) {
            let needle = topic.trim().to_lowercase();
            if needle.is_empty() {
                continue;
            }

            let matched = text.contains(needle.as_str())
                || aliased.iter().any(|alias| alias.eq_ignore_ascii_case(topic));

            if matched && !detected.iter().any(|t| t.eq_ignore_ascii_case(topic)) {
                detected.push(topic.clone());
            }
        }

        detected
    }

    /// Classify an item against candidate paths.
    ///
    /// Returns `None` when no topic matches or no path shares a detected topic.
    /// Ties on topic overlap go to the earliest path in `paths`.
    pub fn classify(&self, item: &ContentItem, paths: &[LearningPath]) -> Option<ClassificationResult> {
        let text = scan_text(item);
        let detected = self.detect_in_text(&text, paths);
        if detected.is_empty() {
            debug!("No known topics in item {}", item.id);
            return None;
        }

        let level = self.rules.infer_level(&text);

        let overlapping: Vec<(&LearningPath, usize)> = paths
            .iter()
            .map(|path| (path, topic_overlap(path, &detected)))
            .filter(|(_, overlap)| *overlap > 0)
            .collect();

        let same_level: Vec<(&LearningPath, usize)> = match level {
            Some(level) => overlapping
                .iter()
                .copied()
                .filter(|(path, _)| path.level == level)
                .collect(),
            None => Vec::new(),
        };

        let candidates = if same_level.is_empty() {
            &overlapping
        } else {
            &same_level
        };

        let mut best: Option<(&LearningPath, usize)> = None;
        for &(path, overlap) in candidates {
            if best.map_or(true, |(_, best_overlap)| overlap > best_overlap) {
                best = Some((path, overlap));
            }
        }

        let (path, overlap) = best?;
        debug!(
            "Classified item {} into path {} ({} shared topics, level {:?})",
            item.id, path.id, overlap, level
        );

        Some(ClassificationResult {
            path_id: path.id.clone(),
            topics: detected,
            required_watch_seconds: item.duration_seconds,
            level,
        })
    }
}

/// Classify with the default rule tables
pub fn classify(item: &ContentItem, paths: &[LearningPath]) -> Option<ClassificationResult> {
    Classifier::new().classify(item, paths)
}

/// Lower-cased title and description, kept on separate lines so a topic
/// cannot match across the boundary.
fn scan_text(item: &ContentItem) -> String {
    format!("{}\n{}", item.title.to_lowercase(), item.description.to_lowercase())
}

fn topic_overlap(path: &LearningPath, detected: &[String]) -> usize {
    path.topics
        .iter()
        .filter(|topic| detected.iter().any(|d| d.eq_ignore_ascii_case(topic)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_like_paths() -> Vec<LearningPath> {
        vec![
            LearningPath::new("ai-basics", "AI Basics", Level::Beginner)
                .with_topics(["python", "machine learning", "neural networks"]),
            LearningPath::new("ml-projects", "ML Projects", Level::Intermediate)
                .with_topics(["tensorflow", "pytorch", "computer vision"]),
            LearningPath::new("advanced-ai", "Advanced AI", Level::Advanced)
                .with_topics(["transformers", "reinforcement learning", "GANs", "pytorch"]),
        ]
    }

    #[test]
    fn test_single_path_match() {
        let paths = vec![LearningPath::new("p1", "Python", Level::Beginner).with_topics(["python"])];
        let item = ContentItem::new("v1", "Python Basics Intro", "intro to basics", 600);

        let result = classify(&item, &paths).unwrap();
        assert_eq!(result.path_id, "p1");
        assert_eq!(result.topics, vec!["python".to_string()]);
        assert_eq!(result.required_watch_seconds, 600);
        assert_eq!(result.level, Some(Level::Beginner));
    }

    #[test]
    fn test_no_topic_yields_none() {
        let item = ContentItem::new("v1", "Cooking pasta", "a beginner recipe", 300);
        assert!(classify(&item, &seed_like_paths()).is_none());
    }

    #[test]
    fn test_level_filter_prefers_matching_level() {
        // pytorch belongs to both the intermediate and advanced paths
        let item = ContentItem::new("v1", "PyTorch project walkthrough", "", 900);
        let result = classify(&item, &seed_like_paths()).unwrap();
        assert_eq!(result.path_id, "ml-projects");

        let item = ContentItem::new("v2", "Advanced PyTorch", "", 900);
        let result = classify(&item, &seed_like_paths()).unwrap();
        assert_eq!(result.path_id, "advanced-ai");
    }

    #[test]
    fn test_level_filter_relaxes_when_no_path_has_level() {
        let item = ContentItem::new("v1", "Advanced Python", "expert tricks", 120);
        let result = classify(&item, &seed_like_paths()).unwrap();

        assert_eq!(result.path_id, "ai-basics");
        assert_eq!(result.level, Some(Level::Advanced));
    }

    #[test]
    fn test_highest_overlap_wins_and_ties_go_to_first() {
        let paths = vec![
            LearningPath::new("a", "A", Level::Beginner).with_topics(["rust"]),
            LearningPath::new("b", "B", Level::Beginner).with_topics(["rust", "tokio"]),
            LearningPath::new("c", "C", Level::Beginner).with_topics(["tokio", "rust"]),
        ];

        let item = ContentItem::new("v1", "Rust and Tokio", "", 60);
        assert_eq!(classify(&item, &paths).unwrap().path_id, "b");

        let item = ContentItem::new("v2", "Rust", "", 60);
        assert_eq!(classify(&item, &paths).unwrap().path_id, "a");
    }

    #[test]
    fn test_topics_keep_path_spelling_and_dedupe() {
        let item = ContentItem::new("v1", "GANs and PyTorch", "training gans with pytorch", 60);
        let result = classify(&item, &seed_like_paths()).unwrap();

        assert_eq!(result.topics, vec!["pytorch".to_string(), "GANs".to_string()]);
    }

    #[test]
    fn test_detect_topics_across_paths() {
        let classifier = Classifier::new();
        let item = ContentItem::new("v1", "Computer Vision with PyTorch", "python tooling", 60);

        assert_eq!(
            classifier.detect_topics(&item, &seed_like_paths()),
            vec!["python".to_string(), "pytorch".to_string(), "computer vision".to_string()]
        );
        assert_eq!(classifier.infer_level(&item), None);
    }

    #[test]
    fn test_no_match_across_title_description_boundary() {
        let paths = vec![
            LearningPath::new("p", "P", Level::Beginner).with_topics(["machine learning"]),
        ];
        let item = ContentItem::new("v1", "Build a machine", "learning is fun", 60);
        assert!(classify(&item, &paths).is_none());
    }

    #[test]
    fn test_alias_rules_detect_topics() {
        let mut rules = ClassifierRules::new();
        rules.add_topic_alias("rl", "reinforcement learning");
        let classifier = Classifier::with_rules(rules);

        let item = ContentItem::new("v1", "RL from scratch", "", 60);
        let result = classifier.classify(&item, &seed_like_paths()).unwrap();
        assert_eq!(result.path_id, "advanced-ai");
        assert_eq!(result.topics, vec!["reinforcement learning".to_string()]);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let paths = seed_like_paths();
        let item = ContentItem::new("v1", "Neural networks in PyTorch", "an introduction", 420);

        let first = classify(&item, &paths);
        for _ in 0..10 {
            assert_eq!(classify(&item, &paths), first);
        }
    }
}
