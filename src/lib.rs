//! Learning Paths - engine for a personal learning dashboard
//!
//! Classifies videos from a video search API into learning paths, tracks watch
//! progress per path, and recommends what to study next.

pub mod classifier;
pub mod config;
pub mod duration;
pub mod engine;
pub mod error;
pub mod models;
pub mod progress;
pub mod recommender;
pub mod seed;
pub mod session;
pub mod storage;

// Re-export main types for easy access
pub use crate::classifier::{classify, Classifier, ClassifierRules};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::engine::{Assignment, DashboardSummary, Engine};
pub use crate::error::{Error, Result};
pub use crate::models::{
    ClassificationResult, CompletionCriteria, ContentItem, ItemWatch, LearningPath, Level,
    PathProgress, PathUpdate, PersistedState,
};
pub use crate::progress::{is_path_completed, Milestone, PathAnalytics, ProgressTracker};
pub use crate::recommender::{recommend, Recommendation, RecommenderWeights};
pub use crate::session::Session;
pub use crate::storage::{JsonFileStore, MemoryStore, Store};
