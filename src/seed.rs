//! Built-in learning paths used when no saved paths exist

use crate::models::{LearningPath, Level};

/// The default beginner → intermediate → advanced AI track
pub fn default_paths() -> Vec<LearningPath> {
    vec![
        LearningPath::new("ai-basics", "AI Basics", Level::Beginner)
            .with_description("Foundation concepts in artificial intelligence")
            .with_topics(["python", "machine learning", "neural networks"])
            .with_color("bg-green-500")
            .with_estimated_hours(10.0),
        LearningPath::new("ml-projects", "ML Projects", Level::Intermediate)
            .with_description("Hands-on machine learning projects")
            .with_topics(["tensorflow", "pytorch", "computer vision"])
            .with_prerequisites(["ai-basics"])
            .with_color("bg-blue-500")
            .with_estimated_hours(20.0),
        LearningPath::new("advanced-ai", "Advanced AI", Level::Advanced)
            .with_description("Advanced AI concepts and implementations")
            .with_topics(["transformers", "reinforcement learning", "GANs"])
            .with_prerequisites(["ml-projects"])
            .with_color("bg-purple-500")
            .with_estimated_hours(30.0),
    ]
}
