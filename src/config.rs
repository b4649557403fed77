use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::progress::DEFAULT_MILESTONES;
use crate::recommender::RecommenderWeights;

/// Configuration for the learning path engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the `paths` and `progress` records live
    pub storage: StorageConfig,

    /// Classification rules and fallback behaviour
    pub classifier: ClassifierConfig,

    /// Recommendation score weights
    pub recommender: RecommenderConfig,

    /// Analytics settings
    pub analytics: AnalyticsConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the JSON records
    pub data_dir: PathBuf,

    /// File name of the `paths` record
    pub paths_file: String,

    /// File name of the `progress` record
    pub progress_file: String,

    /// Populate built-in paths when nothing has been saved yet
    pub seed_on_first_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Optional rules file extending the default keyword tables
    pub rules_file: Option<PathBuf>,

    /// Path receiving items no existing path matches
    pub fallback_path_id: String,

    /// Create the fallback path on demand when assigning unmatched items
    pub create_fallback_path: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub level_base_score: f64,
    pub shared_topic_weight: f64,
    pub prerequisite_weight: f64,

    /// Cap on the number of recommendations returned
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Completion percentages, ascending
    pub milestones: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter level
    pub level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            paths_file: "paths.json".to_string(),
            progress_file: "progress.json".to_string(),
            seed_on_first_run: true,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules_file: None,
            fallback_path_id: "uncategorized".to_string(),
            create_fallback_path: true,
        }
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        let weights = RecommenderWeights::default();
        Self {
            level_base_score: weights.level_base_score,
            shared_topic_weight: weights.shared_topic_weight,
            prerequisite_weight: weights.prerequisite_weight,
            max_results: None,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            milestones: DEFAULT_MILESTONES.to_vec(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl RecommenderConfig {
    pub fn weights(&self) -> RecommenderWeights {
        RecommenderWeights {
            level_base_score: self.level_base_score,
            shared_topic_weight: self.shared_topic_weight,
            prerequisite_weight: self.prerequisite_weight,
        }
    }
}

impl Config {
    /// Load configuration from the first config file found, else from the environment
    pub fn load() -> Result<Self> {
        let config_paths = ["learning-paths.toml", "config/learning-paths.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config file {}: {}", path, e),
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config_str = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = toml::from_str(&config_str)?;
        config.apply_env();
        tracing::info!("📄 Loaded configuration from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Default configuration with environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(data_dir) = std::env::var("LEARNING_PATHS_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(rules_file) = std::env::var("LEARNING_PATHS_RULES_FILE") {
            self.classifier.rules_file = Some(PathBuf::from(rules_file));
        }

        if let Ok(log_level) = std::env::var("LEARNING_PATHS_LOG_LEVEL") {
            self.logging.level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.paths_file.trim().is_empty() || self.storage.progress_file.trim().is_empty() {
            return Err(Error::Config("storage file names must not be empty".to_string()));
        }

        if self.storage.paths_file == self.storage.progress_file {
            return Err(Error::Config("paths_file and progress_file must differ".to_string()));
        }

        if self.classifier.fallback_path_id.trim().is_empty() {
            return Err(Error::Config("fallback_path_id must not be empty".to_string()));
        }

        let milestones = &self.analytics.milestones;
        if milestones.is_empty() {
            return Err(Error::Config("at least one milestone is required".to_string()));
        }
        if milestones.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::Config("milestones must be strictly ascending".to_string()));
        }
        if milestones.iter().any(|m| *m > 100) {
            return Err(Error::Config("milestones must not exceed 100".to_string()));
        }

        let weights = self.recommender.weights();
        if weights.level_base_score < 0.0
            || weights.shared_topic_weight < 0.0
            || weights.prerequisite_weight < 0.0
        {
            return Err(Error::Config("recommender weights must not be negative".to_string()));
        }

        Ok(())
    }

    /// Full path of the `paths` record
    pub fn paths_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.paths_file)
    }

    /// Full path of the `progress` record
    pub fn progress_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.progress_file)
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Learning Paths Configuration:\n\
            - Data Directory: {}\n\
            - Rules File: {}\n\
            - Fallback Path: {}\n\
            - Milestones: {:?}\n\
            - Log Level: {}",
            self.storage.data_dir.display(),
            self.classifier
                .rules_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(defaults)".to_string()),
            self.classifier.fallback_path_id,
            self.analytics.milestones,
            self.logging.level
        )
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.data_dir = dir;
        self
    }

    pub fn with_rules_file(mut self, path: PathBuf) -> Self {
        self.config.classifier.rules_file = Some(path);
        self
    }

    pub fn with_fallback_path(mut self, path_id: &str, create: bool) -> Self {
        self.config.classifier.fallback_path_id = path_id.to_string();
        self.config.classifier.create_fallback_path = create;
        self
    }

    pub fn with_milestones(mut self, milestones: Vec<u32>) -> Self {
        self.config.analytics.milestones = milestones;
        self
    }

    pub fn with_max_recommendations(mut self, max: usize) -> Self {
        self.config.recommender.max_results = Some(max);
        self
    }

    pub fn seed_on_first_run(mut self, seed: bool) -> Self {
        self.config.storage.seed_on_first_run = seed;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
