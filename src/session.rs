//! Engine plus its storage collaborator
//!
//! State is loaded once in `open` and saved after every mutation. A mutation
//! whose save fails is reverted in memory, so the engine never runs ahead of
//! what was persisted.

use tracing::{info, warn};

use crate::classifier::{Classifier, ClassifierRules};
use crate::config::Config;
use crate::engine::{Assignment, Engine};
use crate::error::Result;
use crate::models::{ContentItem, LearningPath, PathProgress, PathUpdate, PersistedState};
use crate::seed;
use crate::storage::Store;

pub struct Session<S: Store> {
    engine: Engine,
    store: S,
}

impl<S: Store> Session<S> {
    /// Wrap an already built engine without loading anything
    pub fn new(engine: Engine, store: S) -> Self {
        Self { engine, store }
    }

    /// Load saved state (seeding built-in paths on first run) and build the engine
    pub async fn open(store: S, config: &Config) -> Result<Self> {
        let rules = match &config.classifier.rules_file {
            Some(path) => ClassifierRules::from_file(path).await?,
            None => ClassifierRules::new(),
        };
        let classifier = Classifier::with_rules(rules);

        let state = match store.load().await? {
            Some(state) => state,
            None if config.storage.seed_on_first_run => {
                let state = PersistedState {
                    paths: seed::default_paths(),
                    progress: Default::default(),
                };
                store.save(&state).await?;
                info!("🌱 Seeded {} built-in learning paths", state.paths.len());
                state
            }
            None => PersistedState::default(),
        };

        let engine = Engine::from_config(config, classifier, state);
        info!("📊 Session opened with {} learning paths", engine.paths().len());
        Ok(Self { engine, store })
    }

    /// Read-only access for queries
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Apply a mutation, persist the result, and revert the engine if either step fails
    pub async fn commit<T, F>(&mut self, action: &str, mutate: F) -> Result<T>
    where
        F: FnOnce(&mut Engine) -> Result<T>,
    {
        let previous = self.engine.clone();

        let output = match mutate(&mut self.engine) {
            Ok(output) => output,
            Err(e) => {
                self.engine = previous;
                return Err(e);
            }
        };

        if let Err(e) = self.store.save(&self.engine.state()).await {
            warn!("⚠️ Failed to persist {}, reverting: {}", action, e);
            self.engine = previous;
            if let Err(resave) = self.store.save(&self.engine.state()).await {
                warn!("⚠️ Could not re-save state after failed {}: {}", action, resave);
            }
            return Err(e);
        }

        Ok(output)
    }

    pub async fn record_watch(&mut self, path_id: &str, item: &ContentItem, watched_seconds: u64) -> Result<PathProgress> {
        self.commit("watch", |engine| engine.record_watch(path_id, item, watched_seconds))
            .await
    }

    pub async fn add_path(&mut self, path: LearningPath) -> Result<()> {
        self.commit("new path", |engine| engine.add_path(path)).await
    }

    pub async fn update_path(&mut self, path_id: &str, update: PathUpdate) -> Result<LearningPath> {
        self.commit("path update", |engine| engine.update_path(path_id, update))
            .await
    }

    pub async fn delete_path(&mut self, path_id: &str) -> Result<LearningPath> {
        self.commit("path deletion", |engine| engine.delete_path(path_id))
            .await
    }

    pub async fn add_item(&mut self, path_id: &str, item: ContentItem) -> Result<bool> {
        self.commit("item addition", |engine| engine.add_item(path_id, item))
            .await
    }

    pub async fn remove_item(&mut self, path_id: &str, item_id: &str) -> Result<bool> {
        self.commit("item removal", |engine| engine.remove_item(path_id, item_id))
            .await
    }

    pub async fn assign_item(&mut self, item: ContentItem) -> Result<Option<Assignment>> {
        self.commit("item assignment", |engine| engine.assign_item(item))
            .await
    }
}
