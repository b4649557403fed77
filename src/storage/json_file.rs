use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use super::Store;
use crate::config::Config;
use crate::error::Result;
use crate::models::{LearningPath, PathProgress, PersistedState};

/// Stores `paths` and `progress` as two pretty-printed JSON files
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    paths_file: PathBuf,
    progress_file: PathBuf,
}

impl JsonFileStore {
    pub fn new(paths_file: PathBuf, progress_file: PathBuf) -> Self {
        Self {
            paths_file,
            progress_file,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.paths_path(), config.progress_path())
    }

    pub fn paths_file(&self) -> &Path {
        &self.paths_file
    }

    pub fn progress_file(&self) -> &Path {
        &self.progress_file
    }

    /// Serialize `value` into a temporary sibling of `path` and return the temp path
    async fn stage_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let json_content = serde_json::to_string_pretty(value)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json_content).await?;
        Ok(tmp_path)
    }

    /// Move both staged records into place.
    ///
    /// The previous paths record is kept aside until the progress record is in
    /// place, and put back if that fails, so the two files never disagree.
    async fn swap_in(&self, paths_tmp: &Path, progress_tmp: &Path) -> Result<()> {
        let backup = self.paths_file.with_extension("json.bak");
        let had_paths = fs::try_exists(&self.paths_file).await?;
        if had_paths {
            fs::rename(&self.paths_file, &backup).await?;
        }

        if let Err(e) = fs::rename(paths_tmp, &self.paths_file).await {
            if had_paths {
                fs::rename(&backup, &self.paths_file).await?;
            }
            return Err(e.into());
        }

        if let Err(e) = fs::rename(progress_tmp, &self.progress_file).await {
            warn!(
                "⚠️ Could not replace {}, restoring previous paths record",
                self.progress_file.display()
            );
            if had_paths {
                fs::rename(&backup, &self.paths_file).await?;
            } else {
                fs::remove_file(&self.paths_file).await?;
            }
            return Err(e.into());
        }

        if had_paths {
            fs::remove_file(&backup).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Store for JsonFileStore {
    async fn load(&self) -> Result<Option<PersistedState>> {
        let paths_exists = fs::try_exists(&self.paths_file).await?;
        let progress_exists = fs::try_exists(&self.progress_file).await?;

        if !paths_exists && !progress_exists {
            debug!("No saved state at {}", self.paths_file.display());
            return Ok(None);
        }

        let paths: Vec<LearningPath> = if paths_exists {
            serde_json::from_str(&fs::read_to_string(&self.paths_file).await?)?
        } else {
            Vec::new()
        };

        let progress: BTreeMap<String, PathProgress> = if progress_exists {
            serde_json::from_str(&fs::read_to_string(&self.progress_file).await?)?
        } else {
            BTreeMap::new()
        };

        info!(
            "📁 Loaded {} learning paths and {} progress records",
            paths.len(),
            progress.len()
        );
        Ok(Some(PersistedState { paths, progress }))
    }

    async fn save(&self, state: &PersistedState) -> Result<()> {
        let paths_tmp = Self::stage_json(&self.paths_file, &state.paths).await?;
        let staged = match Self::stage_json(&self.progress_file, &state.progress).await {
            Ok(progress_tmp) => self.swap_in(&paths_tmp, &progress_tmp).await,
            Err(e) => Err(e),
        };

        if let Err(e) = staged {
            for tmp in [paths_tmp, self.progress_file.with_extension("json.tmp")] {
                if fs::try_exists(&tmp).await.unwrap_or(false) {
                    let _ = fs::remove_file(&tmp).await;
                }
            }
            return Err(e);
        }

        debug!("💾 Saved state to {}", self.paths_file.display());
        Ok(())
    }
}
