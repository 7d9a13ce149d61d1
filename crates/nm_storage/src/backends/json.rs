use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use nm_core::storage::ArticleList;
use nm_core::{Article, Artifacts, Error, PersistedState, Result, StateStore, Stats};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tokio::io::AsyncWriteExt;

pub const ARTICLES_FILE: &str = "articles.json";
pub const ARTICLES_BY_ID_FILE: &str = "articles_by_id.json";
pub const STATS_FILE: &str = "stats.json";

const CURRENT: &str = "current";
const GENERATIONS: &str = "generations";
const DEFAULT_KEEP_GENERATIONS: usize = 3;

/// Publishes each artifact set into its own generation directory and then
/// repoints `current` at it with a single rename, so a reader that goes
/// through `current` sees either the old set or the new one, never a mix.
///
/// ```text
/// <root>/current -> generations/20251015T120000.000Z
/// <root>/generations/20251015T120000.000Z/{articles,articles_by_id,stats}.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    root: PathBuf,
    keep_generations: usize,
}

impl JsonDirStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            keep_generations: DEFAULT_KEEP_GENERATIONS,
        }
    }

    pub fn with_keep_generations(mut self, keep: usize) -> Self {
        self.keep_generations = keep.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn current_dir(&self) -> PathBuf {
        self.root.join(CURRENT)
    }

    fn generations_dir(&self) -> PathBuf {
        self.root.join(GENERATIONS)
    }

    async fn read_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T> {
        let bytes = fs::read(dir.join(name)).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                Error::Consistency(format!("{} is missing from {}", name, dir.display()))
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let mut file = fs::File::create(dir.join(name)).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn new_generation_dir(&self, artifacts: &Artifacts) -> Result<(String, PathBuf)> {
        let stamp = artifacts
            .stats
            .last_refresh
            .format("%Y%m%dT%H%M%S%.3fZ")
            .to_string();
        let generations = self.generations_dir();
        fs::create_dir_all(&generations).await?;

        let mut name = stamp.clone();
        let mut attempt = 1;
        while fs::try_exists(generations.join(&name)).await? {
            name = format!("{}-{}", stamp, attempt);
            attempt += 1;
        }
        let dir = generations.join(&name);
        fs::create_dir(&dir).await?;
        Ok((name, dir))
    }

    #[cfg(unix)]
    async fn swap_current(&self, generation: &str) -> Result<()> {
        let staged = self.root.join(format!(".{}.tmp", CURRENT));
        match fs::remove_file(&staged).await {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(Error::Io(e)),
            _ => {}
        }
        fs::symlink(Path::new(GENERATIONS).join(generation), &staged).await?;
        fs::rename(&staged, self.current_dir()).await?;
        Ok(())
    }

    #[cfg(not(unix))]
    async fn swap_current(&self, generation: &str) -> Result<()> {
        let source = self.generations_dir().join(generation);
        let staged = self.root.join(format!(".{}.tmp", CURRENT));
        let _ = fs::remove_dir_all(&staged).await;
        fs::create_dir_all(&staged).await?;
        for name in [ARTICLES_FILE, ARTICLES_BY_ID_FILE, STATS_FILE] {
            fs::copy(source.join(name), staged.join(name)).await?;
        }
        let _ = fs::remove_dir_all(self.current_dir()).await;
        fs::rename(&staged, self.current_dir()).await?;
        Ok(())
    }

    /// Removes all but the newest generations. The generation `current`
    /// points at is always kept.
    async fn prune_generations(&self, current: &str) -> Result<()> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(self.generations_dir()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        let excess = names.len().saturating_sub(self.keep_generations);
        for name in names.into_iter().take(excess).filter(|n| n != current) {
            tracing::debug!("🧹 Removing old generation {}", name);
            fs::remove_dir_all(self.generations_dir().join(&name)).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for JsonDirStore {
    async fn load(&self) -> Result<PersistedState> {
        Ok(self
            .load_artifacts()
            .await?
            .map(|a| a.to_state())
            .unwrap_or_default())
    }

    async fn load_artifacts(&self) -> Result<Option<Artifacts>> {
        let dir = self.current_dir();
        match fs::symlink_metadata(&dir).await {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        }
        if !fs::try_exists(&dir).await? {
            return Err(Error::Consistency(format!(
                "{} points at a generation that no longer exists",
                dir.display()
            )));
        }

        let list: ArticleList = Self::read_json(&dir, ARTICLES_FILE).await?;
        let by_id: BTreeMap<String, Article> = Self::read_json(&dir, ARTICLES_BY_ID_FILE).await?;
        let stats: Stats = Self::read_json(&dir, STATS_FILE).await?;

        let artifacts = Artifacts { list, by_id, stats };
        artifacts.verify()?;
        Ok(Some(artifacts))
    }

    async fn save(&self, artifacts: &Artifacts) -> Result<()> {
        artifacts.verify()?;

        let (generation, dir) = self.new_generation_dir(artifacts).await?;
        Self::write_json(&dir, ARTICLES_FILE, &artifacts.list).await?;
        Self::write_json(&dir, ARTICLES_BY_ID_FILE, &artifacts.by_id).await?;
        Self::write_json(&dir, STATS_FILE, &artifacts.stats).await?;

        self.swap_current(&generation).await?;
        tracing::info!("💾 Published generation {} under {}", generation, self.root.display());

        if let Err(e) = self.prune_generations(&generation).await {
            tracing::warn!("⚠️ Failed to prune old generations: {}", e);
        }
        Ok(())
    }
}
