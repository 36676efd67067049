use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::chain::ChainState;

/// Borsh snapshot of the chain state inside the data directory.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(data_directory: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_directory).context("creating data directory")?;
        Ok(Self {
            path: data_directory.join("chain_state.bin"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_from_disk_or_default(&self) -> ChainState {
        match std::fs::read(&self.path) {
            Ok(bytes) => match borsh::from_slice::<ChainState>(&bytes) {
                Ok(state) => {
                    info!(
                        "Loaded chain state at height {} from {}",
                        state.block_height(),
                        self.path.display()
                    );
                    state
                }
                Err(e) => {
                    warn!("Could not decode {}: {e}, starting fresh", self.path.display());
                    ChainState::default()
                }
            },
            Err(_) => {
                info!("No chain state at {}, starting fresh", self.path.display());
                ChainState::default()
            }
        }
    }

    /// Writes to a temporary file first so a crash never leaves a torn file.
    pub async fn save_on_disk(&self, state: &ChainState) -> Result<()> {
        let bytes = borsh::to_vec(state).context("encoding chain state")?;
        let tmp = self.path.with_extension("bin.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("renaming {}", tmp.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_or_corrupt_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(dir.path()).unwrap();
        assert_eq!(store.load_from_disk_or_default().block_height(), 0);

        std::fs::write(store.path(), b"not borsh").unwrap();
        assert_eq!(store.load_from_disk_or_default().block_height(), 0);
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::new(&dir.path().join("nested")).unwrap();
        store.save_on_disk(&ChainState::default()).await.unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load_from_disk_or_default().block_height(), 0);
    }
}
