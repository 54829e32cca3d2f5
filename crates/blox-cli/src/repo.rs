use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use blox_block::{BlockService, PinService};
use blox_lock::GcLock;
use blox_pin::InMemoryPinSet;
use blox_store::FsBlockStore;

use crate::config::NodeConfig;

const BLOCKS_DIR: &str = "blocks";
const PINS_FILE: &str = "pins.json";

/// An opened node repository: block store, pin set and the shared GC lock.
pub struct Repo {
    root: PathBuf,
    pub config: NodeConfig,
    pub store: Arc<FsBlockStore>,
    pub pins: Arc<InMemoryPinSet>,
    pub lock: GcLock,
}

impl Repo {
    /// Create the repository layout with a default config.
    pub async fn init(root: &Path) -> anyhow::Result<Self> {
        if root.join(crate::config::CONFIG_FILE).exists() {
            bail!("repository already initialized at {}", root.display());
        }
        std::fs::create_dir_all(root)
            .with_context(|| format!("creating {}", root.display()))?;
        NodeConfig::default().save(root)?;
        let repo = Self::open(root).await?;
        repo.save_pins()?;
        Ok(repo)
    }

    pub async fn open(root: &Path) -> anyhow::Result<Self> {
        if !root.is_dir() {
            bail!("no repository at {} (run `blox init`)", root.display());
        }
        let config = NodeConfig::load(root)?;
        let store = FsBlockStore::open(root.join(BLOCKS_DIR))
            .await
            .context("opening block store")?;
        let pins = InMemoryPinSet::load(root.join(PINS_FILE)).context("loading pin set")?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            store: Arc::new(store),
            pins: Arc::new(pins),
            lock: GcLock::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn blocks(&self) -> anyhow::Result<BlockService> {
        Ok(BlockService::new(
            self.store.clone(),
            self.pins.clone(),
            self.lock.clone(),
            self.config.block.clone(),
        )?)
    }

    pub fn pinning(&self) -> PinService {
        PinService::new(
            self.store.clone(),
            self.pins.clone(),
            self.lock.clone(),
            self.config.block.clone(),
        )
    }

    pub fn save_pins(&self) -> anyhow::Result<()> {
        self.pins
            .save(self.root.join(PINS_FILE))
            .context("saving pin set")
    }
}
