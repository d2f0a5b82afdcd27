//! Local photo library backed by a JSON manifest.
//!
//! `manifest.json` in the library root lists the known photos. Records use the
//! snake-case wire shape (`profile_url`) and are converted to [`Item`] here,
//! with `url` resolved to the absolute file path.

use std::collections::{HashSet, VecDeque};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::engine::advance::LOW_WATER_MARK;
use crate::item::Item;
use crate::ports::{Pool, Source};

pub const MANIFEST_FILE: &str = "manifest.json";

const UNKNOWN_PHOTOGRAPHER: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub photographer: String,
    pub profile_url: String,
    /// Path relative to the library root.
    pub filename: String,
}

impl ManifestEntry {
    fn resolve(self, root: &Path) -> Option<Item> {
        let path = root.join(&self.filename);
        if !path.is_file() {
            debug!(id = %self.id, path = %path.display(), "manifest entry missing on disk; skipping");
            return None;
        }
        match Item::new(
            self.id,
            path.to_string_lossy(),
            self.photographer,
            self.profile_url,
        ) {
            Ok(item) => Some(item),
            Err(err) => {
                warn!("skipping manifest entry: {err:#}");
                None
            }
        }
    }
}

pub struct ManifestLibrary {
    root: PathBuf,
    capacity: usize,
    batch: usize,
    io: tokio::sync::Mutex<()>,
    deck: Mutex<Deck>,
}

impl ManifestLibrary {
    pub fn new(root: impl Into<PathBuf>, capacity: usize, batch: usize, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            root: root.into(),
            capacity,
            batch,
            io: tokio::sync::Mutex::new(()),
            deck: Mutex::new(Deck::new(rng)),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Tells the dealer which items were queued outside of `fetch_items`
    /// (e.g. the startup load) so its next batch does not repeat their tail.
    pub fn note_queued<'a>(&self, items: impl IntoIterator<Item = &'a Item>) {
        let mut deck = self.deck.lock().unwrap_or_else(PoisonError::into_inner);
        for item in items {
            deck.remember(&item.id);
        }
    }
}

#[async_trait]
impl Pool for ManifestLibrary {
    async fn stored_items(&self) -> Result<Vec<Item>> {
        let _guard = self.io.lock().await;
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Item>> {
            let entries = read_manifest(&root)?;
            Ok(entries
                .into_iter()
                .filter_map(|entry| entry.resolve(&root))
                .collect())
        })
        .await
        .context("manifest reader panicked")?
    }

    async fn fetch_and_store(&self) -> Result<Vec<Item>> {
        let _guard = self.io.lock().await;
        let root = self.root.clone();
        let capacity = self.capacity;
        tokio::task::spawn_blocking(move || store_new_photos(&root, capacity))
            .await
            .context("manifest writer panicked")?
    }
}

#[async_trait]
impl Source for ManifestLibrary {
    async fn fetch_items(&self) -> Result<Vec<Item>> {
        let stored = self.stored_items().await?;
        let mut deck = self.deck.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(deck.deal(&stored, self.batch))
    }
}

/// Shuffled deck of stored items, dealt a batch at a time.
struct Deck {
    rng: StdRng,
    cards: Vec<Item>,
    /// Most recently queued ids; may still be on screen or in the queue tail.
    recent: VecDeque<String>,
}

impl Deck {
    fn new(rng: StdRng) -> Self {
        Self {
            rng,
            cards: Vec::new(),
            recent: VecDeque::with_capacity(LOW_WATER_MARK + 1),
        }
    }

    fn remember(&mut self, id: &str) {
        self.recent.retain(|r| r != id);
        self.recent.push_back(id.to_string());
        while self.recent.len() > LOW_WATER_MARK {
            self.recent.pop_front();
        }
    }

    fn deal(&mut self, stored: &[Item], batch: usize) -> Vec<Item> {
        let available: HashSet<&str> = stored.iter().map(|p| p.id.as_str()).collect();
        self.cards.retain(|c| available.contains(c.id.as_str()));

        let mut hand: Vec<Item> = Vec::with_capacity(batch);
        let mut reshuffled = false;
        while hand.len() < batch {
            if let Some(card) = self.cards.pop() {
                hand.push(card);
                continue;
            }
            if reshuffled {
                break;
            }
            reshuffled = true;
            let mut fresh: Vec<Item> = stored
                .iter()
                .filter(|p| !hand.iter().any(|h| h.id == p.id))
                .filter(|p| !self.recent.contains(&p.id))
                .cloned()
                .collect();
            if fresh.is_empty() && hand.is_empty() {
                // Pool too small to avoid repeats; better a repeat than a stall.
                fresh = stored.to_vec();
            }
            fresh.shuffle(&mut self.rng);
            self.cards = fresh;
        }

        for item in &hand {
            self.remember(&item.id);
        }
        hand
    }
}

pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Missing manifest means an empty library; an unreadable one is logged and
/// treated the same way.
pub fn read_manifest(root: &Path) -> Result<Vec<ManifestEntry>> {
    let path = manifest_path(root);
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    match serde_json::from_slice(&data) {
        Ok(entries) => Ok(entries),
        Err(err) => {
            warn!(path = %path.display(), "ignoring unparsable manifest: {err}");
            Ok(Vec::new())
        }
    }
}

pub fn write_manifest(root: &Path, entries: &[ManifestEntry]) -> Result<()> {
    fs::create_dir_all(root)
        .with_context(|| format!("failed to create library dir at {}", root.display()))?;
    let path = manifest_path(root);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(entries)?;
    fs::write(&tmp, json).with_context(|| format!("failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

/// Adds unlisted images under `root` to the manifest, up to `capacity`
/// entries in total, and returns the newly listed items.
fn store_new_photos(root: &Path, capacity: usize) -> Result<Vec<Item>> {
    let mut entries = read_manifest(root)?;
    if entries.len() >= capacity {
        debug!(entries = entries.len(), capacity, "library full; nothing to add");
        return Ok(Vec::new());
    }

    let known: HashSet<String> = entries.iter().map(|e| e.filename.clone()).collect();
    let mut added = Vec::new();
    for path in discover_images(root) {
        if entries.len() >= capacity {
            break;
        }
        let Some(filename) = relative_name(root, &path) else {
            continue;
        };
        if known.contains(&filename) {
            continue;
        }
        let entry = ManifestEntry {
            id: filename.clone(),
            photographer: UNKNOWN_PHOTOGRAPHER.to_string(),
            profile_url: String::new(),
            filename,
        };
        if let Some(item) = entry.clone().resolve(root) {
            debug!(id = %item.id, "library: add");
            entries.push(entry);
            added.push(item);
        }
    }

    if !added.is_empty() {
        write_manifest(root, &entries)?;
        info!(added = added.len(), total = entries.len(), "manifest updated");
    }
    Ok(added)
}

fn discover_images(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_image(p))
        .collect();
    found.sort();
    found
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel.iter().map(OsStr::to_str).collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[inline]
fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if ["jpg", "jpeg", "png", "webp"].contains(&e.as_str())
    )
}
