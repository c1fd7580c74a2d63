//! File system watcher for live rebuild.
//!
//! Monitors the content and template directories plus the config file.
//! Rapid event bursts coalesce in a short debounce window; when it
//! settles, a whole new [`Site`] is built and swapped into the server's
//! handle. A change arriving mid-rebuild waits for the next window, it
//! never aborts the build in progress.

use crate::build::build_site;
use crate::config::SiteConfig;
use crate::log;
use crate::logger::WatchStatus;
use crate::site::Site;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use notify::{Event, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::{Duration, Instant};

const DEBOUNCE_MS: u64 = 150;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Format path as relative for log display.
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Batches rapid file events within the debounce window.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        if !self.pending.is_empty() {
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

/// Watch for changes and rebuild, blocking forever.
///
/// A successful rebuild replaces the served site atomically; a failed
/// one leaves the previous good site in place and reports the error.
pub fn watch_for_changes_blocking(
    config: &'static SiteConfig,
    site: Arc<ArcSwap<Site>>,
) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut watcher =
        notify::recommended_watcher(move |result: notify::Result<Event>| {
            if let Ok(event) = result {
                tx.send(event).ok();
            }
        })
        .context("failed to create file watcher")?;

    let watch_dirs = [&config.build.content, &config.build.templates];
    for dir in watch_dirs {
        if dir.exists() {
            watcher
                .watch(dir, RecursiveMode::Recursive)
                .with_context(|| format!("failed to watch {}", dir.display()))?;
        }
    }
    if config.config_path.exists() {
        watcher
            .watch(&config.config_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", config.config_path.display()))?;
    }

    log!("watch"; "watching for changes...");
    let mut debouncer = Debouncer::new();
    let mut status = WatchStatus::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(event) => debouncer.add(event),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => return Ok(()),
        }

        if debouncer.ready() {
            let changed = debouncer.take();
            rebuild(config, &site, &changed, &mut status);
        }
    }
}

/// Build a fresh site and swap it in; keep the old one on failure.
fn rebuild(
    config: &'static SiteConfig,
    site: &ArcSwap<Site>,
    changed: &[PathBuf],
    status: &mut WatchStatus,
) {
    let root = config.get_root();
    let trigger = changed
        .iter()
        .map(|p| rel_path(p, root))
        .collect::<Vec<_>>()
        .join(", ");

    match build_site(config) {
        Ok(new_site) => {
            site.store(new_site);
            status.success(&format!("rebuilt ({trigger})"));
        }
        Err(err) => {
            status.error(&format!("rebuild failed ({trigger})"), &format!("{err:#}"));
        }
    }
}
