//! Typed read cache for the menu and category lists.

use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use metrics::counter;
use tracing::debug;

use crate::domain::entities::{MenuCategoryRecord, MenuItemRecord};

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const MENU_SLOT: &str = "menu";
const CATEGORIES_SLOT: &str = "categories";

/// Snapshot of the invalidation counter taken before a database read.
///
/// A value computed under one generation is only stored if no write
/// invalidated the cache in the meantime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

struct Entry<T> {
    value: T,
    expires_at: Option<Instant>,
}

impl<T> Entry<T> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

struct TtlSlot<T> {
    name: &'static str,
    entry: RwLock<Option<Entry<T>>>,
}

impl<T: Clone> TtlSlot<T> {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            entry: RwLock::new(None),
        }
    }

    fn get_at(&self, now: Instant) -> Option<T> {
        let guard = rw_read(&self.entry, self.name, "get");
        let hit = guard
            .as_ref()
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone());

        let outcome = if hit.is_some() { "hit" } else { "miss" };
        counter!("cafe_cache_lookup_total", "slot" => self.name, "outcome" => outcome)
            .increment(1);
        hit
    }

    fn set_at(&self, value: T, now: Instant, ttl: Duration, allowed: impl FnOnce() -> bool) {
        let mut guard = rw_write(&self.entry, self.name, "set");
        if !allowed() {
            debug!(slot = self.name, "Skipped cache fill after concurrent invalidation");
            return;
        }
        *guard = Some(Entry {
            value,
            expires_at: now.checked_add(ttl),
        });
    }

    fn clear(&self) {
        *rw_write(&self.entry, self.name, "clear") = None;
    }

    fn purge_at(&self, now: Instant) -> bool {
        let mut guard = rw_write(&self.entry, self.name, "purge");
        if guard.as_ref().is_some_and(|entry| !entry.is_live(now)) {
            *guard = None;
            return true;
        }
        false
    }
}

/// Process-local cache with one slot per hot list.
///
/// Never the source of truth: every slot can be dropped at any time.
pub struct ReadCache {
    config: CacheConfig,
    generation: AtomicU64,
    menu: TtlSlot<Vec<MenuItemRecord>>,
    categories: TtlSlot<Vec<MenuCategoryRecord>>,
}

impl ReadCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            generation: AtomicU64::new(0),
            menu: TtlSlot::new(MENU_SLOT),
            categories: TtlSlot::new(CATEGORIES_SLOT),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::SeqCst))
    }

    pub fn menu(&self) -> Option<Vec<MenuItemRecord>> {
        self.menu_at(Instant::now())
    }

    pub fn set_menu(&self, items: Vec<MenuItemRecord>, observed: Generation) {
        self.set_menu_at(items, observed, Instant::now());
    }

    pub fn categories(&self) -> Option<Vec<MenuCategoryRecord>> {
        self.categories_at(Instant::now())
    }

    pub fn set_categories(&self, categories: Vec<MenuCategoryRecord>, observed: Generation) {
        self.set_categories_at(categories, observed, Instant::now());
    }

    /// Evict both slots. Called after every menu or category write.
    pub fn invalidate_menu_and_categories(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.menu.clear();
        self.categories.clear();
        counter!("cafe_cache_invalidation_total").increment(1);
    }

    /// Drop slots whose TTL has elapsed. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub(crate) fn menu_at(&self, now: Instant) -> Option<Vec<MenuItemRecord>> {
        if !self.config.enabled {
            return None;
        }
        self.menu.get_at(now)
    }

    pub(crate) fn set_menu_at(
        &self,
        items: Vec<MenuItemRecord>,
        observed: Generation,
        now: Instant,
    ) {
        if !self.config.enabled {
            return;
        }
        self.menu
            .set_at(items, now, self.config.ttl, || self.generation() == observed);
    }

    pub(crate) fn categories_at(&self, now: Instant) -> Option<Vec<MenuCategoryRecord>> {
        if !self.config.enabled {
            return None;
        }
        self.categories.get_at(now)
    }

    pub(crate) fn set_categories_at(
        &self,
        categories: Vec<MenuCategoryRecord>,
        observed: Generation,
        now: Instant,
    ) {
        if !self.config.enabled {
            return;
        }
        self.categories
            .set_at(categories, now, self.config.ttl, || {
                self.generation() == observed
            });
    }

    #[cfg(test)]
    pub(crate) fn populated_slots(&self) -> usize {
        usize::from(rw_read(&self.menu.entry, MENU_SLOT, "inspect").is_some())
            + usize::from(rw_read(&self.categories.entry, CATEGORIES_SLOT, "inspect").is_some())
    }

    pub(crate) fn purge_expired_at(&self, now: Instant) -> usize {
        [self.menu.purge_at(now), self.categories.purge_at(now)]
            .into_iter()
            .filter(|purged| *purged)
            .count()
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
