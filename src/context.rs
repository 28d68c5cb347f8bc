//! Opt-in concurrency and shared-resource infrastructure. The teacher's
//! `Document::load` path is fully buffered and single-threaded and needs
//! none of this; a `Context` only matters to callers sharing caches or
//! wanting cooperative cancellation across documents.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, Weak};

use indexmap::IndexMap;
use log::warn;

use crate::device::ColorSpace;
use crate::font::FontData;

/// Named lock slots, numbered so acquisition order can be checked in debug
/// builds. Locks must be taken in strictly increasing numeric order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LockSlot {
    Alloc = 0,
    File = 1,
    Font = 2,
    GlyphCache = 3,
    Store = 4,
}

thread_local! {
    static LOCK_WATERMARK: Cell<u8> = const { Cell::new(0) };
}

/// The table of named mutexes a `Context` hands out. Each slot guards
/// exactly the piece of shared state its name implies; callers take the
/// narrowest slot that covers what they touch, for the shortest window.
#[derive(Debug, Default)]
pub struct LockTable {
    alloc: Mutex<()>,
    file: Mutex<()>,
    font: Mutex<()>,
    glyph_cache: Mutex<()>,
    store: Mutex<()>,
}

impl LockTable {
    pub fn new() -> LockTable {
        LockTable::default()
    }

    fn slot(&self, slot: LockSlot) -> &Mutex<()> {
        match slot {
            LockSlot::Alloc => &self.alloc,
            LockSlot::File => &self.file,
            LockSlot::Font => &self.font,
            LockSlot::GlyphCache => &self.glyph_cache,
            LockSlot::Store => &self.store,
        }
    }

    /// Acquire `slot`. Debug builds assert the calling thread's
    /// high-water mark never decreases, catching lock-order violations
    /// before they can deadlock in release.
    pub fn acquire(&self, slot: LockSlot) -> MutexGuard<'_, ()> {
        let ordinal = slot as u8;
        LOCK_WATERMARK.with(|mark| {
            debug_assert!(
                ordinal >= mark.get(),
                "lock-order violation: acquired slot {ordinal} after slot {}",
                mark.get()
            );
            mark.set(ordinal);
        });
        self.slot(slot).lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reset this thread's watermark, e.g. once all locks taken for one
    /// operation have been released.
    pub fn reset_watermark(&self) {
        LOCK_WATERMARK.with(|mark| mark.set(0));
    }
}

/// An entry kept alive in the store only as long as something else still
/// holds the strong `Arc`; the store's own reference is weak.
struct StoreEntry<T> {
    handle: Weak<T>,
    cost: usize,
}

/// Size-bounded LRU cache keyed by `Weak` handles. Insertion may evict
/// less-recently-used entries to stay within `budget` bytes; eviction and
/// scavenging both run under the `Store`/`Alloc` locks.
pub struct ResourceStore<T> {
    entries: IndexMap<u64, StoreEntry<T>>,
    used: usize,
    budget: usize,
    next_key: u64,
}

impl<T> ResourceStore<T> {
    pub fn new(budget: usize) -> ResourceStore<T> {
        ResourceStore {
            entries: IndexMap::new(),
            used: 0,
            budget,
            next_key: 0,
        }
    }

    /// Insert a weakly-held resource costing `cost` bytes, evicting the
    /// least-recently-used entries first until it fits the budget.
    pub fn insert(&mut self, handle: Weak<T>, cost: usize) -> u64 {
        while self.used + cost > self.budget && !self.entries.is_empty() {
            let (_, evicted) = self.entries.shift_remove_index(0).expect("non-empty");
            self.used = self.used.saturating_sub(evicted.cost);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.entries.insert(key, StoreEntry { handle, cost });
        self.used += cost;
        key
    }

    /// Look a resource up, marking it most-recently-used, and drop it from
    /// the store if its strong owner is already gone.
    pub fn get(&mut self, key: u64) -> Option<Weak<T>> {
        let entry = self.entries.get(&key)?;
        if entry.handle.strong_count() == 0 {
            let cost = entry.cost;
            self.entries.shift_remove(&key);
            self.used = self.used.saturating_sub(cost);
            return None;
        }
        let (_, entry) = self.entries.shift_remove_entry(&key)?;
        let handle = entry.handle.clone();
        self.entries.insert(key, entry);
        Some(handle)
    }

    pub fn used(&self) -> usize {
        self.used
    }

    /// Run on allocation pressure: phase 0 drops entries whose handle is
    /// already dangling (clean), phase 1 drops anything at all, oldest
    /// first. Returns bytes freed.
    pub fn scavenge(&mut self, phase: u32) -> usize {
        let before = self.used;
        match phase {
            0 => {
                self.entries.retain(|_, entry| {
                    let keep = entry.handle.strong_count() > 0;
                    if !keep {
                        self.used = self.used.saturating_sub(entry.cost);
                    }
                    keep
                });
            }
            _ => {
                self.entries.clear();
                self.used = 0;
            }
        }
        before - self.used
    }
}

/// Cooperative-cancellation token polled by the content-stream interpreter
/// between top-level operators. Setting `abort` stops the run early but
/// leaves whatever was already issued to the device valid.
#[derive(Debug, Default)]
pub struct Cookie {
    abort: AtomicBool,
    errors: AtomicU32,
    incomplete: AtomicBool,
}

impl Cookie {
    pub fn new() -> Cookie {
        Cookie::default()
    }

    pub fn abort(&self) {
        self.abort.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::SeqCst)
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }

    pub fn error_count(&self) -> u32 {
        self.errors.load(Ordering::SeqCst)
    }

    pub fn mark_incomplete(&self) {
        self.incomplete.store(true, Ordering::SeqCst);
    }

    pub fn is_incomplete(&self) -> bool {
        self.incomplete.load(Ordering::SeqCst)
    }
}

/// Ambient color-management defaults a `Context` hands new interpreters,
/// absent any page-level override.
#[derive(Debug, Clone)]
pub struct ColorDefaults {
    pub fill_colorspace: ColorSpace,
    pub stroke_colorspace: ColorSpace,
}

impl Default for ColorDefaults {
    fn default() -> Self {
        ColorDefaults {
            fill_colorspace: ColorSpace::DeviceGray,
            stroke_colorspace: ColorSpace::DeviceGray,
        }
    }
}

/// A sink for non-fatal warnings, defaulting to the `log` crate.
pub trait WarningSink: Send + Sync {
    fn warn(&self, message: &str);
}

struct LogWarningSink;

impl WarningSink for LogWarningSink {
    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

/// Shared state an application opts into when it wants cancellation or
/// caches shared across documents. A single-threaded caller using
/// `Document::load` directly never needs one.
pub struct Context {
    pub locks: LockTable,
    warning_sink: Box<dyn WarningSink>,
    font_cache: Mutex<ResourceStore<FontData>>,
    glyph_cache: Mutex<ResourceStore<Vec<u8>>>,
    resources: Mutex<ResourceStore<Vec<u8>>>,
    pub color_defaults: ColorDefaults,
}

/// Default budgets, in bytes, for the font and glyph caches and the
/// general-purpose resource store. Generous enough for a handful of
/// embedded fonts and their rasterized glyphs without tuning.
const DEFAULT_FONT_CACHE_BUDGET: usize = 4 * 1024 * 1024;
const DEFAULT_GLYPH_CACHE_BUDGET: usize = 8 * 1024 * 1024;
const DEFAULT_RESOURCE_STORE_BUDGET: usize = 16 * 1024 * 1024;

impl Context {
    pub fn new() -> Context {
        Context {
            locks: LockTable::new(),
            warning_sink: Box::new(LogWarningSink),
            font_cache: Mutex::new(ResourceStore::new(DEFAULT_FONT_CACHE_BUDGET)),
            glyph_cache: Mutex::new(ResourceStore::new(DEFAULT_GLYPH_CACHE_BUDGET)),
            resources: Mutex::new(ResourceStore::new(DEFAULT_RESOURCE_STORE_BUDGET)),
            color_defaults: ColorDefaults::default(),
        }
    }

    pub fn with_warning_sink(sink: Box<dyn WarningSink>) -> Context {
        Context {
            warning_sink: sink,
            ..Context::new()
        }
    }

    pub fn warn(&self, message: &str) {
        self.warning_sink.warn(message);
    }

    /// Cache a parsed font, guarded by `LockSlot::Font`. Returns the key to
    /// look it back up with.
    pub fn cache_font(&self, font: Weak<FontData>, cost: usize) -> u64 {
        let _guard = self.locks.acquire(LockSlot::Font);
        self.font_cache.lock().unwrap_or_else(|p| p.into_inner()).insert(font, cost)
    }

    pub fn lookup_font(&self, key: u64) -> Option<Weak<FontData>> {
        let _guard = self.locks.acquire(LockSlot::Font);
        self.font_cache.lock().unwrap_or_else(|p| p.into_inner()).get(key)
    }

    /// Cache a rasterized glyph, guarded by `LockSlot::GlyphCache`.
    pub fn cache_glyph(&self, glyph: Weak<Vec<u8>>, cost: usize) -> u64 {
        let _guard = self.locks.acquire(LockSlot::GlyphCache);
        self.glyph_cache.lock().unwrap_or_else(|p| p.into_inner()).insert(glyph, cost)
    }

    pub fn lookup_glyph(&self, key: u64) -> Option<Weak<Vec<u8>>> {
        let _guard = self.locks.acquire(LockSlot::GlyphCache);
        self.glyph_cache.lock().unwrap_or_else(|p| p.into_inner()).get(key)
    }

    /// General-purpose resource store (decoded images, decoded streams, …),
    /// guarded by `LockSlot::Store`.
    pub fn cache_resource(&self, resource: Weak<Vec<u8>>, cost: usize) -> u64 {
        let _guard = self.locks.acquire(LockSlot::Store);
        self.resources.lock().unwrap_or_else(|p| p.into_inner()).insert(resource, cost)
    }

    pub fn lookup_resource(&self, key: u64) -> Option<Weak<Vec<u8>>> {
        let _guard = self.locks.acquire(LockSlot::Store);
        self.resources.lock().unwrap_or_else(|p| p.into_inner()).get(key)
    }

    /// Run eviction on all three caches under allocation pressure. Phase 0
    /// drops only dangling entries; phase 1 drops everything.
    pub fn scavenge(&self, phase: u32) -> usize {
        let _alloc = self.locks.acquire(LockSlot::Alloc);
        let mut freed = 0;
        freed += self.font_cache.lock().unwrap_or_else(|p| p.into_inner()).scavenge(phase);
        freed += self.glyph_cache.lock().unwrap_or_else(|p| p.into_inner()).scavenge(phase);
        freed += self.resources.lock().unwrap_or_else(|p| p.into_inner()).scavenge(phase);
        freed
    }
}

impl Default for Context {
    fn default() -> Self {
        Context::new()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").field("locks", &self.locks).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn lock_table_allows_increasing_order() {
        let locks = LockTable::new();
        let _a = locks.acquire(LockSlot::Alloc);
        drop(_a);
        let _f = locks.acquire(LockSlot::File);
        drop(_f);
        locks.reset_watermark();
        let _a2 = locks.acquire(LockSlot::Alloc);
    }

    #[test]
    fn resource_store_evicts_to_budget() {
        let mut store: ResourceStore<Vec<u8>> = ResourceStore::new(10);
        let a = Arc::new(vec![0_u8; 4]);
        let b = Arc::new(vec![0_u8; 4]);
        let c = Arc::new(vec![0_u8; 4]);
        store.insert(Arc::downgrade(&a), 4);
        store.insert(Arc::downgrade(&b), 4);
        store.insert(Arc::downgrade(&c), 4);
        assert!(store.used() <= 10);
    }

    #[test]
    fn cookie_aborts_and_counts_errors() {
        let cookie = Cookie::new();
        assert!(!cookie.is_aborted());
        cookie.abort();
        cookie.record_error();
        cookie.record_error();
        assert!(cookie.is_aborted());
        assert_eq!(cookie.error_count(), 2);
    }
}
