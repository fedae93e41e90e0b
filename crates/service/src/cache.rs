//! Shared cache for course list pages.
//!
//! Writes never patch cached pages; they call [`CourseListCache::invalidate`].
//! A generation counter keeps a fill that started before an invalidation from
//! storing its now stale page.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use common::pagination::{Page, Pagination};
use moka::future::Cache;

use crate::catalog::domain::CourseView;
use crate::metrics::{COURSE_CACHE_HITS_TOTAL, COURSE_CACHE_MISSES_TOTAL};

pub type CoursePage = Arc<Page<CourseView>>;

pub struct CourseListCache {
    pages: Cache<Pagination, CoursePage>,
    generation: AtomicU64,
}

impl CourseListCache {
    pub fn new(ttl: Duration, max_entries: u64) -> Self {
        let pages = Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { pages, generation: AtomicU64::new(0) }
    }

    pub fn from_config(cfg: &configs::CacheConfig) -> Self {
        Self::new(Duration::from_secs(cfg.course_list_ttl_secs), cfg.max_entries)
    }

    pub async fn get(&self, key: &Pagination) -> Option<CoursePage> {
        let hit = self.pages.get(key).await;
        if hit.is_some() {
            COURSE_CACHE_HITS_TOTAL.inc();
        } else {
            COURSE_CACHE_MISSES_TOTAL.inc();
        }
        hit
    }

    /// Read before loading from storage, then hand back to [`Self::insert_if_current`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store the page unless an invalidation happened since `generation` was read.
    pub async fn insert_if_current(&self, key: Pagination, page: CoursePage, generation: u64) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.pages.insert(key, page).await;
        true
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.pages.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(count: u64) -> CoursePage {
        Arc::new(Page::new(count, Pagination::default(), Vec::new()))
    }

    #[tokio::test]
    async fn stores_and_returns_pages() {
        let cache = CourseListCache::new(Duration::from_secs(60), 10);
        let key = Pagination::default();
        assert!(cache.get(&key).await.is_none());
        let generation = cache.generation();
        assert!(cache.insert_if_current(key, page(3), generation).await);
        assert_eq!(cache.get(&key).await.map(|p| p.count), Some(3));
    }

    #[tokio::test]
    async fn invalidate_drops_pages_and_rejects_stale_fills() {
        let cache = CourseListCache::new(Duration::from_secs(60), 10);
        let key = Pagination::default();
        let before = cache.generation();
        cache.insert_if_current(key, page(1), before).await;
        cache.invalidate();
        assert!(cache.get(&key).await.is_none());
        assert!(!cache.insert_if_current(key, page(1), before).await);
        assert!(cache.get(&key).await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = CourseListCache::new(Duration::from_millis(50), 10);
        let key = Pagination::default();
        cache.insert_if_current(key, page(1), cache.generation()).await;
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(cache.get(&key).await.is_none());
    }
}
