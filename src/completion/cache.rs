//! 生成器结果缓存
//!
//! LRU 容量有界，每一项带独立的 TTL，读取时淘汰过期项

use crate::completion::types::Suggestion;
use crate::utils::error::AppResult;
use anyhow::anyhow;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// 缓存项
#[derive(Debug, Clone)]
struct CacheEntry {
    /// 生成器结果
    items: Vec<Suggestion>,
    /// 创建时间
    created_at: Instant,
    /// 过期时间
    ttl: Duration,
}

impl CacheEntry {
    fn new(items: Vec<Suggestion>, ttl: Duration) -> Self {
        Self {
            items,
            created_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.created_at.elapsed() >= self.ttl
    }
}

/// 生成器缓存
pub struct GeneratorCache {
    cache: Mutex<LruCache<String, CacheEntry>>,
    default_ttl: Duration,
}

impl GeneratorCache {
    /// 创建新的生成器缓存
    pub fn new(capacity: usize, default_ttl: Duration) -> AppResult<Self> {
        let capacity =
            NonZeroUsize::new(capacity).ok_or_else(|| anyhow!("缓存错误: 缓存容量不能为0"))?;

        Ok(Self {
            cache: Mutex::new(LruCache::new(capacity)),
            default_ttl,
        })
    }

    /// 默认 TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// 获取未过期的缓存项
    pub fn get(&self, key: &str) -> Option<Vec<Suggestion>> {
        let mut cache = self.cache.lock();

        if let Some(entry) = cache.get(key) {
            if !entry.is_expired() {
                return Some(entry.items.clone());
            }
            cache.pop(key);
        }

        None
    }

    /// 以默认 TTL 存储
    pub fn put(&self, key: impl Into<String>, items: Vec<Suggestion>) {
        self.put_with_ttl(key, items, self.default_ttl);
    }

    /// 以指定 TTL 存储
    pub fn put_with_ttl(&self, key: impl Into<String>, items: Vec<Suggestion>, ttl: Duration) {
        self.cache.lock().put(key.into(), CacheEntry::new(items, ttl));
    }

    /// 清除所有缓存
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// 清除过期缓存，返回移除数量
    pub fn cleanup_expired(&self) -> usize {
        let mut cache = self.cache.lock();

        let expired_keys: Vec<String> = cache
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            cache.pop(key);
        }

        expired_keys.len()
    }

    /// 获取缓存统计信息
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();

        CacheStats {
            total_entries: cache.len(),
            capacity: cache.cap().get(),
            expired_entries: cache.iter().filter(|(_, entry)| entry.is_expired()).count(),
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// 总条目数
    pub total_entries: usize,
    /// 缓存容量
    pub capacity: usize,
    /// 过期条目数
    pub expired_entries: usize,
}
