//! File-based TTL Audio Cache Implementation
//!
//! 每个 key 一个文件 `<key>.wav`，内容为原始音频字节；
//! 文件修改时间即写入时间，用于 TTL 判断，不保存额外元数据

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{AudioCachePort, CacheEntry, CacheError, CacheStats};
use crate::domain::CacheKey;

const ENTRY_EXTENSION: &str = "wav";

/// 文件缓存配置
#[derive(Debug, Clone)]
pub struct FileCacheConfig {
    /// 缓存目录
    pub dir: PathBuf,
    /// 条目有效期
    pub ttl: Duration,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("cache/audio"),
            ttl: Duration::from_secs(3600),
        }
    }
}

/// 文件音频缓存
///
/// 读写不加锁：同 key 的并发写入内容等价，写入走临时文件 + rename
pub struct FileAudioCache {
    dir: PathBuf,
    ttl: Duration,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
    expired_count: AtomicU64,
    write_failures: AtomicU64,
}

impl FileAudioCache {
    /// 创建缓存，确保目录存在
    pub async fn new(config: &FileCacheConfig) -> Result<Self, CacheError> {
        fs::create_dir_all(&config.dir).await?;

        tracing::info!(
            dir = %config.dir.display(),
            ttl_secs = config.ttl.as_secs(),
            "FileAudioCache initialized"
        );

        Ok(Self {
            dir: config.dir.clone(),
            ttl: config.ttl,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 条目文件路径
    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.{}", key, ENTRY_EXTENSION))
    }

    fn miss(&self) -> Option<CacheEntry> {
        self.miss_count.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn write_entry(&self, key: &CacheKey, audio_data: &[u8]) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.entry_path(key);
        let tmp_path = self
            .dir
            .join(format!("{}.{}.{}.tmp", key, ENTRY_EXTENSION, Uuid::new_v4().simple()));

        if let Err(e) = fs::write(&tmp_path, audio_data).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        Ok(())
    }
}

#[async_trait]
impl AudioCachePort for FileAudioCache {
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);

        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return self.miss(),
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Error reading cache metadata");
                return self.miss();
            }
        };

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Cache entry has no modification time");
                return self.miss();
            }
        };

        // mtime 在未来时按刚写入处理
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);
        if age > self.ttl {
            tracing::debug!(cache_key = %key, age_secs = age.as_secs(), "Cache expired");
            if let Err(e) = fs::remove_file(&path).await {
                if e.kind() != ErrorKind::NotFound {
                    tracing::warn!(cache_key = %key, error = %e, "Failed to remove expired cache entry");
                }
            }
            self.expired_count.fetch_add(1, Ordering::Relaxed);
            return self.miss();
        }

        match fs::read(&path).await {
            Ok(audio_data) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(cache_key = %key, size_bytes = audio_data.len(), "Cache hit");
                Some(CacheEntry {
                    key: key.clone(),
                    audio_data,
                    stored_at: DateTime::<Utc>::from(modified),
                })
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Error reading cache file");
                self.miss()
            }
        }
    }

    async fn put(&self, key: &CacheKey, audio_data: &[u8]) -> Result<(), CacheError> {
        match self.write_entry(key, audio_data).await {
            Ok(()) => {
                tracing::debug!(
                    cache_key = %key,
                    size_bytes = audio_data.len(),
                    "Saved audio to cache"
                );
                Ok(())
            }
            Err(e) => {
                self.write_failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    async fn stats(&self) -> CacheStats {
        let mut total_entries = 0;
        let mut total_size_bytes = 0;

        match fs::read_dir(&self.dir).await {
            Ok(mut entries) => {
                while let Ok(Some(entry)) = entries.next_entry().await {
                    let path = entry.path();
                    if path.extension().and_then(|ext| ext.to_str()) != Some(ENTRY_EXTENSION) {
                        continue;
                    }
                    // 只统计文件名是合法 key 的条目
                    let is_entry = path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .and_then(CacheKey::parse)
                        .is_some();
                    if !is_entry {
                        continue;
                    }
                    if let Ok(metadata) = entry.metadata().await {
                        if metadata.is_file() {
                            total_entries += 1;
                            total_size_bytes += metadata.len();
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "Failed to scan cache directory");
            }
        }

        CacheStats {
            total_entries,
            total_size_bytes,
            ttl_secs: self.ttl.as_secs(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
            expired_count: self.expired_count.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}
