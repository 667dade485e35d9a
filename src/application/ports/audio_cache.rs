//! Audio Cache Port - 生成音频缓存
//!
//! 定义内容寻址音频缓存的抽象接口，具体实现为每个 key 一个文件的目录缓存

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::CacheKey;

/// Audio Cache 错误
///
/// 只出现在写入路径，读取失败一律按未命中处理
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        CacheError::IoError(err.to_string())
    }
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub audio_data: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

/// 缓存统计信息
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub ttl_secs: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub expired_count: u64,
    pub write_failures: u64,
}

/// Audio Cache Port
///
/// 基于 CacheKey 的 TTL 缓存，过期条目在下一次 get 时惰性删除
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 获取未过期的条目
    ///
    /// 不存在、无法读取、已过期都返回 None；过期条目会被删除
    async fn get(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// 存储音频数据，覆盖已有条目
    async fn put(&self, key: &CacheKey, audio_data: &[u8]) -> Result<(), CacheError>;

    /// 获取缓存统计信息
    async fn stats(&self) -> CacheStats;
}
