//! File Persistence - 文件系统实现

mod audio_cache;

pub use audio_cache::{FileAudioCache, FileCacheConfig};
