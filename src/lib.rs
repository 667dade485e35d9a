//! Ambiloop - 多服务容错的氛围循环音频生成
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Generation Context: 生成请求、缓存 key、服务描述
//!
//! 应用层 (application/):
//! - Ports: 端口定义（MusicProvider, AudioCache）
//! - Orchestrator: 缓存 → 按优先级回退，限流重试、并发限制、同 key 请求合并
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Persistence: 文件 TTL 缓存
//! - Adapters: Suno / Udio / Stable Audio 客户端

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
