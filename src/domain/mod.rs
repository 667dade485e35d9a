//! Domain Layer - 领域层
//!
//! 包含一个限界上下文:
//! - Generation Context: 生成请求、缓存 key、服务描述

pub mod generation;

pub use generation::{
    CacheKey, DomainError, GenerationParams, GenerationRequest, ProviderCredentials,
    ProviderDescriptor, ProviderKind,
};
