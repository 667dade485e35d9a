//! Generation Context - 音乐循环生成限界上下文
//!
//! 职责:
//! - 由氛围描述构造生成请求
//! - 计算内容寻址的缓存 key
//! - 描述外部生成服务（静态配置）

mod errors;
mod value_objects;

pub use errors::DomainError;
pub use value_objects::{
    CacheKey, GenerationParams, GenerationRequest, ProviderCredentials, ProviderDescriptor,
    ProviderKind, AMBIANCE_PLACEHOLDER,
};
