//! HTTP Handlers

mod cache;
mod generate;
mod ping;

pub use cache::*;
pub use generate::*;
pub use ping::*;
