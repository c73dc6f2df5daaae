//! 翻译管道模块
//!
//! 遮罩编解码、翻译单元收集、分块和译文校验

pub mod batch;
pub mod collector;
pub mod filters;
pub mod masking;

// 重新导出主要类型
pub use batch::{chunk_units, Chunk, ChunkStats, Chunker, ChunkerConfig};
pub use collector::{extract, CollectionStats, CollectorConfig, TranslationUnit, UnitCollector};
pub use filters::{strip_placeholders, OutputValidator, TargetScript, ValidatorConfig};
pub use masking::{mask, unmask, MaskedFragment, Placeholder, PlaceholderKind, PlaceholderMap};
