//! 存储模块
//!
//! 保存每个元素的翻译状态、原始标记和译文标记，支撑恢复与切换。

pub mod state;

pub use state::{
    AttributeStore, ElementRecord, ElementState, MemoryStateStore, StateStore, ORIGINAL_ATTR,
    STATE_ATTR, TRANSLATED_ATTR,
};
