//! # Pagelingo Library
//!
//! 借助本地语言模型补全接口翻译网页的可见文本，保留行内标记，并可随时恢复原文。
//!
//! ## 模块组织
//!
//! - `core` - 页面文档的读取、解析和序列化
//! - `env` - 类型化的环境变量
//! - `parsers` - HTML 解析、DOM 操作和标签分类
//! - `translation` - 遮罩编解码、翻译流水线和编排器
//! - `utils` - 工具（终端状态提示）

pub mod core;
pub mod env;
pub mod parsers;
pub mod translation;
pub mod utils;

// Re-export commonly used items for convenience
pub use core::{PageDocument, STDIO_PATH};
pub use parsers::{html_to_dom, serialize_document};
