//! # 解析器模块
//!
//! 页面文档的解析、DOM 操作和序列化。
//!
//! - `html` - HTML文档解析、DOM操作、标签分类、序列化

pub mod html;

pub use html::{html_to_dom, serialize_document};
