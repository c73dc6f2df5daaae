//! 翻译模块
//!
//! 采用清晰的模块化架构：
//! - **core**: 补全能力、翻译客户端和页面编排器
//! - **pipeline**: 遮罩编解码、单元收集、分块和译文校验
//! - **storage**: 元素翻译状态存储
//! - **config**: 配置管理
//! - **commands**: 宿主命令分派
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use pagelingo::core::PageDocument;
//! use pagelingo::translation::{ConfigManager, PageTranslator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::new()?.into_config();
//! let translator = PageTranslator::from_config(&config)?;
//!
//! let document = PageDocument::parse("<p>Hello <b>world</b>!</p>")?;
//! let report = translator.translate_page(&document.body()?).await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
pub mod storage;

// 重新导出主要类型
pub use commands::{dispatch, HostCommand, HostResponse};
pub use config::{ConfigManager, TranslationConfig};
pub use core::{
    CompletionParams, CompletionProvider, LmStudioProvider, PageState, PageTranslator,
    ProgressReporter, RunReport, TranslationClient, TranslationStatus,
};
pub use error::{ErrorCategory, ErrorSeverity, TranslationError, TranslationResult};
pub use pipeline::{Chunk, OutputValidator, PlaceholderMap, TranslationUnit};
pub use storage::{AttributeStore, ElementState, MemoryStateStore, StateStore};
