//! 翻译核心模块
//!
//! - **补全能力** (`provider.rs`): 不透明的 `complete(prompt) -> text` 能力及其 HTTP 实现
//! - **翻译客户端** (`client.rs`): 提示词格式化、单条与批量翻译
//! - **编排器** (`engine.rs`): 页面翻译流水线、回退与重试、可逆切换
//! - **进度提示** (`progress.rs`): 面向用户的进度消息
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use pagelingo::translation::{config::TranslationConfig, core::PageTranslator};
//!
//! let config = TranslationConfig::default_with_lang("ko", Some("http://localhost:1234"));
//! let translator = PageTranslator::from_config(&config)?;
//! let report = translator.translate_page(&body).await?;
//! println!("新增 {} 个译文", report.translated);
//! ```

pub mod client;
pub mod engine;
pub mod progress;
pub mod provider;

pub use client::{batch_prompt, single_prompt, split_batch_response, TranslationClient};
pub use engine::{EngineConfig, EngineStats, PageState, PageTranslator, RunReport, TranslationStatus};
pub use progress::{chunk_progress_message, LogReporter, ProgressReporter};
pub use provider::{CompletionParams, CompletionProvider, LmStudioProvider};
