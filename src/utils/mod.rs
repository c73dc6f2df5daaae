//! # 工具模块
//!
//! - `toast` - 终端状态提示（需要 `cli` 特性）

#[cfg(feature = "cli")]
pub mod toast;

#[cfg(feature = "cli")]
pub use toast::StatusToast;
