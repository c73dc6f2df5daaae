//! 翻译模块统一错误处理
//!
//! 提供结构化错误类型和错误处理机制

use std::fmt;

use thiserror::Error;

use crate::env::EnvError;

/// 翻译错误类型
#[derive(Error, Debug, Clone)]
pub enum TranslationError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 补全接口调用失败或返回非成功状态
    #[error("传输错误: {0}")]
    Transport(String),

    /// 批量翻译返回的段数与提交的段数不一致
    #[error("批量结果数量不匹配: expected {expected}, received {received}")]
    BatchMismatch { expected: usize, received: usize },

    /// 译文未通过校验
    #[error("译文校验失败: {0}")]
    ValidationFailure(String),

    /// 页面翻译已在进行中
    #[error("页面翻译正在进行中")]
    RunInProgress,

    /// 输入验证错误
    #[error("输入无效: {0}")]
    InvalidInput(String),

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(String),

    /// 解析错误
    #[error("解析错误: {0}")]
    ParseError(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerializationError(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl TranslationError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationError::Transport(_) => true,
            TranslationError::ValidationFailure(_) => true,
            TranslationError::BatchMismatch { .. } => false, // 直接降级为逐条翻译
            TranslationError::RunInProgress => false,
            TranslationError::ConfigError(_) => false,
            TranslationError::InvalidInput(_) => false,
            TranslationError::IoError(_) => false,
            TranslationError::ParseError(_) => false,
            TranslationError::SerializationError(_) => false,
            TranslationError::InternalError(_) => false,
        }
    }

    /// 是否应将整个批次降级为逐条翻译
    pub fn should_degrade_batch(&self) -> bool {
        matches!(
            self,
            TranslationError::Transport(_) | TranslationError::BatchMismatch { .. }
        )
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslationError::ConfigError(_) => ErrorSeverity::Critical,
            TranslationError::Transport(_) => ErrorSeverity::Warning,
            TranslationError::BatchMismatch { .. } => ErrorSeverity::Warning,
            TranslationError::ValidationFailure(_) => ErrorSeverity::Warning,
            TranslationError::RunInProgress => ErrorSeverity::Info,
            TranslationError::InvalidInput(_) => ErrorSeverity::Info,
            TranslationError::IoError(_) => ErrorSeverity::Error,
            TranslationError::ParseError(_) => ErrorSeverity::Error,
            TranslationError::SerializationError(_) => ErrorSeverity::Error,
            TranslationError::InternalError(_) => ErrorSeverity::Critical,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslationError::ConfigError(_) => ErrorCategory::Configuration,
            TranslationError::Transport(_) => ErrorCategory::Network,
            TranslationError::BatchMismatch { .. } => ErrorCategory::Service,
            TranslationError::ValidationFailure(_) => ErrorCategory::Validation,
            TranslationError::RunInProgress => ErrorCategory::Concurrency,
            TranslationError::InvalidInput(_) => ErrorCategory::Input,
            TranslationError::IoError(_) => ErrorCategory::Io,
            TranslationError::ParseError(_) => ErrorCategory::Parsing,
            TranslationError::SerializationError(_) => ErrorCategory::Serialization,
            TranslationError::InternalError(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        match &mut self {
            TranslationError::ConfigError(ref mut msg)
            | TranslationError::Transport(ref mut msg)
            | TranslationError::ValidationFailure(ref mut msg)
            | TranslationError::InvalidInput(ref mut msg)
            | TranslationError::IoError(ref mut msg)
            | TranslationError::ParseError(ref mut msg)
            | TranslationError::SerializationError(ref mut msg)
            | TranslationError::InternalError(ref mut msg) => {
                *msg = format!("{} (上下文: {})", msg, context);
            }
            TranslationError::BatchMismatch { .. } | TranslationError::RunInProgress => {}
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Service,
    Validation,
    Concurrency,
    Input,
    Io,
    Parsing,
    Serialization,
    Internal,
}

impl From<std::io::Error> for TranslationError {
    fn from(error: std::io::Error) -> Self {
        TranslationError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for TranslationError {
    fn from(error: serde_json::Error) -> Self {
        TranslationError::SerializationError(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslationError {
    fn from(error: toml::de::Error) -> Self {
        TranslationError::ParseError(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslationError {
    fn from(error: reqwest::Error) -> Self {
        TranslationError::Transport(error.to_string())
    }
}

impl From<EnvError> for TranslationError {
    fn from(error: EnvError) -> Self {
        TranslationError::ConfigError(error.to_string())
    }
}

/// 错误结果类型别名
pub type TranslationResult<T> = Result<T, TranslationError>;

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录错误
    pub fn log_error(error: &TranslationError) {
        let category = error.category();
        match error.severity() {
            ErrorSeverity::Info => tracing::info!(?category, "翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!(?category, "翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!(?category, "翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!(?category, "翻译严重错误: {}", error),
        }
    }

    /// 创建传输错误
    pub fn transport_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::Transport(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::ConfigError(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslationError {
        TranslationError::InvalidInput(msg.to_string())
    }
}
